//! File-backed schedule database and date utilities.
//!
//! This module provides the `Database` struct, a JSON document holding the
//! task, dependency and deadline tables, and implements `ScheduleStore` on it.
//! It also carries the date parsing and formatting helpers used by the CLI.

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::fields::*;
use crate::store::{QueryResult, ScheduleStore, StoreError, StoreResult, TaskQuery};
use crate::task::{Deadline, Dependency, DependencyId, Task, TaskId, TaskPatch, TaskView};

/// In-memory schedule tables, persisted as a single JSON file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub deadlines: Vec<Deadline>,
    /// Pins "today" for overdue computation; the local date when unset.
    #[serde(skip)]
    today: Option<NaiveDate>,
}

impl Database {
    /// Load database from JSON file, returning an empty database if the file doesn't exist.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no schedule database yet, starting empty");
            return Ok(Database::default());
        }
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        let db: Database = serde_json::from_str(&buf)?;
        debug!(
            path = %path.display(),
            tasks = db.tasks.len(),
            dependencies = db.dependencies.len(),
            deadlines = db.deadlines.len(),
            "loaded schedule database"
        );
        Ok(db)
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(self)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Use a fixed date as "today" when deriving overdue flags.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Get a task by ID, regardless of project.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn position(&self, project_id: &str, id: TaskId) -> Option<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id && t.project_id == project_id)
    }

    /// Join a task row with its predecessor edges, deadline and overdue flag.
    ///
    /// A task is overdue when it is not complete and its deadline, or its
    /// finish date when no deadline is set, lies before today.
    fn view(&self, task: &Task) -> TaskView {
        let predecessors: Vec<Dependency> = self
            .dependencies
            .iter()
            .filter(|d| d.task_id == task.id)
            .cloned()
            .collect();
        let deadline_date = self
            .deadlines
            .iter()
            .find(|d| d.task_id == task.id)
            .map(|d| d.deadline_date);
        let due = deadline_date.or(task.finish_date);
        let is_overdue =
            task.status != TaskStatus::Complete && due.is_some_and(|d| d < self.today());
        TaskView {
            task: task.clone(),
            predecessors,
            deadline_date,
            is_overdue,
        }
    }

    fn require_task(&self, id: TaskId, role: &str) -> StoreResult<()> {
        if self.get(id).is_none() {
            return Err(StoreError::Constraint(format!(
                "{role} task {id} does not exist"
            )));
        }
        Ok(())
    }
}

/// Order two tasks by a listing column. Missing values sort last.
fn compare_by(field: SortField, a: &Task, b: &Task) -> Ordering {
    fn nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
        (a.is_none(), a).cmp(&(b.is_none(), b))
    }
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::StartDate => nulls_last(a.start_date, b.start_date),
        SortField::FinishDate => nulls_last(a.finish_date, b.finish_date),
        SortField::PercentComplete => a.percent_complete.cmp(&b.percent_complete),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::CreatedAt => a.created_at_utc.cmp(&b.created_at_utc),
        SortField::SortOrder => a.sort_order.cmp(&b.sort_order),
    }
}

impl ScheduleStore for Database {
    fn query_tasks(&self, query: &TaskQuery) -> StoreResult<QueryResult<TaskView>> {
        let mut matched: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| query.filters.iter().all(|f| f.matches(t)))
            .collect();

        if let Some((field, direction)) = query.order {
            matched.sort_by(|a, b| {
                let ord = compare_by(field, a, b);
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let count = matched.len();
        let (offset, limit) = query.range.unwrap_or((0, usize::MAX));
        let rows = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|t| self.view(t))
            .collect();
        Ok(QueryResult { rows, count })
    }

    fn insert_task(&mut self, task: Task) -> StoreResult<TaskView> {
        if self.get(task.id).is_some() {
            return Err(StoreError::Constraint(format!(
                "task {} already exists",
                task.id
            )));
        }
        if let Some(parent) = task.parent_task_id {
            self.require_task(parent, "parent")?;
        }
        let view = self.view(&task);
        self.tasks.push(task);
        Ok(view)
    }

    fn update_task(
        &mut self,
        project_id: &str,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> StoreResult<TaskView> {
        let idx = self.position(project_id, task_id).ok_or(StoreError::NoRows)?;
        if let Some(Some(parent)) = patch.parent_task_id {
            self.require_task(parent, "parent")?;
        }
        let task = &mut self.tasks[idx];
        patch.apply_to(task);
        task.updated_at_utc = Utc::now().timestamp();
        let task = self.tasks[idx].clone();
        Ok(self.view(&task))
    }

    fn delete_task(&mut self, project_id: &str, task_id: TaskId) -> StoreResult<bool> {
        let Some(idx) = self.position(project_id, task_id) else {
            return Ok(false);
        };
        self.tasks.remove(idx);
        self.dependencies
            .retain(|d| d.task_id != task_id && d.predecessor_task_id != task_id);
        self.deadlines.retain(|d| d.task_id != task_id);
        Ok(true)
    }

    fn project_dependencies(&self, project_id: &str) -> StoreResult<Vec<Dependency>> {
        Ok(self
            .dependencies
            .iter()
            .filter(|d| {
                self.get(d.predecessor_task_id)
                    .is_some_and(|p| p.project_id == project_id)
            })
            .cloned()
            .collect())
    }

    fn insert_dependency(&mut self, dependency: Dependency) -> StoreResult<Dependency> {
        self.require_task(dependency.task_id, "successor")?;
        self.require_task(dependency.predecessor_task_id, "predecessor")?;
        let duplicate = self.dependencies.iter().any(|d| {
            d.task_id == dependency.task_id
                && d.predecessor_task_id == dependency.predecessor_task_id
        });
        if duplicate {
            return Err(StoreError::Constraint(format!(
                "dependency {} -> {} already exists",
                dependency.predecessor_task_id, dependency.task_id
            )));
        }
        self.dependencies.push(dependency.clone());
        Ok(dependency)
    }

    fn delete_dependency(&mut self, dependency_id: DependencyId) -> StoreResult<bool> {
        let before = self.dependencies.len();
        self.dependencies.retain(|d| d.id != dependency_id);
        Ok(self.dependencies.len() != before)
    }

    fn upsert_deadline(&mut self, task_id: TaskId, date: NaiveDate) -> StoreResult<Deadline> {
        let now = Utc::now().timestamp();
        if let Some(existing) = self.deadlines.iter_mut().find(|d| d.task_id == task_id) {
            existing.deadline_date = date;
            existing.updated_at_utc = now;
            return Ok(existing.clone());
        }
        self.require_task(task_id, "deadline")?;
        let deadline = Deadline {
            id: Uuid::new_v4(),
            task_id,
            deadline_date: date,
            updated_at_utc: now,
        };
        self.deadlines.push(deadline.clone());
        Ok(deadline)
    }

    fn delete_deadline(&mut self, task_id: TaskId) -> StoreResult<bool> {
        let before = self.deadlines.len();
        self.deadlines.retain(|d| d.task_id != task_id);
        Ok(self.deadlines.len() != before)
    }
}

/// Parse human-readable date input with smart natural language support.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "next monday", "friday", etc.
/// - "end of week", "end of month"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD" format
pub fn parse_date_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = (today.year(), today.month());
            let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
            let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let split = rest.char_indices().last().map_or(0, |(i, _)| i);
        let (num, unit) = rest.split_at(split);
        if let Ok(n) = num.trim().parse::<i64>() {
            let delta = match unit {
                "d" => Some(Duration::try_days(n)),
                "w" => Some(Duration::try_weeks(n)),
                // Approximate: 30 days per month
                "m" => Some(n.checked_mul(30).and_then(Duration::try_days)),
                _ => None,
            };
            if let Some(delta) = delta {
                return delta.and_then(|d| today.checked_add_signed(d));
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current_day = today.weekday().num_days_from_monday() as i64;
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days_to_add));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(6);
    (start, end)
}

/// Format a date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaskFilter;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(project: &str, name: &str, order: i64, parent: Option<TaskId>) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: project.into(),
            parent_task_id: parent,
            sort_order: order,
            name: name.into(),
            start_date: None,
            finish_date: None,
            duration_days: None,
            percent_complete: 0,
            status: TaskStatus::NotStarted,
            is_milestone: false,
            constraint_type: None,
            constraint_date: None,
            wbs_code: None,
            created_by: None,
            created_at_utc: order,
            updated_at_utc: order,
        }
    }

    fn edge(task: TaskId, pred: TaskId) -> Dependency {
        Dependency {
            id: Uuid::new_v4(),
            task_id: task,
            predecessor_task_id: pred,
            dependency_type: DependencyType::FinishToStart,
            lag_days: 0,
            created_at_utc: 0,
        }
    }

    #[test]
    fn test_query_filters_sorts_and_pages() {
        let mut db = Database::default();
        for (i, name) in ["Excavate", "Formwork", "Rebar", "Pour slab"].iter().enumerate() {
            db.insert_task(row("p1", name, i as i64, None)).unwrap();
        }
        db.insert_task(row("p2", "Other project", 0, None)).unwrap();

        let q = TaskQuery::new()
            .filter(TaskFilter::ProjectId("p1".into()))
            .order_by(SortField::Name, SortDirection::Asc)
            .range(1, 2);
        let result = db.query_tasks(&q).unwrap();
        assert_eq!(result.count, 4);
        let names: Vec<_> = result.rows.iter().map(|t| t.task.name.as_str()).collect();
        assert_eq!(names, vec!["Formwork", "Pour slab"]);

        let q = TaskQuery::new()
            .filter(TaskFilter::ProjectId("p1".into()))
            .filter(TaskFilter::NameContains("SLAB".into()));
        assert_eq!(db.query_tasks(&q).unwrap().count, 1);

        let picked: Vec<TaskId> = db.tasks.iter().take(2).map(|t| t.id).collect();
        let q = TaskQuery::new().filter(TaskFilter::IdIn(picked.clone()));
        let ids: Vec<_> = db.query_tasks(&q).unwrap().rows.iter().map(|t| t.id()).collect();
        assert_eq!(ids, picked);
    }

    #[test]
    fn test_missing_dates_sort_last_ascending() {
        let mut db = Database::default();
        let mut a = row("p", "a", 0, None);
        a.start_date = Some(date(2025, 5, 1));
        let b = row("p", "b", 1, None);
        let mut c = row("p", "c", 2, None);
        c.start_date = Some(date(2025, 4, 1));
        for t in [a, b, c] {
            db.insert_task(t).unwrap();
        }
        let asc = db
            .query_tasks(&TaskQuery::new().order_by(SortField::StartDate, SortDirection::Asc))
            .unwrap();
        let names: Vec<_> = asc.rows.iter().map(|t| t.task.name.clone()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        let desc = db
            .query_tasks(&TaskQuery::new().order_by(SortField::StartDate, SortDirection::Desc))
            .unwrap();
        assert_eq!(desc.rows[0].task.name, "b");
    }

    #[test]
    fn test_root_filter_matches_null_parent_only() {
        let mut db = Database::default();
        let parent = row("p", "parent", 0, None);
        let pid = parent.id;
        db.insert_task(parent).unwrap();
        db.insert_task(row("p", "child", 0, Some(pid))).unwrap();

        let roots = db
            .query_tasks(&TaskQuery::new().filter(TaskFilter::Parent(None)))
            .unwrap();
        assert_eq!(roots.count, 1);
        let children = db
            .query_tasks(&TaskQuery::new().filter(TaskFilter::Parent(Some(pid))))
            .unwrap();
        assert_eq!(children.rows[0].task.name, "child");
    }

    #[test]
    fn test_insert_rejects_unknown_parent() {
        let mut db = Database::default();
        let err = db.insert_task(row("p", "orphan", 0, Some(Uuid::new_v4())));
        assert!(matches!(err, Err(StoreError::Constraint(_))));
    }

    #[test]
    fn test_update_missing_row_reports_no_rows() {
        let mut db = Database::default();
        let t = row("p", "a", 0, None);
        let id = t.id;
        db.insert_task(t).unwrap();
        let patch = TaskPatch {
            name: Some("renamed".into()),
            ..Default::default()
        };
        assert!(matches!(
            db.update_task("other", id, &patch),
            Err(StoreError::NoRows)
        ));
        assert_eq!(db.update_task("p", id, &patch).unwrap().task.name, "renamed");
    }

    #[test]
    fn test_delete_cascades_edges_and_deadline() {
        let mut db = Database::default();
        let a = row("p", "a", 0, None);
        let b = row("p", "b", 1, None);
        let (aid, bid) = (a.id, b.id);
        db.insert_task(a).unwrap();
        db.insert_task(b).unwrap();
        db.insert_dependency(edge(bid, aid)).unwrap();
        db.upsert_deadline(aid, date(2025, 6, 1)).unwrap();

        assert!(db.delete_task("p", aid).unwrap());
        assert!(db.dependencies.is_empty());
        assert!(db.deadlines.is_empty());
        assert!(!db.delete_task("p", aid).unwrap());
    }

    #[test]
    fn test_deadline_upsert_replaces() {
        let mut db = Database::default();
        let t = row("p", "a", 0, None);
        let id = t.id;
        db.insert_task(t).unwrap();
        let first = db.upsert_deadline(id, date(2025, 6, 1)).unwrap();
        let second = db.upsert_deadline(id, date(2025, 7, 1)).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(db.deadlines.len(), 1);
        assert_eq!(db.deadlines[0].deadline_date, date(2025, 7, 1));
    }

    #[test]
    fn test_view_joins_predecessors_and_overdue() {
        let mut db = Database::default().with_today(date(2025, 6, 15));
        let mut a = row("p", "a", 0, None);
        a.finish_date = Some(date(2025, 6, 1));
        let mut b = row("p", "b", 1, None);
        b.finish_date = Some(date(2025, 6, 1));
        b.status = TaskStatus::Complete;
        let c = row("p", "c", 2, None);
        let (aid, bid, cid) = (a.id, b.id, c.id);
        for t in [a, b, c] {
            db.insert_task(t).unwrap();
        }
        db.insert_dependency(edge(cid, aid)).unwrap();
        db.upsert_deadline(cid, date(2025, 6, 30)).unwrap();

        let rows = db
            .query_tasks(&TaskQuery::new().order_by(SortField::SortOrder, SortDirection::Asc))
            .unwrap()
            .rows;
        assert!(rows[0].is_overdue);
        assert!(!rows[1].is_overdue, "complete tasks are never overdue");
        assert_eq!(rows[1].id(), bid);
        assert!(!rows[2].is_overdue);
        assert_eq!(rows[2].deadline_date, Some(date(2025, 6, 30)));
        assert_eq!(rows[2].predecessors.len(), 1);
        assert_eq!(rows[2].predecessors[0].predecessor_task_id, aid);
    }

    #[test]
    fn test_project_dependencies_checks_predecessor_project() {
        let mut db = Database::default();
        let a = row("p1", "a", 0, None);
        let b = row("p2", "b", 0, None);
        let (aid, bid) = (a.id, b.id);
        db.insert_task(a).unwrap();
        db.insert_task(b).unwrap();
        db.insert_dependency(edge(bid, aid)).unwrap();

        assert_eq!(db.project_dependencies("p1").unwrap().len(), 1);
        assert!(db.project_dependencies("p2").unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        let mut db = Database::default();
        db.insert_task(row("p", "a", 0, None)).unwrap();
        db.save(&path).unwrap();

        let loaded = Database::load(&path).unwrap();
        assert_eq!(loaded.tasks, db.tasks);
        assert!(Database::load(&dir.path().join("missing.json")).unwrap().tasks.is_empty());
    }

    #[test]
    fn test_parse_date_input() {
        let today = date(2025, 1, 15); // Wednesday
        assert_eq!(parse_date_input("today", today), Some(today));
        assert_eq!(parse_date_input("in 3d", today), Some(date(2025, 1, 18)));
        assert_eq!(parse_date_input("in 2w", today), Some(date(2025, 1, 29)));
        assert_eq!(parse_date_input("friday", today), Some(date(2025, 1, 17)));
        assert_eq!(parse_date_input("next wednesday", today), Some(date(2025, 1, 22)));
        assert_eq!(parse_date_input("eom", today), Some(date(2025, 1, 31)));
        assert_eq!(parse_date_input("2025-02-01", today), Some(date(2025, 2, 1)));
        assert_eq!(parse_date_input("someday", today), None);
    }

    #[test]
    fn test_parse_date_input_out_of_range_is_none() {
        let today = date(2025, 1, 15);
        assert_eq!(parse_date_input("in 9999999999999d", today), None);
        assert_eq!(parse_date_input("in 9999999999999w", today), None);
        assert_eq!(parse_date_input("in 9223372036854775807m", today), None);
        assert_eq!(parse_date_input("in -3d", today), Some(date(2025, 1, 12)));
    }

    #[test]
    fn test_format_due_relative() {
        let today = date(2025, 1, 15);
        assert_eq!(format_due_relative(None, today), "-");
        assert_eq!(format_due_relative(Some(date(2025, 1, 16)), today), "tomorrow");
        assert_eq!(format_due_relative(Some(date(2025, 1, 13)), today), "2d late");
    }
}
