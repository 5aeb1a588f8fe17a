//! Task, dependency and deadline data structures.
//!
//! `Task` is the persisted row. `TaskView` is what the store hands back on
//! reads: the row plus the joined predecessor edges, the deadline and the
//! store-computed overdue flag. `NewTask` and `TaskPatch` are the inputs to
//! create and update.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::*;

pub type TaskId = Uuid;
pub type DependencyId = Uuid;

/// A scheduled unit of work inside one project's WBS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: String,
    pub parent_task_id: Option<TaskId>,
    pub sort_order: i64,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub percent_complete: u8,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub is_milestone: bool,
    pub constraint_type: Option<ConstraintType>,
    pub constraint_date: Option<NaiveDate>,
    pub wbs_code: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
}

impl Task {
    /// Force the milestone shape: zero duration, finish pinned to start.
    pub fn apply_milestone_shape(&mut self) {
        if self.is_milestone {
            self.duration_days = Some(0);
            if let Some(start) = self.start_date {
                self.finish_date = Some(start);
            }
        }
    }

    /// Whole days from start to finish, when both are set and in order.
    pub fn span_days(&self) -> Option<u32> {
        let (start, finish) = (self.start_date?, self.finish_date?);
        u32::try_from((finish - start).num_days()).ok()
    }
}

/// A task as read back from the store, with joined schedule data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub predecessors: Vec<Dependency>,
    #[serde(default)]
    pub deadline_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_overdue: bool,
}

impl TaskView {
    pub fn id(&self) -> TaskId {
        self.task.id
    }
}

/// Input for creating a task. Unset fields take the engine defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub parent_task_id: Option<TaskId>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub finish_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub percent_complete: Option<u8>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub is_milestone: Option<bool>,
    #[serde(default)]
    pub constraint_type: Option<ConstraintType>,
    #[serde(default)]
    pub constraint_date: Option<NaiveDate>,
    #[serde(default)]
    pub wbs_code: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

impl NewTask {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial update of a task.
///
/// Each field is `None` when the patch does not mention it. Nullable columns
/// use a second `Option` so that `Some(None)` clears the column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub parent_task_id: Option<Option<TaskId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub finish_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub duration_days: Option<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_milestone: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub constraint_type: Option<Option<ConstraintType>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub constraint_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub wbs_code: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Patch that only moves the task under `parent` (or to the root).
    pub fn reparent(parent: Option<TaskId>) -> Self {
        Self {
            parent_task_id: Some(parent),
            ..Default::default()
        }
    }

    /// Write every mentioned field onto `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(parent) = self.parent_task_id {
            task.parent_task_id = parent;
        }
        if let Some(order) = self.sort_order {
            task.sort_order = order;
        }
        if let Some(start) = self.start_date {
            task.start_date = start;
        }
        if let Some(finish) = self.finish_date {
            task.finish_date = finish;
        }
        if let Some(duration) = self.duration_days {
            task.duration_days = duration;
        }
        if let Some(pct) = self.percent_complete {
            task.percent_complete = pct;
        }
        if let Some(status) = &self.status {
            task.status = status.clone();
        }
        if let Some(milestone) = self.is_milestone {
            task.is_milestone = milestone;
        }
        if let Some(kind) = self.constraint_type {
            task.constraint_type = kind;
        }
        if let Some(date) = self.constraint_date {
            task.constraint_date = date;
        }
        if let Some(code) = &self.wbs_code {
            task.wbs_code = code.clone();
        }
    }
}

/// Patch applied to several tasks at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkUpdate {
    pub ids: Vec<TaskId>,
    pub updates: TaskPatch,
}

/// A precedence edge: `predecessor_task_id` must be scheduled before `task_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: DependencyId,
    pub task_id: TaskId,
    pub predecessor_task_id: TaskId,
    #[serde(default)]
    pub dependency_type: DependencyType,
    #[serde(default)]
    pub lag_days: i32,
    pub created_at_utc: i64,
}

/// Input for creating a dependency edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDependency {
    pub task_id: TaskId,
    pub predecessor_task_id: TaskId,
    #[serde(default)]
    pub dependency_type: Option<DependencyType>,
    #[serde(default)]
    pub lag_days: Option<i32>,
}

/// The single deadline a task may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: Uuid,
    pub task_id: TaskId,
    pub deadline_date: NaiveDate,
    pub updated_at_utc: i64,
}

/// Input for setting a deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeadline {
    pub task_id: TaskId,
    pub deadline_date: NaiveDate,
}

/// Serde helper telling an absent field apart from an explicit `null`.
///
/// Paired with `#[serde(default)]`: absent stays `None`, `null` becomes
/// `Some(None)`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: "p1".into(),
            parent_task_id: None,
            sort_order: 0,
            name: "Pour footings".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 3),
            finish_date: NaiveDate::from_ymd_opt(2025, 3, 7),
            duration_days: Some(5),
            percent_complete: 0,
            status: TaskStatus::NotStarted,
            is_milestone: false,
            constraint_type: None,
            constraint_date: None,
            wbs_code: Some("1.2".into()),
            created_by: None,
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let patch: TaskPatch = serde_json::from_str(r#"{"name": "Frame walls"}"#).unwrap();
        assert_eq!(patch.parent_task_id, None);
        assert_eq!(patch.wbs_code, None);

        let patch: TaskPatch =
            serde_json::from_str(r#"{"parent_task_id": null, "wbs_code": null}"#).unwrap();
        assert_eq!(patch.parent_task_id, Some(None));
        assert_eq!(patch.wbs_code, Some(None));
        assert!(patch.name.is_none());
    }

    #[test]
    fn test_patch_apply_clears_and_sets() {
        let mut task = sample_task();
        let patch = TaskPatch {
            wbs_code: Some(None),
            percent_complete: Some(40),
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };
        patch.apply_to(&mut task);
        assert_eq!(task.wbs_code, None);
        assert_eq!(task.percent_complete, 40);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.name, "Pour footings");
    }

    #[test]
    fn test_milestone_shape() {
        let mut task = sample_task();
        task.is_milestone = true;
        task.apply_milestone_shape();
        assert_eq!(task.duration_days, Some(0));
        assert_eq!(task.finish_date, task.start_date);
    }

    #[test]
    fn test_empty_patch() {
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch::reparent(None).is_empty());
    }
}
