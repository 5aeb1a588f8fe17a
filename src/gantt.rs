//! Gantt chart projection.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScheduleResult;
use crate::hierarchy::{build_hierarchy, level_map};
use crate::service::SchedulingService;
use crate::store::ScheduleStore;
use crate::task::{TaskId, TaskView};

/// A predecessor reference on a Gantt bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttDependency {
    pub predecessor_id: TaskId,
    #[serde(rename = "type")]
    pub kind: String,
    pub lag_days: i32,
}

/// One rendering-ready row of the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttItem {
    pub id: TaskId,
    pub name: String,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub duration_days: u32,
    pub percent_complete: u8,
    pub is_milestone: bool,
    pub parent_task_id: Option<TaskId>,
    pub level: usize,
    pub dependencies: Vec<GanttDependency>,
    pub deadline: Option<NaiveDate>,
    pub is_overdue: bool,
}

/// Project tasks onto Gantt items, one per task, in input order.
///
/// Missing dates fall back to `today`. `level` is annotation only; the
/// output is never re-sorted into tree order.
pub fn project_gantt(tasks: &[TaskView], today: NaiveDate) -> Vec<GanttItem> {
    let levels = level_map(&build_hierarchy(tasks));
    tasks
        .iter()
        .map(|t| GanttItem {
            id: t.id(),
            name: t.task.name.clone(),
            start_date: t.task.start_date.unwrap_or(today),
            finish_date: t.task.finish_date.unwrap_or(today),
            duration_days: t.task.duration_days.unwrap_or(0),
            percent_complete: t.task.percent_complete,
            is_milestone: t.task.is_milestone,
            parent_task_id: t.task.parent_task_id,
            level: levels.get(&t.id()).copied().unwrap_or(0),
            dependencies: t
                .predecessors
                .iter()
                .map(|p| GanttDependency {
                    predecessor_id: p.predecessor_task_id,
                    kind: p.dependency_type.as_str().to_string(),
                    lag_days: p.lag_days,
                })
                .collect(),
            deadline: t.deadline_date,
            is_overdue: t.is_overdue,
        })
        .collect()
}

impl<S: ScheduleStore> SchedulingService<S> {
    /// Gantt items for every task of the project, in sort order.
    pub fn gantt_data(&self, project_id: &str) -> ScheduleResult<Vec<GanttItem>> {
        let tasks = self.tasks(project_id)?;
        let items = project_gantt(&tasks, Local::now().date_naive());
        debug!(project_id, items = items.len(), "projected gantt data");
        Ok(items)
    }
}
