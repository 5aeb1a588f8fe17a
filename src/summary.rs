//! Schedule summary statistics.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScheduleResult;
use crate::fields::TaskStatus;
use crate::service::SchedulingService;
use crate::store::ScheduleStore;
use crate::task::TaskView;

/// Counts and overall progress for one project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub not_started_tasks: usize,
    pub milestones_count: usize,
    pub overdue_tasks: usize,
    pub overall_percent_complete: u32,
}

/// Aggregate a task set.
///
/// Tasks with an unrecognised status count toward `total_tasks` only.
/// `overall_percent_complete` is the plain mean of `percent_complete`,
/// rounded half up; it is not weighted by duration or depth.
pub fn summarize(tasks: &[TaskView]) -> ScheduleSummary {
    if tasks.is_empty() {
        return ScheduleSummary::default();
    }

    let mut summary = ScheduleSummary {
        total_tasks: tasks.len(),
        ..Default::default()
    };
    let mut percent_sum: u64 = 0;
    for t in tasks {
        match t.task.status {
            TaskStatus::Complete => summary.completed_tasks += 1,
            TaskStatus::InProgress => summary.in_progress_tasks += 1,
            TaskStatus::NotStarted => summary.not_started_tasks += 1,
            TaskStatus::Other(_) => {}
        }
        if t.task.is_milestone {
            summary.milestones_count += 1;
        }
        if t.is_overdue {
            summary.overdue_tasks += 1;
        }
        percent_sum += u64::from(t.task.percent_complete);
    }
    let total = tasks.len() as u64;
    summary.overall_percent_complete = ((percent_sum * 2 + total) / (total * 2)) as u32;
    summary
}

impl<S: ScheduleStore> SchedulingService<S> {
    pub fn summary(&self, project_id: &str) -> ScheduleResult<ScheduleSummary> {
        let tasks = self.tasks(project_id)?;
        let summary = summarize(&tasks);
        debug!(project_id, total = summary.total_tasks, "computed schedule summary");
        Ok(summary)
    }
}
