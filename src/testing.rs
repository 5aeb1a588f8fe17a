//! Shared fixtures for unit tests.

use uuid::Uuid;

use crate::context::RequestContext;
use crate::db::Database;
use crate::fields::TaskStatus;
use crate::service::SchedulingService;
use crate::task::{NewTask, Task, TaskId, TaskView};

/// A detached task view, not stored anywhere.
pub(crate) fn view(name: &str, sort_order: i64, parent: Option<TaskId>) -> TaskView {
    TaskView {
        task: Task {
            id: Uuid::new_v4(),
            project_id: "p".into(),
            parent_task_id: parent,
            sort_order,
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
            created_at_utc: 0,
            updated_at_utc: 0,
        },
        predecessors: Vec::new(),
        deadline_date: None,
        is_overdue: false,
    }
}

pub(crate) fn ctx() -> RequestContext {
    RequestContext::authenticated("tester")
}

pub(crate) fn service() -> SchedulingService<Database> {
    SchedulingService::new(Database::default())
}

/// Create a task through the service with default fields.
pub(crate) fn add(
    svc: &mut SchedulingService<Database>,
    project_id: &str,
    name: &str,
    parent: Option<TaskId>,
) -> TaskView {
    svc.create_task(
        &ctx(),
        project_id,
        NewTask {
            parent_task_id: parent,
            ..NewTask::named(name)
        },
    )
    .unwrap()
}
