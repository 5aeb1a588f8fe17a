//! Task deadlines: at most one per task, replaced on every set.

use tracing::info;

use crate::context::RequestContext;
use crate::error::{ScheduleError, ScheduleResult};
use crate::service::SchedulingService;
use crate::store::ScheduleStore;
use crate::task::{Deadline, NewDeadline, TaskId};

impl<S: ScheduleStore> SchedulingService<S> {
    /// Create or replace the deadline of a task.
    pub fn set_deadline(
        &mut self,
        ctx: &RequestContext,
        new: NewDeadline,
    ) -> ScheduleResult<Deadline> {
        ctx.require_caller()?;
        let deadline = self
            .store
            .upsert_deadline(new.task_id, new.deadline_date)
            .map_err(|e| ScheduleError::store("set deadline", e))?;
        info!(task_id = %deadline.task_id, date = %deadline.deadline_date, "set deadline");
        Ok(deadline)
    }

    /// Remove a task's deadline, reporting whether one existed.
    /// Removing a missing deadline is not an error.
    pub fn remove_deadline(&mut self, ctx: &RequestContext, task_id: TaskId) -> ScheduleResult<bool> {
        ctx.require_caller()?;
        let removed = self
            .store
            .delete_deadline(task_id)
            .map_err(|e| ScheduleError::store("remove deadline", e))?;
        info!(%task_id, removed, "removed deadline");
        Ok(removed)
    }
}
