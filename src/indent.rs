//! Indent and outdent: move a task one WBS level down or up.
//!
//! Both go through the regular update path, so hierarchy rules are checked
//! again and the moved task is appended to its new sibling group. The old
//! group is not renumbered.

use tracing::info;

use crate::context::RequestContext;
use crate::error::{ScheduleError, ScheduleResult};
use crate::fields::{SortDirection, SortField};
use crate::service::SchedulingService;
use crate::store::{ScheduleStore, TaskFilter, TaskQuery};
use crate::task::{TaskId, TaskPatch, TaskView};

impl<S: ScheduleStore> SchedulingService<S> {
    /// Make a task the child of its nearest preceding sibling.
    pub fn indent(
        &mut self,
        ctx: &RequestContext,
        project_id: &str,
        task_id: TaskId,
    ) -> ScheduleResult<TaskView> {
        ctx.require_caller()?;
        let task = self.get_task(project_id, task_id)?;

        let query = TaskQuery::new()
            .filter(TaskFilter::ProjectId(project_id.to_string()))
            .filter(TaskFilter::Parent(task.task.parent_task_id))
            .filter(TaskFilter::SortOrderLt(task.task.sort_order))
            .order_by(SortField::SortOrder, SortDirection::Desc)
            .range(0, 1);
        let sibling = self
            .store
            .query_tasks(&query)
            .map_err(|e| ScheduleError::store("fetch siblings", e))?
            .rows
            .into_iter()
            .next()
            .ok_or(ScheduleError::MissingSibling { task_id })?;

        let moved = self.apply_update(project_id, task_id, TaskPatch::reparent(Some(sibling.id())))?;
        info!(project_id, %task_id, new_parent = %sibling.id(), "indented task");
        Ok(moved)
    }

    /// Promote a task to its grandparent (or to the root).
    pub fn outdent(
        &mut self,
        ctx: &RequestContext,
        project_id: &str,
        task_id: TaskId,
    ) -> ScheduleResult<TaskView> {
        ctx.require_caller()?;
        let task = self.get_task(project_id, task_id)?;
        let Some(parent_id) = task.task.parent_task_id else {
            return Err(ScheduleError::RootLevelTask { task_id });
        };

        let parent = match self.get_task(project_id, parent_id) {
            Ok(parent) => parent,
            Err(e) if e.is_not_found() => {
                return Err(ScheduleError::DataIntegrity {
                    reason: format!("parent task {parent_id} of task {task_id} not found"),
                })
            }
            Err(e) => return Err(e),
        };

        let grandparent = parent.task.parent_task_id;
        let moved = self.apply_update(project_id, task_id, TaskPatch::reparent(grandparent))?;
        info!(project_id, %task_id, ?grandparent, "outdented task");
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add, ctx, service};

    #[test]
    fn test_indent_then_outdent_reads_current_chain() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let b = add(&mut svc, "p", "B", None);
        let c = add(&mut svc, "p", "C", Some(b.id()));
        assert_eq!((a.task.sort_order, b.task.sort_order, c.task.sort_order), (0, 1, 0));

        let b2 = svc.indent(&ctx(), "p", b.id()).unwrap();
        assert_eq!(b2.task.parent_task_id, Some(a.id()));

        let c2 = svc.outdent(&ctx(), "p", c.id()).unwrap();
        assert_eq!(c2.task.parent_task_id, Some(a.id()));
    }

    #[test]
    fn test_indent_picks_nearest_preceding_sibling() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let b = add(&mut svc, "p", "B", None);
        let c = add(&mut svc, "p", "C", None);
        let moved = svc.indent(&ctx(), "p", c.id()).unwrap();
        assert_eq!(moved.task.parent_task_id, Some(b.id()));
        assert_ne!(moved.task.parent_task_id, Some(a.id()));
    }

    #[test]
    fn test_round_trip_restores_parent() {
        let mut svc = service();
        let root = add(&mut svc, "p", "Root", None);
        add(&mut svc, "p", "First", Some(root.id()));
        let second = add(&mut svc, "p", "Second", Some(root.id()));

        svc.indent(&ctx(), "p", second.id()).unwrap();
        let back = svc.outdent(&ctx(), "p", second.id()).unwrap();
        assert_eq!(back.task.parent_task_id, Some(root.id()));
        assert_eq!(back.task.sort_order, second.task.sort_order);
    }

    #[test]
    fn test_indent_keeps_sibling_orders_unique() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        add(&mut svc, "p", "A1", Some(a.id()));
        let a2 = add(&mut svc, "p", "A2", Some(a.id()));
        let b = add(&mut svc, "p", "B", None);

        let moved = svc.indent(&ctx(), "p", b.id()).unwrap();
        assert_eq!(moved.task.parent_task_id, Some(a.id()));
        assert_eq!(moved.task.sort_order, a2.task.sort_order + 1);

        let orders: Vec<i64> = svc
            .tasks("p")
            .unwrap()
            .iter()
            .filter(|t| t.task.parent_task_id == Some(a.id()))
            .map(|t| t.task.sort_order)
            .collect();
        assert_eq!(orders, vec![0, 1, 2]);

        // B now follows A2, so a second indent nests it there.
        let nested = svc.indent(&ctx(), "p", b.id()).unwrap();
        assert_eq!(nested.task.parent_task_id, Some(a2.id()));
    }

    #[test]
    fn test_outdent_appends_to_grandparent_group() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let child = add(&mut svc, "p", "Child", Some(a.id()));
        add(&mut svc, "p", "B", None);
        let moved = svc.outdent(&ctx(), "p", child.id()).unwrap();
        assert_eq!(moved.task.sort_order, 2);
    }

    #[test]
    fn test_indent_first_sibling_fails() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        add(&mut svc, "p", "B", None);
        let err = svc.indent(&ctx(), "p", a.id()).unwrap_err();
        assert_eq!(err, ScheduleError::MissingSibling { task_id: a.id() });
        assert!(err.is_validation());
    }

    #[test]
    fn test_indent_ignores_other_groups() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        add(&mut svc, "p", "A1", Some(a.id()));
        let b = add(&mut svc, "p", "B", None);
        let b1 = add(&mut svc, "p", "B1", Some(b.id()));
        // B1 has sort order 0 in its own group; A1 lives in another group.
        assert!(matches!(
            svc.indent(&ctx(), "p", b1.id()),
            Err(ScheduleError::MissingSibling { .. })
        ));
    }

    #[test]
    fn test_outdent_root_fails() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let err = svc.outdent(&ctx(), "p", a.id()).unwrap_err();
        assert_eq!(err, ScheduleError::RootLevelTask { task_id: a.id() });
    }

    #[test]
    fn test_outdent_with_missing_parent_is_integrity_error() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let child = add(&mut svc, "p", "Child", Some(a.id()));
        svc.delete_task(&ctx(), "p", a.id()).unwrap();

        let err = svc.outdent(&ctx(), "p", child.id()).unwrap_err();
        assert!(matches!(err, ScheduleError::DataIntegrity { .. }));
    }

    #[test]
    fn test_outdent_to_root() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let child = add(&mut svc, "p", "Child", Some(a.id()));
        let moved = svc.outdent(&ctx(), "p", child.id()).unwrap();
        assert_eq!(moved.task.parent_task_id, None);
    }

    #[test]
    fn test_missing_task_is_not_found() {
        let mut svc = service();
        assert!(svc
            .indent(&ctx(), "p", uuid::Uuid::new_v4())
            .unwrap_err()
            .is_not_found());
    }
}
