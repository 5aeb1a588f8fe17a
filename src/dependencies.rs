//! Precedence edges between tasks.
//!
//! The engine owns cycle detection: before an edge `predecessor -> task` is
//! written, the successor graph of the project is searched for a path from
//! `task` back to `predecessor`. A store that enforces the same rule itself
//! reports `StoreError::CircularDependency`, which maps to the same error.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{ScheduleError, ScheduleResult};
use crate::service::SchedulingService;
use crate::store::{ScheduleStore, StoreError, TaskFilter, TaskQuery};
use crate::task::{Dependency, DependencyId, NewDependency, TaskId, TaskView};

const CIRCULAR_MESSAGE: &str = "cannot create dependency: would create a circular dependency chain";

/// Whether adding `predecessor_id -> task_id` to `edges` would close a cycle.
///
/// True when the predecessor is the task itself or one of its direct or
/// transitive successors.
pub fn would_create_cycle(edges: &[Dependency], task_id: TaskId, predecessor_id: TaskId) -> bool {
    let mut successors: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for edge in edges {
        successors
            .entry(edge.predecessor_task_id)
            .or_default()
            .push(edge.task_id);
    }

    let mut visited = HashSet::new();
    let mut stack = vec![task_id];
    while let Some(current) = stack.pop() {
        if current == predecessor_id {
            return true;
        }
        if visited.insert(current) {
            if let Some(next) = successors.get(&current) {
                stack.extend(next.iter().copied());
            }
        }
    }
    false
}

impl<S: ScheduleStore> SchedulingService<S> {
    pub fn create_dependency(
        &mut self,
        ctx: &RequestContext,
        new: NewDependency,
    ) -> ScheduleResult<Dependency> {
        ctx.require_caller()?;

        let predecessor = self.find_task(new.predecessor_task_id)?;
        let successor = self.find_task(new.task_id)?;
        if predecessor.task.project_id != successor.task.project_id {
            return Err(ScheduleError::invalid_hierarchy(
                "dependency endpoints must belong to the same project",
            ));
        }

        let edges = self
            .store
            .project_dependencies(&predecessor.task.project_id)
            .map_err(|e| ScheduleError::store("fetch dependencies", e))?;
        if would_create_cycle(&edges, new.task_id, new.predecessor_task_id) {
            warn!(
                task_id = %new.task_id,
                predecessor_id = %new.predecessor_task_id,
                "rejected circular dependency"
            );
            return Err(ScheduleError::invalid_hierarchy(CIRCULAR_MESSAGE));
        }

        let dependency = Dependency {
            id: Uuid::new_v4(),
            task_id: new.task_id,
            predecessor_task_id: new.predecessor_task_id,
            dependency_type: new.dependency_type.unwrap_or_default(),
            lag_days: new.lag_days.unwrap_or(0),
            created_at_utc: Utc::now().timestamp(),
        };
        match self.store.insert_dependency(dependency) {
            Ok(created) => {
                info!(
                    dependency_id = %created.id,
                    task_id = %created.task_id,
                    predecessor_id = %created.predecessor_task_id,
                    kind = created.dependency_type.as_str(),
                    lag_days = created.lag_days,
                    "created dependency"
                );
                Ok(created)
            }
            Err(StoreError::CircularDependency(_)) => {
                Err(ScheduleError::invalid_hierarchy(CIRCULAR_MESSAGE))
            }
            Err(e) => Err(ScheduleError::store("create dependency", e)),
        }
    }

    /// Dependencies whose predecessor task belongs to the project.
    pub fn list_dependencies(&self, project_id: &str) -> ScheduleResult<Vec<Dependency>> {
        let deps = self
            .store
            .project_dependencies(project_id)
            .map_err(|e| ScheduleError::store("fetch dependencies", e))?;
        debug!(project_id, count = deps.len(), "listed dependencies");
        Ok(deps)
    }

    /// Delete an edge by id. Callers authorise at the task level beforehand.
    pub fn delete_dependency(
        &mut self,
        ctx: &RequestContext,
        dependency_id: DependencyId,
    ) -> ScheduleResult<bool> {
        ctx.require_caller()?;
        let deleted = self
            .store
            .delete_dependency(dependency_id)
            .map_err(|e| ScheduleError::store("delete dependency", e))?;
        info!(%dependency_id, deleted, "deleted dependency");
        Ok(deleted)
    }

    /// Look a task up by id alone; edges carry no project id of their own.
    fn find_task(&self, task_id: TaskId) -> ScheduleResult<TaskView> {
        let query = TaskQuery::new().filter(TaskFilter::Id(task_id)).range(0, 1);
        self.store
            .query_tasks(&query)
            .map_err(|e| ScheduleError::store("fetch task", e))?
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| ScheduleError::not_found(task_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::DependencyType;
    use crate::testing::{add, ctx, service};

    fn link(pred: TaskId, task: TaskId) -> NewDependency {
        NewDependency {
            task_id: task,
            predecessor_task_id: pred,
            dependency_type: None,
            lag_days: None,
        }
    }

    #[test]
    fn test_create_defaults() {
        let mut svc = service();
        let a = add(&mut svc, "p", "Excavate", None);
        let b = add(&mut svc, "p", "Pour", None);
        let dep = svc.create_dependency(&ctx(), link(a.id(), b.id())).unwrap();
        assert_eq!(dep.dependency_type, DependencyType::FinishToStart);
        assert_eq!(dep.lag_days, 0);
        assert_eq!(svc.get_task("p", b.id()).unwrap().predecessors, vec![dep]);
    }

    #[test]
    fn test_create_keeps_type_and_lead() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let b = add(&mut svc, "p", "B", None);
        let dep = svc
            .create_dependency(
                &ctx(),
                NewDependency {
                    dependency_type: Some(DependencyType::StartToStart),
                    lag_days: Some(-3),
                    ..link(a.id(), b.id())
                },
            )
            .unwrap();
        assert_eq!(dep.dependency_type, DependencyType::StartToStart);
        assert_eq!(dep.lag_days, -3);
    }

    #[test]
    fn test_transitive_cycle_rejected_without_new_edge() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let b = add(&mut svc, "p", "B", None);
        let c = add(&mut svc, "p", "C", None);
        svc.create_dependency(&ctx(), link(a.id(), b.id())).unwrap();
        svc.create_dependency(&ctx(), link(b.id(), c.id())).unwrap();

        let err = svc.create_dependency(&ctx(), link(c.id(), a.id())).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidHierarchy { .. }));
        assert!(err.to_string().contains("circular"));
        assert_eq!(svc.list_dependencies("p").unwrap().len(), 2);
    }

    #[test]
    fn test_self_dependency_rejected() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let err = svc.create_dependency(&ctx(), link(a.id(), a.id())).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidHierarchy { .. }));
        assert!(svc.list_dependencies("p").unwrap().is_empty());
    }

    #[test]
    fn test_parallel_paths_are_not_cycles() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let b = add(&mut svc, "p", "B", None);
        let c = add(&mut svc, "p", "C", None);
        svc.create_dependency(&ctx(), link(a.id(), b.id())).unwrap();
        svc.create_dependency(&ctx(), link(b.id(), c.id())).unwrap();
        assert!(svc.create_dependency(&ctx(), link(a.id(), c.id())).is_ok());
    }

    #[test]
    fn test_missing_endpoint_is_not_found() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let err = svc
            .create_dependency(&ctx(), link(Uuid::new_v4(), a.id()))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_cross_project_edge_rejected() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let b = add(&mut svc, "q", "B", None);
        assert!(svc
            .create_dependency(&ctx(), link(a.id(), b.id()))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_requires_caller() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let b = add(&mut svc, "p", "B", None);
        assert!(svc
            .create_dependency(&RequestContext::anonymous(), link(a.id(), b.id()))
            .unwrap_err()
            .is_auth());
    }

    #[test]
    fn test_delete_dependency_and_cascade() {
        let mut svc = service();
        let a = add(&mut svc, "p", "A", None);
        let b = add(&mut svc, "p", "B", None);
        let c = add(&mut svc, "p", "C", None);
        let ab = svc.create_dependency(&ctx(), link(a.id(), b.id())).unwrap();
        svc.create_dependency(&ctx(), link(b.id(), c.id())).unwrap();

        assert!(svc.delete_dependency(&ctx(), ab.id).unwrap());
        assert!(!svc.delete_dependency(&ctx(), ab.id).unwrap());
        svc.delete_task(&ctx(), "p", c.id()).unwrap();
        assert!(svc.list_dependencies("p").unwrap().is_empty());
    }

    #[test]
    fn test_would_create_cycle_graph() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let edge = |pred, task| Dependency {
            id: Uuid::new_v4(),
            task_id: task,
            predecessor_task_id: pred,
            dependency_type: DependencyType::FinishToStart,
            lag_days: 0,
            created_at_utc: 0,
        };
        let edges = vec![edge(a, b), edge(b, c)];
        assert!(would_create_cycle(&edges, a, c));
        assert!(would_create_cycle(&edges, a, a));
        assert!(!would_create_cycle(&edges, c, a));
    }
}
