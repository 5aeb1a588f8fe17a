//! Persistence contract consumed by the scheduling engine.
//!
//! The engine only needs a handful of logical operations from its backing
//! store: filtered, ordered, range-limited reads of the task table, single-row
//! writes, cascading deletes, and an upsert for deadlines. `Database` in
//! `crate::db` is the file-backed implementation used by the CLI and tests.

use chrono::NaiveDate;
use thiserror::Error;

use crate::fields::{SortDirection, SortField, TaskStatus};
use crate::task::{Deadline, Dependency, DependencyId, Task, TaskId, TaskPatch, TaskView};

/// Errors reported by a store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A single-row read or write matched nothing.
    #[error("no rows returned")]
    NoRows,

    /// The store refused a dependency edge that would close a cycle.
    #[error("circular dependency: {0}")]
    CircularDependency(String),

    /// Any other integrity rule the store enforces (missing foreign key, ...).
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One predicate of a task query. All filters in a query are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskFilter {
    ProjectId(String),
    Id(TaskId),
    IdIn(Vec<TaskId>),
    /// `None` matches root tasks (`parent_task_id IS NULL`).
    Parent(Option<TaskId>),
    Status(TaskStatus),
    IsMilestone(bool),
    /// Case-insensitive substring match on the name.
    NameContains(String),
    SortOrderLt(i64),
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::ProjectId(p) => task.project_id == *p,
            TaskFilter::Id(id) => task.id == *id,
            TaskFilter::IdIn(ids) => ids.contains(&task.id),
            TaskFilter::Parent(parent) => task.parent_task_id == *parent,
            TaskFilter::Status(s) => task.status == *s,
            TaskFilter::IsMilestone(m) => task.is_milestone == *m,
            TaskFilter::NameContains(needle) => task
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            TaskFilter::SortOrderLt(order) => task.sort_order < *order,
        }
    }
}

/// A read against the task table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    pub filters: Vec<TaskFilter>,
    pub order: Option<(SortField, SortDirection)>,
    /// `(offset, limit)`.
    pub range: Option<(usize, usize)>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: TaskFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: SortField, direction: SortDirection) -> Self {
        self.order = Some((field, direction));
        self
    }

    pub fn range(mut self, offset: usize, limit: usize) -> Self {
        self.range = Some((offset, limit));
        self
    }
}

/// Rows of one page plus the number of rows matching before paging.
#[derive(Debug, Clone, Default)]
pub struct QueryResult<T> {
    pub rows: Vec<T>,
    pub count: usize,
}

/// Logical operations the engine requires of its backing store.
pub trait ScheduleStore {
    /// Filtered, ordered, range-limited read with joined schedule data.
    fn query_tasks(&self, query: &TaskQuery) -> StoreResult<QueryResult<TaskView>>;

    fn insert_task(&mut self, task: Task) -> StoreResult<TaskView>;

    /// Apply `patch` to the single row identified by project and id.
    /// Returns `StoreError::NoRows` when no such row exists.
    fn update_task(
        &mut self,
        project_id: &str,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> StoreResult<TaskView>;

    /// Delete a task together with its dependency edges and deadline.
    /// Returns whether a row was removed.
    fn delete_task(&mut self, project_id: &str, task_id: TaskId) -> StoreResult<bool>;

    /// Dependencies whose predecessor task belongs to `project_id`.
    fn project_dependencies(&self, project_id: &str) -> StoreResult<Vec<Dependency>>;

    fn insert_dependency(&mut self, dependency: Dependency) -> StoreResult<Dependency>;

    fn delete_dependency(&mut self, dependency_id: DependencyId) -> StoreResult<bool>;

    /// Insert or replace the deadline keyed on its task id.
    fn upsert_deadline(&mut self, task_id: TaskId, date: NaiveDate) -> StoreResult<Deadline>;

    fn delete_deadline(&mut self, task_id: TaskId) -> StoreResult<bool>;
}
