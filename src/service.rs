//! Scheduling service: the entry point for every schedule operation.
//!
//! `SchedulingService` owns a `ScheduleStore` and layers the business rules
//! on top of it: caller checks, field validation, sort-order assignment,
//! hierarchy integrity and milestone shaping. Dependency, deadline,
//! indent/outdent, summary and Gantt operations live in their own modules as
//! further `impl` blocks on the same type.

use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{ScheduleError, ScheduleResult};
use crate::fields::*;
use crate::store::{ScheduleStore, StoreError, TaskFilter, TaskQuery};
use crate::task::{BulkUpdate, NewTask, Task, TaskId, TaskPatch, TaskView};

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Parent filter for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParentFilter {
    /// No filter on the parent.
    #[default]
    Any,
    /// Root tasks only.
    Root,
    /// Direct children of the given task.
    Children(TaskId),
}

/// Listing options. `sort` is a free-form key checked against the allow-list.
#[derive(Debug, Clone)]
pub struct TaskListParams {
    pub page: usize,
    pub limit: usize,
    pub sort: Option<String>,
    pub order: SortDirection,
    pub status: Option<TaskStatus>,
    pub parent_task_id: ParentFilter,
    pub is_milestone: Option<bool>,
    pub search: Option<String>,
}

impl Default for TaskListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort: None,
            order: SortDirection::Asc,
            status: None,
            parent_task_id: ParentFilter::Any,
            is_milestone: None,
            search: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: usize,
    pub per_page: usize,
    pub total_records: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    /// Page and page size are clamped to at least 1.
    pub fn new(page: usize, per_page: usize, total_records: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let offset = (page - 1).saturating_mul(per_page);
        Self {
            current_page: page,
            per_page,
            total_records,
            total_pages: total_records.div_ceil(per_page),
            has_next_page: total_records > offset.saturating_add(per_page),
            has_prev_page: page > 1,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub rows: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub id: TaskId,
    pub error: String,
}

/// Per-id outcome of a bulk update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkUpdateResult {
    pub success: Vec<TaskId>,
    pub failed: Vec<BulkFailure>,
}

/// Check the field rules every stored task must satisfy.
fn validate_task(task: &Task) -> ScheduleResult<()> {
    if task.name.trim().is_empty() {
        return Err(ScheduleError::validation("task name is required"));
    }
    if task.percent_complete > 100 {
        return Err(ScheduleError::validation(format!(
            "percent complete must be between 0 and 100, got {}",
            task.percent_complete
        )));
    }
    if let (Some(start), Some(finish)) = (task.start_date, task.finish_date) {
        if start > finish {
            return Err(ScheduleError::validation(format!(
                "finish date {finish} is before start date {start}"
            )));
        }
    }
    if task.constraint_type.is_some() && task.constraint_date.is_none() {
        return Err(ScheduleError::validation(
            "a constraint type requires a constraint date",
        ));
    }
    Ok(())
}

/// Scheduling engine over a backing store.
pub struct SchedulingService<S> {
    pub(crate) store: S,
}

impl<S: ScheduleStore> SchedulingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// One page of a project's tasks.
    pub fn list_tasks(
        &self,
        project_id: &str,
        params: &TaskListParams,
    ) -> ScheduleResult<Paginated<TaskView>> {
        let page = params.page.max(1);
        let limit = params.limit.max(1);
        let offset = (page - 1).saturating_mul(limit);

        let mut query = TaskQuery::new().filter(TaskFilter::ProjectId(project_id.to_string()));
        if let Some(status) = params.status.as_ref().filter(|s| s.as_str() != "all") {
            query = query.filter(TaskFilter::Status(status.clone()));
        }
        match params.parent_task_id {
            ParentFilter::Any => {}
            ParentFilter::Root => query = query.filter(TaskFilter::Parent(None)),
            ParentFilter::Children(id) => query = query.filter(TaskFilter::Parent(Some(id))),
        }
        if let Some(milestone) = params.is_milestone {
            query = query.filter(TaskFilter::IsMilestone(milestone));
        }
        if let Some(search) = params.search.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(TaskFilter::NameContains(search.to_string()));
        }
        let field = params
            .sort
            .as_deref()
            .map(SortField::from_key)
            .unwrap_or_default();
        let query = query.order_by(field, params.order).range(offset, limit);

        let result = self
            .store
            .query_tasks(&query)
            .map_err(|e| ScheduleError::store("fetch tasks", e))?;
        debug!(project_id, page, limit, total = result.count, "listed tasks");
        Ok(Paginated {
            rows: result.rows,
            pagination: Pagination::new(page, limit, result.count),
        })
    }

    /// Every task of a project, ordered by sort order.
    pub fn tasks(&self, project_id: &str) -> ScheduleResult<Vec<TaskView>> {
        let query = TaskQuery::new()
            .filter(TaskFilter::ProjectId(project_id.to_string()))
            .order_by(SortField::SortOrder, SortDirection::Asc);
        self.store
            .query_tasks(&query)
            .map(|r| r.rows)
            .map_err(|e| ScheduleError::store("fetch tasks", e))
    }

    pub fn get_task(&self, project_id: &str, task_id: TaskId) -> ScheduleResult<TaskView> {
        let query = TaskQuery::new()
            .filter(TaskFilter::ProjectId(project_id.to_string()))
            .filter(TaskFilter::Id(task_id))
            .range(0, 1);
        let result = self
            .store
            .query_tasks(&query)
            .map_err(|e| ScheduleError::store("fetch task", e))?;
        result
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| ScheduleError::not_found(task_id))
    }

    pub fn create_task(
        &mut self,
        ctx: &RequestContext,
        project_id: &str,
        new: NewTask,
    ) -> ScheduleResult<TaskView> {
        let caller = ctx.require_caller()?;

        if let Some(parent) = new.parent_task_id {
            self.require_parent(project_id, parent)?;
        }
        let sort_order = match new.sort_order {
            Some(order) => order,
            None => self.next_sort_order(project_id, new.parent_task_id)?,
        };

        let now = Utc::now().timestamp();
        let mut task = Task {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            parent_task_id: new.parent_task_id,
            sort_order,
            name: new.name.trim().to_string(),
            start_date: new.start_date,
            finish_date: new.finish_date,
            duration_days: new.duration_days,
            percent_complete: new.percent_complete.unwrap_or(0),
            status: new.status.unwrap_or_default(),
            is_milestone: new.is_milestone.unwrap_or(false),
            constraint_type: new.constraint_type,
            constraint_date: new.constraint_date,
            wbs_code: new.wbs_code,
            created_by: Some(caller.user_id.clone()),
            created_at_utc: now,
            updated_at_utc: now,
        };
        if new.duration_days.is_none() && !task.is_milestone {
            if let Some(days) = task.span_days() {
                task.duration_days = Some(days);
            }
        }
        task.apply_milestone_shape();
        validate_task(&task)?;

        let created = self
            .store
            .insert_task(task)
            .map_err(|e| ScheduleError::store("create task", e))?;
        info!(
            project_id,
            task_id = %created.id(),
            sort_order = created.task.sort_order,
            "created task"
        );
        Ok(created)
    }

    pub fn update_task(
        &mut self,
        ctx: &RequestContext,
        project_id: &str,
        task_id: TaskId,
        patch: TaskPatch,
    ) -> ScheduleResult<TaskView> {
        ctx.require_caller()?;
        self.apply_update(project_id, task_id, patch)
    }

    /// Validate and write a patch. Shared by single, bulk and re-parenting updates.
    ///
    /// The patch is checked against the current row: a parent change must not
    /// create a cycle and appends the task to its new sibling group, date edits
    /// recompute the duration unless one is given, and a task that ends up a
    /// milestone gets zero duration and its finish pinned to its start.
    pub(crate) fn apply_update(
        &mut self,
        project_id: &str,
        task_id: TaskId,
        mut patch: TaskPatch,
    ) -> ScheduleResult<TaskView> {
        let current = self.get_task(project_id, task_id)?;

        if let Some(new_parent) = patch.parent_task_id {
            if let Some(parent) = new_parent {
                self.validate_parent_change(project_id, task_id, parent)?;
            }
            // A moved task goes to the end of its new sibling group.
            if new_parent != current.task.parent_task_id && patch.sort_order.is_none() {
                patch.sort_order = Some(self.next_sort_order(project_id, new_parent)?);
            }
        }

        let mut merged = current.task.clone();
        patch.apply_to(&mut merged);
        let dates_changed = patch.start_date.is_some()
            || patch.finish_date.is_some()
            || patch.is_milestone == Some(false);
        if dates_changed && patch.duration_days.is_none() && !merged.is_milestone {
            if let Some(days) = merged.span_days() {
                patch.duration_days = Some(Some(days));
                merged.duration_days = Some(days);
            }
        }
        if merged.is_milestone {
            patch.duration_days = Some(Some(0));
            if merged.start_date.is_some() {
                patch.finish_date = Some(merged.start_date);
            }
            merged.apply_milestone_shape();
        }
        validate_task(&merged)?;

        match self.store.update_task(project_id, task_id, &patch) {
            Ok(updated) => {
                info!(project_id, %task_id, "updated task");
                Ok(updated)
            }
            Err(StoreError::NoRows) => Err(ScheduleError::not_found(task_id)),
            Err(e) => Err(ScheduleError::store("update task", e)),
        }
    }

    /// Delete a task; its dependency edges and deadline go with it.
    pub fn delete_task(
        &mut self,
        ctx: &RequestContext,
        project_id: &str,
        task_id: TaskId,
    ) -> ScheduleResult<bool> {
        ctx.require_caller()?;
        let deleted = self
            .store
            .delete_task(project_id, task_id)
            .map_err(|e| ScheduleError::store("delete task", e))?;
        info!(project_id, %task_id, deleted, "deleted task");
        Ok(deleted)
    }

    /// Apply one patch to many tasks, one at a time.
    ///
    /// Failures are collected per id; tasks that succeeded stay updated.
    pub fn bulk_update_tasks(
        &mut self,
        ctx: &RequestContext,
        project_id: &str,
        bulk: &BulkUpdate,
    ) -> ScheduleResult<BulkUpdateResult> {
        ctx.require_caller()?;
        let mut result = BulkUpdateResult::default();
        for &id in &bulk.ids {
            match self.apply_update(project_id, id, bulk.updates.clone()) {
                Ok(_) => result.success.push(id),
                Err(e) => {
                    warn!(project_id, task_id = %id, error = %e, "bulk update item failed");
                    result.failed.push(BulkFailure {
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }
        info!(
            project_id,
            succeeded = result.success.len(),
            failed = result.failed.len(),
            "bulk update finished"
        );
        Ok(result)
    }

    /// Next free sort order in a (project, parent) sibling group.
    pub fn next_sort_order(
        &self,
        project_id: &str,
        parent_task_id: Option<TaskId>,
    ) -> ScheduleResult<i64> {
        let query = TaskQuery::new()
            .filter(TaskFilter::ProjectId(project_id.to_string()))
            .filter(TaskFilter::Parent(parent_task_id))
            .order_by(SortField::SortOrder, SortDirection::Desc)
            .range(0, 1);
        let result = self
            .store
            .query_tasks(&query)
            .map_err(|e| ScheduleError::store("fetch sort order", e))?;
        Ok(result
            .rows
            .first()
            .map_or(0, |t| t.task.sort_order + 1))
    }

    /// All transitive children of a task.
    ///
    /// Walks the tree one level at a time with a store query per parent.
    pub fn descendants(&self, project_id: &str, task_id: TaskId) -> ScheduleResult<Vec<TaskId>> {
        let mut found = Vec::new();
        let mut seen = HashSet::from([task_id]);
        let mut frontier = VecDeque::from([task_id]);
        while let Some(parent) = frontier.pop_front() {
            let query = TaskQuery::new()
                .filter(TaskFilter::ProjectId(project_id.to_string()))
                .filter(TaskFilter::Parent(Some(parent)));
            let children = self
                .store
                .query_tasks(&query)
                .map_err(|e| ScheduleError::store("fetch descendants", e))?;
            for child in children.rows {
                if seen.insert(child.id()) {
                    found.push(child.id());
                    frontier.push_back(child.id());
                }
            }
        }
        Ok(found)
    }

    fn require_parent(&self, project_id: &str, parent: TaskId) -> ScheduleResult<()> {
        match self.get_task(project_id, parent) {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Err(ScheduleError::invalid_hierarchy(format!(
                "parent task {parent} does not exist in this project"
            ))),
            Err(e) => Err(e),
        }
    }

    fn validate_parent_change(
        &self,
        project_id: &str,
        task_id: TaskId,
        new_parent: TaskId,
    ) -> ScheduleResult<()> {
        if new_parent == task_id {
            warn!(%task_id, "rejected self-parenting");
            return Err(ScheduleError::invalid_hierarchy(
                "cannot set a task as its own parent",
            ));
        }
        self.require_parent(project_id, new_parent)?;
        if self.descendants(project_id, task_id)?.contains(&new_parent) {
            warn!(%task_id, %new_parent, "rejected descendant as parent");
            return Err(ScheduleError::invalid_hierarchy(
                "cannot set a descendant as the parent",
            ));
        }
        Ok(())
    }
}
