//! # PM Schedule - Project Scheduling Engine
//!
//! Task scheduling for construction-style projects: a work breakdown structure
//! (WBS) of tasks, precedence dependencies between them, per-task deadlines and
//! the derived views a planner needs (summary statistics and Gantt rows).
//!
//! ## Key Features
//!
//! - **WBS Hierarchy**: Tasks nest under parents to any depth, ordered by a
//!   per-sibling-group sort order. Indent/outdent move a task one level.
//! - **Precedence Dependencies**: FS, SS, FF and SF links with lag or lead,
//!   guarded against cycles before they are written.
//! - **Deadlines**: At most one deadline per task, feeding the overdue flag.
//! - **Derived Views**: Nested hierarchy, summary statistics and Gantt items.
//! - **Pluggable Storage**: Every operation runs over a `ScheduleStore`; the
//!   bundled `Database` keeps everything in one local JSON file.
//!
//! ## Quick Start
//!
//! ```bash
//! pm-schedule --project tower add "Foundations"
//! pm-schedule --project tower add "Excavation" --parent Foundations --start 2025-03-01 --finish 2025-03-07
//! pm-schedule --project tower dep add Excavation "Pour footings" --type ss --lag 2
//! pm-schedule --project tower list --tree
//! pm-schedule --project tower gantt
//! ```
//!
//! ## Library Use
//!
//! ```no_run
//! use project_schedule::{Database, NewTask, RequestContext, SchedulingService};
//!
//! let mut svc = SchedulingService::new(Database::default());
//! let ctx = RequestContext::authenticated("planner");
//! let root = svc.create_task(&ctx, "tower", NewTask::named("Foundations")).unwrap();
//! let summary = svc.summary("tower").unwrap();
//! assert_eq!(summary.total_tasks, 1);
//! # let _ = root;
//! ```

pub mod context;
pub mod db;
pub mod deadlines;
pub mod dependencies;
pub mod error;
pub mod fields;
pub mod gantt;
pub mod hierarchy;
pub mod indent;
pub mod service;
pub mod store;
pub mod summary;
pub mod task;

#[cfg(test)]
mod testing;

pub use context::{Caller, RequestContext};
pub use db::Database;
pub use error::{ScheduleError, ScheduleResult};
pub use gantt::{GanttDependency, GanttItem};
pub use hierarchy::TreeNode;
pub use service::{BulkUpdateResult, Paginated, Pagination, ParentFilter, SchedulingService, TaskListParams};
pub use store::{ScheduleStore, StoreError};
pub use summary::ScheduleSummary;
pub use task::{
    BulkUpdate, Deadline, Dependency, NewDeadline, NewDependency, NewTask, Task, TaskId,
    TaskPatch, TaskView,
};
