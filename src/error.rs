//! Error types for the scheduling engine.

use thiserror::Error;

use crate::store::StoreError;
use crate::task::TaskId;

/// Failures surfaced by scheduling operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Task '{task_id}' not found")]
    TaskNotFound { task_id: String },

    #[error("Invalid hierarchy: {reason}")]
    InvalidHierarchy { reason: String },

    #[error("Cannot indent task '{task_id}': no previous sibling to become parent")]
    MissingSibling { task_id: TaskId },

    #[error("Cannot outdent task '{task_id}': task is already at root level")]
    RootLevelTask { task_id: TaskId },

    #[error("Data integrity error: {reason}")]
    DataIntegrity { reason: String },

    #[error("Invalid task: {reason}")]
    Validation { reason: String },

    #[error("Failed to {action}: {message}")]
    StoreFailure { action: &'static str, message: String },
}

impl ScheduleError {
    pub fn not_found(task_id: impl ToString) -> Self {
        Self::TaskNotFound {
            task_id: task_id.to_string(),
        }
    }

    pub fn invalid_hierarchy(reason: impl Into<String>) -> Self {
        Self::InvalidHierarchy {
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Wrap a store error raised while performing `action`.
    pub fn store(action: &'static str, err: StoreError) -> Self {
        Self::StoreFailure {
            action,
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }

    /// Rejections raised before any write: hierarchy, sibling/root and field checks.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidHierarchy { .. }
                | Self::MissingSibling { .. }
                | Self::RootLevelTask { .. }
                | Self::Validation { .. }
        )
    }
}

/// Result type alias for scheduling operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
