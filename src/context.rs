//! Per-request caller context.
//!
//! The outer layer resolves who is calling once per request and threads the
//! resulting `RequestContext` into every mutating operation.

use crate::error::{ScheduleError, ScheduleResult};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
}

/// Credentials for one request. `caller` is `None` for anonymous requests.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub caller: Option<Caller>,
}

impl RequestContext {
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            caller: Some(Caller {
                user_id: user_id.into(),
            }),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Blank user names count as anonymous.
    pub fn from_user(user: Option<&str>) -> Self {
        match user.map(str::trim).filter(|u| !u.is_empty()) {
            Some(u) => Self::authenticated(u),
            None => Self::anonymous(),
        }
    }

    /// The caller, or `AuthRequired` when nobody is signed in.
    pub fn require_caller(&self) -> ScheduleResult<&Caller> {
        self.caller.as_ref().ok_or(ScheduleError::AuthRequired)
    }
}
