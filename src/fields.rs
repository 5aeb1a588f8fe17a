//! Enumerations and field types for schedule tasks.
//!
//! This module defines the structured values stored on tasks and dependency
//! edges (status, dependency type, scheduling constraint) together with the
//! sort keys accepted by task listings.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Normalise a free-form token (`In Progress`, `in-progress`) to snake case.
fn normalise_token(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Task completion status.
///
/// Statuses written by other tools are kept verbatim in `Other` so a round
/// trip through the engine never loses them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Complete,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Complete => "complete",
            TaskStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match normalise_token(&s).as_str() {
            "not_started" => TaskStatus::NotStarted,
            "in_progress" => TaskStatus::InProgress,
            "complete" => TaskStatus::Complete,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(s: TaskStatus) -> Self {
        match s {
            TaskStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TaskStatus::from(s.to_string()))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a predecessor's dates constrain its successor.
///
/// Only the four standard precedence types are named; anything else is an
/// opaque token carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DependencyType {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
    Other(String),
}

impl DependencyType {
    pub fn as_str(&self) -> &str {
        match self {
            DependencyType::FinishToStart => "finish_to_start",
            DependencyType::StartToStart => "start_to_start",
            DependencyType::FinishToFinish => "finish_to_finish",
            DependencyType::StartToFinish => "start_to_finish",
            DependencyType::Other(s) => s.as_str(),
        }
    }

    /// Two-letter abbreviation used in compact listings (FS, SS, FF, SF).
    pub fn short(&self) -> &str {
        match self {
            DependencyType::FinishToStart => "FS",
            DependencyType::StartToStart => "SS",
            DependencyType::FinishToFinish => "FF",
            DependencyType::StartToFinish => "SF",
            DependencyType::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for DependencyType {
    fn from(s: String) -> Self {
        match normalise_token(&s).as_str() {
            "finish_to_start" | "fs" => DependencyType::FinishToStart,
            "start_to_start" | "ss" => DependencyType::StartToStart,
            "finish_to_finish" | "ff" => DependencyType::FinishToFinish,
            "start_to_finish" | "sf" => DependencyType::StartToFinish,
            _ => DependencyType::Other(s),
        }
    }
}

impl From<DependencyType> for String {
    fn from(d: DependencyType) -> Self {
        match d {
            DependencyType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for DependencyType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DependencyType::from(s.to_string()))
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling constraint pinned to a task's constraint date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    StartNoEarlierThan,
    FinishNoLaterThan,
    MustStartOn,
    MustFinishOn,
}

/// Columns a task listing may be ordered by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    StartDate,
    FinishDate,
    PercentComplete,
    Status,
    CreatedAt,
    #[default]
    SortOrder,
}

impl SortField {
    /// Map a caller-supplied sort key onto the allow-list.
    /// Unrecognised keys silently fall back to `sort_order`.
    pub fn from_key(key: &str) -> SortField {
        match key.trim() {
            "name" => SortField::Name,
            "start_date" => SortField::StartDate,
            "finish_date" => SortField::FinishDate,
            "percent_complete" => SortField::PercentComplete,
            "status" => SortField::Status,
            "created_at" => SortField::CreatedAt,
            _ => SortField::SortOrder,
        }
    }
}

/// Sort direction for listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}
