//! Core use-case services.
//!
//! # Responsibility
//! - Validate inputs before any transaction is opened.
//! - Orchestrate repository calls into use-case level APIs.
//! - Classify failures into the three caller-facing kinds.
//!
//! # Invariants
//! - Services never write SQL; hierarchy writes go through
//!   `HierarchyRepository` only.

use serde::Serialize;

pub mod directory_service;
pub mod hierarchy_mutator;
pub mod hierarchy_reader;

/// Caller-facing failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Referenced row is absent or lacks the expected status.
    NotFound,
    /// Input rejected before or without touching stored state.
    Validation,
    /// Storage or transaction failure; nothing was committed.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}
