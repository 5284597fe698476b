//! Error types for the selection manager.

use crate::schedule::{Component, ValidationError};
use thiserror::Error;

/// Errors returned by edits to a user's selection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The course has not been added to this selection
    #[error("Course {code} is not in the selection")]
    NotSelected { code: String },

    /// The credit structure gives this component zero weight
    #[error("Course {code} has no {component} component")]
    ComponentNotOffered { code: String, component: Component },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Errors raised while restoring a persisted selection.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Malformed selection snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// Selected courses and schedules are not in one-to-one correspondence
    #[error("Inconsistent selection snapshot: {message}")]
    Inconsistent { message: String },

    #[error("Stored schedule for {code} is invalid: {source}")]
    InvalidSchedule {
        code: String,
        #[source]
        source: ValidationError,
    },
}
