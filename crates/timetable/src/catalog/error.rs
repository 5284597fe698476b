//! Error types for catalog loading and lookups.

use thiserror::Error;

/// Errors raised while loading the static catalog inputs.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for the expected shape
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// An expected miss: the caller branches on it rather than treating it as a failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Course {code} is not in the catalog")]
    CourseNotFound { code: String },

    #[error("No courses recorded for student {id}")]
    StudentNotFound { id: String },
}
