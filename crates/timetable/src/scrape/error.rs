//! Error types for the directory scrape job.

use thiserror::Error;

/// Errors that abort a scrape run. Failures on individual course pages are
/// logged and skipped instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Server returned a non-success status
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// URL parsing/construction failed
    #[error("URL error: {message}")]
    UrlError { message: String },

    /// The index page listed no course pages for the semester
    #[error("No course pages found for prefix {prefix}")]
    NoCoursePages { prefix: String },

    #[error("Failed to write {path}: {message}")]
    Output { path: String, message: String },
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        ScrapeError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for ScrapeError {
    fn from(err: url::ParseError) -> Self {
        ScrapeError::UrlError {
            message: err.to_string(),
        }
    }
}
