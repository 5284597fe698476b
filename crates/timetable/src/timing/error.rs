//! Error types for the timing codec.

use thiserror::Error;

/// Errors that can occur while decoding a timing code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The code is not exactly nine characters long
    #[error("Timing code must be 9 characters, got {len}")]
    MalformedLength { len: usize },

    /// The leading day digit is not in 1..=5
    #[error("Invalid day digit '{digit}' (expected 1-5)")]
    InvalidDay { digit: char },

    /// A start or end component is not a valid HHMM clock time
    #[error("Invalid clock time '{text}'")]
    InvalidTime { text: String },

    /// The session does not end after it starts
    #[error("Session must end after it starts ({start} >= {end})")]
    InvalidRange { start: String, end: String },
}
