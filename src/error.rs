//! Error types for demoskew.

use thiserror::Error;

/// Result type for demoskew operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for demoskew operations.
///
/// Missing reference data is *not* an error: it is modeled as
/// [`crate::reference::Reference::Unknown`] and propagated as a value. The
/// variants here cover caller bugs and broken inputs only.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided (e.g. successes exceeding trials, or a
    /// confidence level outside (0, 1)).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset loading/parsing error.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON read/write error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a dataset error.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Error::Dataset(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }
}
