//! Error types for Feedmill.

use thiserror::Error;

/// Common error type for Feedmill.
#[derive(Error, Debug)]
pub enum FeedmillError {
    /// Database error.
    ///
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A feed could not be fetched or decoded.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The command requires a logged-in user.
    #[error("authentication error: {0}")]
    Auth(String),
}

impl From<sqlx::Error> for FeedmillError {
    fn from(e: sqlx::Error) -> Self {
        FeedmillError::Database(e.to_string())
    }
}

/// Reasons a feed fetch can fail.
///
/// All variants belong to the same "fetch failed" class: none of them are
/// retried, and the ingestion pass for the feed is aborted.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL could not be parsed or is not an http(s) URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// DNS, connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The body exceeded the configured size limit.
    #[error("feed too large: {size} bytes (max {max} bytes)")]
    TooLarge {
        /// Observed or announced size.
        size: u64,
        /// Configured maximum.
        max: u64,
    },

    /// The body could not be read.
    #[error("failed to read response: {0}")]
    Body(String),

    /// The body is not a structurally valid RSS document.
    #[error("failed to parse feed: {0}")]
    Parse(String),
}

/// Outcome of a failed post insert.
///
/// The duplicate case is a normal, expected result of re-fetching a feed and
/// must stay distinguishable from every other write failure.
#[derive(Error, Debug)]
pub enum PostInsertError {
    /// A post with the same URL already exists.
    #[error("duplicate post URL: {url}")]
    DuplicateKey {
        /// The conflicting URL.
        url: String,
    },

    /// Any other write failure.
    #[error("failed to insert post: {0}")]
    Other(String),
}

impl PostInsertError {
    /// Classify a sqlx error raised by an insert.
    pub fn from_sqlx(e: sqlx::Error, url: &str) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                PostInsertError::DuplicateKey {
                    url: url.to_string(),
                }
            }
            _ => PostInsertError::Other(e.to_string()),
        }
    }

    /// Check if this is the duplicate-key outcome.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, PostInsertError::DuplicateKey { .. })
    }
}

/// Result type alias for Feedmill operations.
pub type Result<T> = std::result::Result<T, FeedmillError>;
