//! Error types for the crawling engine
//!
//! Usage errors (bad configuration, invalid submissions, submitting after
//! shutdown) surface synchronously as `CrawlError`. Per-processor failures
//! never appear here: they are absorbed and logged inside the session, per
//! the engine's failure-isolation policy.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Error surface of the crawling engine
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Invalid argument supplied to a constructor or submission
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Submission attempted after the dispatcher was shut down
    #[error("crawler has been shut down")]
    ShutDown,

    /// The result store rejected a save; terminal for the owning session
    #[error("result store failure: {0:#}")]
    Store(anyhow::Error),

    /// The traversal task aborted with an unexpected error
    #[error("session failed: {0}")]
    Session(String),
}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        CrawlError::Session(format!("{err:#}"))
    }
}
