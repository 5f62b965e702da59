//! Application-wide error types.

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Webhook delivery failed (transport error or HTTP status >= 400).
    #[error("Webhook delivery to {url} failed: {reason}")]
    Delivery { url: String, reason: String },

    #[error("Queue error: {0}")]
    Queue(#[from] redis::RedisError),

    /// An integration defect, e.g. a push primitive returning something that
    /// is not a push acknowledgement. Never retried or swallowed.
    #[error("Programming fault: {0}")]
    ProgrammingFault(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn delivery(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Delivery {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn fault(msg: impl Into<String>) -> Self {
        Self::ProgrammingFault(msg.into())
    }

    /// Whether this error must abort the current channel cycle without
    /// advancing its stored state.
    pub fn is_programming_fault(&self) -> bool {
        matches!(self, Self::ProgrammingFault(_))
    }
}
