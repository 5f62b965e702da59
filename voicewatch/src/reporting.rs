//! Error reporting collaborator.
//!
//! Failures that are swallowed (exhausted webhook retries, failed channel
//! cycles) are handed to an [`ErrorReporter`] injected at construction time.

use tracing::error;

use crate::Error;

/// Sink for errors that do not propagate to the caller.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &Error);
}

/// Reports errors as `error!` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, err: &Error) {
        match err {
            Error::Delivery { url, reason } => {
                error!(url = %url, reason = %reason, "Webhook delivery failed")
            }
            Error::ProgrammingFault(msg) => error!(fault = %msg, "Programming fault"),
            other => error!(error = %other, "Unhandled error"),
        }
    }
}
