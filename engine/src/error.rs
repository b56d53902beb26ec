//! Error types for the Binder engine.

use thiserror::Error;

/// All possible errors from a sync attempt or replica operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// No valid credential was available; the sync was aborted before any
    /// network call.
    #[error("not authenticated")]
    Unauthenticated,

    /// Timeout or connection failure. Dirty flags are untouched and the
    /// attempt is safe to retry.
    #[error("network failure: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(Error::Unauthenticated.to_string(), "not authenticated");

        let err = Error::Transport("connection refused".into());
        assert_eq!(err.to_string(), "network failure: connection refused");

        let err = Error::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "server error (500): boom");
    }
}
