//! Error types for gantry.

use thiserror::Error;

/// Result type alias for gantry operations.
pub type Result<T> = std::result::Result<T, GantryError>;

/// Errors that can occur while talking to the remote job service.
#[derive(Error, Debug)]
pub enum GantryError {
    /// The remote entity (job or id probe) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A requested log file does not exist for the job.
    #[error("Log not found: {0}")]
    LogNotFound(String),

    /// Terminal non-2xx response, after retries were exhausted or a
    /// disallowed status code was hit.
    #[error("HTTP {status} from {url}")]
    Http {
        /// HTTP status code of the final response.
        status: u16,
        /// URL the request was issued against.
        url: String,
    },

    /// Job id collision on submission (HTTP 409).
    #[error("Job id conflict: {0}")]
    Conflict(String),

    /// Invalid combination of client options.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The server responded with an unexpected payload shape.
    #[error("Unexpected response: {0}")]
    Protocol(String),

    /// Network-level failure, surfaced unwrapped after retries were exhausted.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while writing watched log output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GantryError {
    /// Returns true for the not-found variants (job, log, or id-probe miss).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::LogNotFound(_))
    }
}

/// Network-level request failures.
///
/// Distinct from [`GantryError::Http`]: a transport failure never produced a
/// status code at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The connection could not be established.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Any other transport-level failure.
    #[error("Request failed: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_not_found() {
        assert!(GantryError::NotFound("job".into()).is_not_found());
        assert!(GantryError::LogNotFound("stderr".into()).is_not_found());
        assert!(
            !GantryError::Http {
                status: 500,
                url: "http://example".into()
            }
            .is_not_found()
        );
        assert!(!GantryError::Transport(TransportError::Timeout).is_not_found());
    }

    #[test]
    fn test_transport_error_stays_unwrapped() {
        let err = GantryError::from(TransportError::Connect("refused".into()));
        assert!(matches!(
            err,
            GantryError::Transport(TransportError::Connect(_))
        ));
    }
}
