//! Raw failure type produced by backend calls, and the cancellation marker.

use std::error::Error as StdError;
use std::fmt;

/// Boxed cause attached to a [`RemoteError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// What the classifier needs to see on a failed remote call.
///
/// The cause chain is read through `std::error::Error::source`.
pub trait RemoteFailure: StdError {
    /// Protocol-level status (HTTP-like), if the backend produced one.
    fn status_code(&self) -> Option<u16>;

    /// Backend-specific symbolic code, e.g. `ServerBusy`.
    fn error_code(&self) -> Option<&str>;

    /// True when the failure stands for a cancelled call.
    fn is_cancellation(&self) -> bool {
        false
    }
}

/// Returned when a call is abandoned because its cancellation token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Failure surfaced by a backend call.
///
/// Carries an optional status code, an optional symbolic error code and the
/// underlying cause, so the retry layer can classify it and callers can still
/// match on the exact code after retries are exhausted.
#[derive(Debug)]
pub struct RemoteError {
    status_code: Option<u16>,
    error_code: Option<String>,
    message: String,
    source: Option<BoxError>,
    cancelled: bool,
}

impl RemoteError {
    /// Failure with only a message (no status, no code).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            error_code: None,
            message: message.into(),
            source: None,
            cancelled: false,
        }
    }

    /// Failure with a status code and a symbolic error code.
    pub fn with_status(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status),
            error_code: Some(code.into()),
            ..Self::new(message)
        }
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl From<Cancelled> for RemoteError {
    fn from(c: Cancelled) -> Self {
        Self {
            cancelled: true,
            ..Self::new(c.to_string()).with_source(c)
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status_code, self.error_code.as_deref()) {
            (Some(status), Some(code)) => write!(f, "{} {}: {}", status, code, self.message),
            (Some(status), None) => write!(f, "{}: {}", status, self.message),
            (None, Some(code)) => write!(f, "{}: {}", code, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl StdError for RemoteError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl RemoteFailure for RemoteError {
    fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    fn is_cancellation(&self) -> bool {
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_and_code() {
        let e = RemoteError::with_status(503, "ServerBusy", "try later");
        assert_eq!(e.to_string(), "503 ServerBusy: try later");
        assert_eq!(RemoteError::new("boom").to_string(), "boom");
    }

    #[test]
    fn source_chain_is_exposed() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let e = RemoteError::new("send failed").with_source(io);
        let src = e.source().expect("source");
        assert!(src.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn cancelled_converts_into_cancellation_failure() {
        let e = RemoteError::from(Cancelled);
        assert!(e.is_cancellation());
        assert!(e.status_code().is_none());
        assert!(e.source().unwrap().downcast_ref::<Cancelled>().is_some());
    }
}
