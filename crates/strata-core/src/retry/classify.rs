//! Classify remote failures as transient (worth retrying) or fatal.

use std::error::Error as StdError;
use std::io;

use super::error::{Cancelled, RemoteFailure};

/// Status codes treated as transient unless configured otherwise.
pub const DEFAULT_TRANSIENT_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Backend error codes treated as transient unless configured otherwise.
pub const DEFAULT_TRANSIENT_ERROR_CODES: [&str; 2] = ["ServerBusy", "OperationTimedOut"];

/// Why a failure was classified the way it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 429: the backend asked us to slow down.
    Throttled,
    /// Timeout or server-side status (408, 5xx).
    TransientStatus(u16),
    /// Symbolic backend code such as `ServerBusy`.
    TransientCode,
    /// Connection reset, socket error, I/O timeout somewhere in the cause chain.
    Connection,
    /// The call was cancelled. Never retried.
    Cancelled,
    /// Anything else, including failures with nothing to interpret.
    Fatal,
}

impl FailureKind {
    pub fn is_transient(self) -> bool {
        !matches!(self, FailureKind::Cancelled | FailureKind::Fatal)
    }
}

/// Verdict for one failure, with the codes it was based on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFailure {
    pub kind: FailureKind,
    pub is_transient: bool,
    pub status_code: Option<u16>,
    pub error_code: Option<String>,
}

/// Decides whether a failure is worth retrying.
///
/// Rules, first match wins: cancellation is fatal; a status in the transient
/// set is transient; an error code in the transient set is transient; a
/// connectivity failure in the cause chain is transient; everything else is
/// fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassifier {
    transient_status_codes: Vec<u16>,
    transient_error_codes: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_TRANSIENT_STATUS_CODES,
            DEFAULT_TRANSIENT_ERROR_CODES,
        )
    }
}

impl ErrorClassifier {
    pub fn new<S>(
        status_codes: impl IntoIterator<Item = u16>,
        error_codes: impl IntoIterator<Item = S>,
    ) -> Self
    where
        S: Into<String>,
    {
        Self {
            transient_status_codes: status_codes.into_iter().collect(),
            transient_error_codes: error_codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn transient_status_codes(&self) -> &[u16] {
        &self.transient_status_codes
    }

    pub fn transient_error_codes(&self) -> &[String] {
        &self.transient_error_codes
    }

    pub fn is_transient<E: RemoteFailure + ?Sized>(&self, failure: &E) -> bool {
        self.kind_of(failure).is_transient()
    }

    pub fn classify<E: RemoteFailure + ?Sized>(&self, failure: &E) -> ClassifiedFailure {
        let kind = self.kind_of(failure);
        ClassifiedFailure {
            kind,
            is_transient: kind.is_transient(),
            status_code: failure.status_code(),
            error_code: failure.error_code().map(str::to_owned),
        }
    }

    fn kind_of<E: RemoteFailure + ?Sized>(&self, failure: &E) -> FailureKind {
        if failure.is_cancellation() || causes(failure).any(|c| c.is::<Cancelled>()) {
            return FailureKind::Cancelled;
        }
        if let Some(status) = failure.status_code() {
            if self.transient_status_codes.contains(&status) {
                return if status == 429 {
                    FailureKind::Throttled
                } else {
                    FailureKind::TransientStatus(status)
                };
            }
        }
        if let Some(code) = failure.error_code() {
            if self.transient_error_codes.iter().any(|c| c == code) {
                return FailureKind::TransientCode;
            }
        }
        if causes(failure).any(is_connectivity_failure) {
            return FailureKind::Connection;
        }
        FailureKind::Fatal
    }
}

fn causes<'a, E: StdError + ?Sized>(
    failure: &'a E,
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(failure.source(), |c: &&'a (dyn StdError + 'static)| (*c).source())
}

/// Low-level connectivity failures: connection reset/refused/aborted, broken
/// sockets, and I/O timeouts.
pub fn is_connectivity_failure(cause: &(dyn StdError + 'static)) -> bool {
    if let Some(io) = cause.downcast_ref::<io::Error>() {
        return matches!(
            io.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::ConnectionRefused
                | io::ErrorKind::NotConnected
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::TimedOut
                | io::ErrorKind::UnexpectedEof
        );
    }
    cause.is::<tokio::time::error::Elapsed>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RemoteError;

    #[test]
    fn retryable_status_codes_are_transient() {
        let c = ErrorClassifier::default();
        for status in [408, 500, 502, 503, 504] {
            let e = RemoteError::with_status(status, "Whatever", "x");
            assert_eq!(c.classify(&e).kind, FailureKind::TransientStatus(status));
        }
    }

    #[test]
    fn http_429_throttled() {
        let c = ErrorClassifier::default();
        let e = RemoteError::with_status(429, "TooManyRequests", "slow down");
        let v = c.classify(&e);
        assert_eq!(v.kind, FailureKind::Throttled);
        assert!(v.is_transient);
        assert_eq!(v.status_code, Some(429));
    }

    #[test]
    fn busy_codes_are_transient_regardless_of_status() {
        let c = ErrorClassifier::default();
        assert!(c.is_transient(&RemoteError::with_status(400, "ServerBusy", "x")));
        assert!(c.is_transient(&RemoteError::with_status(409, "OperationTimedOut", "x")));
    }

    #[test]
    fn client_errors_are_fatal() {
        let c = ErrorClassifier::default();
        for status in [400, 401, 403, 404, 409, 412] {
            let e = RemoteError::with_status(status, "SomeCode", "x");
            assert!(!c.is_transient(&e), "status {status} should be fatal");
        }
    }

    #[test]
    fn connection_reset_in_chain_is_transient() {
        let c = ErrorClassifier::default();
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let inner = RemoteError::new("transport").with_source(io);
        let outer = RemoteError::new("call failed").with_source(inner);
        assert_eq!(c.classify(&outer).kind, FailureKind::Connection);
    }

    #[test]
    fn other_io_errors_are_fatal() {
        let c = ErrorClassifier::default();
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(!c.is_transient(&RemoteError::new("x").with_source(io)));
    }

    #[test]
    fn empty_failure_fails_closed() {
        let c = ErrorClassifier::default();
        assert_eq!(c.classify(&RemoteError::new("???")).kind, FailureKind::Fatal);
    }

    #[test]
    fn cancellation_wins_over_transient_status() {
        let c = ErrorClassifier::default();
        let e = RemoteError::with_status(503, "ServerBusy", "x").with_source(Cancelled);
        assert_eq!(c.classify(&e).kind, FailureKind::Cancelled);
        assert!(!c.is_transient(&RemoteError::from(Cancelled)));
    }

    #[test]
    fn custom_sets_replace_defaults() {
        let c = ErrorClassifier::new([418], ["Teapot"]);
        assert!(c.is_transient(&RemoteError::with_status(418, "X", "x")));
        assert!(c.is_transient(&RemoteError::with_status(400, "Teapot", "x")));
        assert!(!c.is_transient(&RemoteError::with_status(503, "X", "x")));
    }
}
