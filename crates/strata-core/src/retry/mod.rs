//! Retry and backoff policy.
//!
//! This module encapsulates error classification (throttling, timeouts,
//! connection failures) and exponential backoff decisions so that every
//! storage surface (blob, queue, table, file share) shares one retry loop.

mod backoff;
mod classify;
mod error;
mod policy;
mod run;

pub use backoff::{backoff_delay, backoff_delay_with_jitter, exponential_delay};
pub use classify::{
    is_connectivity_failure, ClassifiedFailure, ErrorClassifier, FailureKind,
    DEFAULT_TRANSIENT_ERROR_CODES, DEFAULT_TRANSIENT_STATUS_CODES,
};
pub use error::{BoxError, Cancelled, RemoteError, RemoteFailure};
pub use policy::{RetryDecision, RetryPolicy, RetryPreset, StopReason};
pub use run::{run_with_retry, run_with_retry_cancellable, RetryAttemptContext};
