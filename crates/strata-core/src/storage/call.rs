//! Retry settings shared by the storage clients, and the one place they call through.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::error::StorageError;
use crate::retry::{
    run_with_retry, run_with_retry_cancellable, ErrorClassifier, RemoteError, RetryPolicy,
};

/// Retry policy, classifier and optional cancellation for a client.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    policy: RetryPolicy,
    classifier: ErrorClassifier,
    cancel: Option<CancellationToken>,
}

impl CallOptions {
    /// `None` selects the default preset.
    pub fn new(policy: Option<RetryPolicy>) -> Self {
        Self {
            policy: policy.unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Run one remote call through the retry loop and translate its failure.
    pub(crate) async fn call<T, F, Fut>(&self, op: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let result = match &self.cancel {
            Some(token) => {
                run_with_retry_cancellable(Some(&self.policy), &self.classifier, token, op).await
            }
            None => run_with_retry(Some(&self.policy), &self.classifier, op).await,
        };
        result.map_err(StorageError::from)
    }
}
