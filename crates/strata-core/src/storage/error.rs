//! Public error type of the storage clients.

use crate::entity::EntityError;
use crate::retry::{RemoteError, RemoteFailure};

/// Error returned by every storage client operation.
///
/// Remote failures are sorted by status but keep the original [`RemoteError`],
/// so the backend's status and error code stay visible to callers.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(#[source] RemoteError),
    #[error("already exists: {0}")]
    AlreadyExists(#[source] RemoteError),
    #[error("precondition failed: {0}")]
    PreconditionFailed(#[source] RemoteError),
    /// Throttling that outlasted the retry budget.
    #[error("throttled: {0}")]
    Throttled(#[source] RemoteError),
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Remote(RemoteError),
    #[error("entity mapping failed: {0}")]
    Entity(#[from] EntityError),
}

impl From<RemoteError> for StorageError {
    fn from(e: RemoteError) -> Self {
        if e.is_cancellation() {
            return StorageError::Cancelled;
        }
        match (e.status_code(), e.error_code()) {
            (Some(404), _) => StorageError::NotFound(e),
            (Some(409), _) => StorageError::AlreadyExists(e),
            (Some(412), _) => StorageError::PreconditionFailed(e),
            (Some(429), _) | (Some(503), Some("ServerBusy")) => StorageError::Throttled(e),
            _ => StorageError::Remote(e),
        }
    }
}

impl StorageError {
    fn remote(&self) -> Option<&RemoteError> {
        match self {
            StorageError::NotFound(e)
            | StorageError::AlreadyExists(e)
            | StorageError::PreconditionFailed(e)
            | StorageError::Throttled(e)
            | StorageError::Remote(e) => Some(e),
            StorageError::Cancelled | StorageError::Entity(_) => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.remote().and_then(RemoteFailure::status_code)
    }

    pub fn error_code(&self) -> Option<&str> {
        self.remote().and_then(RemoteFailure::error_code)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::Cancelled;

    #[test]
    fn status_codes_map_to_variants() {
        let e = StorageError::from(RemoteError::with_status(404, "BlobNotFound", "x"));
        assert!(e.is_not_found());
        assert_eq!(e.error_code(), Some("BlobNotFound"));

        let e = StorageError::from(RemoteError::with_status(409, "ContainerAlreadyExists", "x"));
        assert!(matches!(e, StorageError::AlreadyExists(_)));

        let e =
            StorageError::from(RemoteError::with_status(412, "UpdateConditionNotSatisfied", "x"));
        assert!(matches!(e, StorageError::PreconditionFailed(_)));

        let e = StorageError::from(RemoteError::with_status(503, "ServerBusy", "x"));
        assert!(matches!(e, StorageError::Throttled(_)));
        assert_eq!(e.status_code(), Some(503));

        let e = StorageError::from(RemoteError::with_status(500, "InternalError", "x"));
        assert!(matches!(e, StorageError::Remote(_)));
    }

    #[test]
    fn cancellation_maps_to_cancelled() {
        let e = StorageError::from(RemoteError::from(Cancelled));
        assert!(matches!(e, StorageError::Cancelled));
        assert_eq!(e.status_code(), None);
    }
}
