//! Error types for the sync engine.

use crate::classify::FailureClass;
use liftsync_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The backend rejected the caller's credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The backend failed to process the request.
    #[error("server error: {0}")]
    Server(String),

    /// Durable store error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Persisted or wire data could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// Another drain holds the single-flight guard.
    #[error("a drain is already in progress")]
    DrainInProgress,

    /// A blocking drain task panicked or was cancelled.
    #[error("drain task failed: {0}")]
    TaskFailed(String),
}

impl SyncError {
    /// Builds the error for a backend failure message.
    pub fn from_backend_message(message: impl Into<String>) -> Self {
        let message = message.into();
        match FailureClass::classify(&message) {
            FailureClass::Authentication => Self::Authentication(message),
            FailureClass::Network => Self::Network(message),
            FailureClass::Server => Self::Server(message),
        }
    }

    /// The failure class for backend errors.
    pub fn class(&self) -> Option<FailureClass> {
        match self {
            SyncError::Authentication(_) => Some(FailureClass::Authentication),
            SyncError::Network(_) => Some(FailureClass::Network),
            SyncError::Server(_) => Some(FailureClass::Server),
            _ => None,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Network(_) | SyncError::Server(_) | SyncError::DrainInProgress
        )
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self.class() {
            Some(class) => class.user_message().to_string(),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_messages_are_classified() {
        assert!(matches!(
            SyncError::from_backend_message("JWT expired"),
            SyncError::Authentication(_)
        ));
        assert!(matches!(
            SyncError::from_backend_message("Network request failed"),
            SyncError::Network(_)
        ));
        assert!(matches!(
            SyncError::from_backend_message("duplicate key value"),
            SyncError::Server(_)
        ));
    }

    #[test]
    fn retryable_errors() {
        assert!(SyncError::Network("offline".into()).is_retryable());
        assert!(SyncError::Server("500".into()).is_retryable());
        assert!(!SyncError::Authentication("401".into()).is_retryable());
        assert!(!SyncError::Codec("bad json".into()).is_retryable());
    }

    #[test]
    fn user_messages() {
        assert_eq!(
            SyncError::Authentication("jwt expired".into()).user_message(),
            "Please sign in again."
        );
        assert_eq!(SyncError::Network("timeout".into()).user_message(), "No connection.");
        assert_eq!(
            SyncError::DrainInProgress.user_message(),
            "a drain is already in progress"
        );
    }

    #[test]
    fn storage_errors_convert() {
        let err: SyncError = StorageError::WriteRejected("read-only".into()).into();
        assert!(err.to_string().contains("read-only"));
        assert_eq!(err.class(), None);
    }
}
