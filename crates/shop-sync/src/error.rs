//! # Session Error Types
//!
//! Error types for the session engine.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Validation     │  │ CommitRejected  │  │     Transport           │ │
//! │  │  (local, no     │  │ (server said    │  │  (no usable reply)      │ │
//! │  │   round-trip)   │  │  success:false) │  │                         │ │
//! │  │                 │  │                 │  │  channel closed         │ │
//! │  │  Core rules     │  │  optional msg   │  │  reply dropped          │ │
//! │  │  Input checks   │  │                 │  │  malformed reply        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Session      │  │      Protocol           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  NotPermitted   │  │  Serialization          │ │
//! │  │  ConfigLoad/    │  │  NoShop/NoDraft │  │                         │ │
//! │  │  ConfigSave     │  │  IndexOutOfRange│  │                         │ │
//! │  │                 │  │  NothingToSave  │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  None of these end the session. Retries are always user-initiated.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shop_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for session operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Every failure the session engine can report.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Local Validation
    // =========================================================================
    /// A business rule rejected the action before anything was sent.
    #[error("{0}")]
    Validation(#[from] CoreError),

    // =========================================================================
    // Server Responses
    // =========================================================================
    /// The server answered `success: false`.
    #[error("Save rejected: {}", .message.as_deref().unwrap_or("no reason given"))]
    CommitRejected { message: Option<String> },

    // =========================================================================
    // Transport
    // =========================================================================
    /// The request failed or came back without a usable result.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Failed to encode or decode a frame.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    // =========================================================================
    // Configuration
    // =========================================================================
    /// Invalid session configuration.
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Session State
    // =========================================================================
    /// A capability flag required for this action is missing.
    #[error("Not permitted: {0}")]
    NotPermitted(&'static str),

    /// The action needs a loaded shop snapshot.
    #[error("No shop is open")]
    NoShop,

    /// The action needs an active admin draft.
    #[error("No draft is being edited")]
    NoDraft,

    /// Save was requested for a draft with no unsaved changes.
    #[error("No unsaved changes")]
    NothingToSave,

    /// An edit named a list position that does not exist.
    #[error("{list} has no entry at index {index}")]
    IndexOutOfRange { list: &'static str, index: usize },
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for SyncError {
    fn from(err: ValidationError) -> Self {
        SyncError::Validation(CoreError::Validation(err))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for SyncError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        SyncError::Transport("channel closed".into())
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for SyncError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        SyncError::Transport("no reply".into())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// True for failures found locally, before any round-trip.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SyncError::Validation(_) | SyncError::IndexOutOfRange { .. }
        )
    }

    /// True when resubmitting after a correction (or simply again) may work.
    pub fn is_user_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Validation(_) | SyncError::CommitRejected { .. } | SyncError::Transport(_)
        )
    }

    /// Notification text for this error.
    ///
    /// A rejection with a server message shows that message; every other
    /// server or transport failure shows `generic`.
    pub fn user_message(&self, generic: &str) -> String {
        match self {
            SyncError::CommitRejected {
                message: Some(message),
            } if !message.trim().is_empty() => message.clone(),
            SyncError::CommitRejected { .. } | SyncError::Transport(_) | SyncError::Serialization(_) => {
                generic.to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        let err: SyncError = CoreError::NoVehicleSelected.into();
        assert!(err.is_validation());
        assert!(err.is_user_retryable());

        let err: SyncError = ValidationError::Required {
            field: "identifier".into(),
        }
        .into();
        assert!(err.is_validation());

        assert!(!SyncError::Transport("closed".into()).is_validation());
        assert!(!SyncError::NoDraft.is_user_retryable());
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = SyncError::CommitRejected {
            message: Some("Identifier taken".into()),
        };
        assert_eq!(err.user_message("Save failed"), "Identifier taken");

        let err = SyncError::CommitRejected { message: None };
        assert_eq!(err.user_message("Save failed"), "Save failed");

        let err = SyncError::Transport("no reply".into());
        assert_eq!(err.user_message("Save failed"), "Save failed");
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::IndexOutOfRange {
            list: "dropoffs",
            index: 4,
        };
        assert_eq!(err.to_string(), "dropoffs has no entry at index 4");
        let err: SyncError = CoreError::EmptyCart.into();
        assert_eq!(err.to_string(), "Cart is empty");
    }
}
