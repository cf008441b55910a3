//! Error types for the Focus timer.

use std::fmt::Display;

use thiserror::Error;

/// A shared error type for the entire Focus application.
///
/// State-machine errors are returned to the caller and never leave the
/// machine half-updated. Persistence and delivery errors are reported by the
/// components that own those concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FocusError {
    /// An operation was requested from a state that does not allow it.
    #[error("Invalid transition: cannot {operation} while {state}")]
    InvalidTransition { operation: String, state: String },

    /// The durable store cannot be read or written (quota, disabled, I/O).
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// The remote collector could not accept a session record.
    #[error("Delivery failed after {attempts} attempt(s): {message}")]
    DeliveryFailed { attempts: u32, message: String },

    /// The stored snapshot belongs to a different task or user.
    #[error("Stale snapshot: stored task '{stored_task}' does not match '{page_task}'")]
    StaleSnapshot {
        stored_task: String,
        page_task: String,
    },

    /// Another task already owns the single session slot.
    #[error("A session for '{task_name}' is already active")]
    ActiveElsewhere { task_name: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", "TOML", ...
        message: String,
    },

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FocusError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidTransition error.
    pub fn invalid_transition(operation: impl Into<String>, state: impl Display) -> Self {
        Self::InvalidTransition {
            operation: operation.into(),
            state: state.to_string(),
        }
    }

    /// Creates a PersistenceUnavailable error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceUnavailable(message.into())
    }

    /// Creates a DeliveryFailed error.
    pub fn delivery_failed(attempts: u32, message: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            attempts,
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }

    pub fn is_persistence_unavailable(&self) -> bool {
        matches!(self, Self::PersistenceUnavailable(_))
    }

    pub fn is_delivery_failed(&self) -> bool {
        matches!(self, Self::DeliveryFailed { .. })
    }

    /// Check if the stored data could not be decoded.
    ///
    /// Returns true for serialization and migration errors, i.e. the bytes
    /// were read but do not form a usable snapshot.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::Serialization { .. } | Self::Migration(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for FocusError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for FocusError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for FocusError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for FocusError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<version_migrate::MigrationError> for FocusError {
    fn from(err: version_migrate::MigrationError) -> Self {
        Self::Migration(err.to_string())
    }
}

/// A type alias for `Result<T, FocusError>`.
pub type Result<T> = std::result::Result<T, FocusError>;
