//! Custom error types for LedgerLock
//!
//! This module defines the error hierarchy for the library using thiserror.
//! Cryptographic integrity failures get their own variants so callers can
//! tell a wrong secret apart from tampered data, and both apart from a value
//! that simply was never encrypted (which is not an error at all).

use thiserror::Error;

/// The main error type for LedgerLock operations
#[derive(Error, Debug)]
pub enum LedgerLockError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for inputs and models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// A stored record changed between read and write
    #[error("{entity_type} {identifier} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        entity_type: &'static str,
        identifier: String,
        expected: u32,
        found: u32,
    },

    /// Malformed wrapped key, encrypted field or key material
    #[error("Format error: {0}")]
    Format(String),

    /// AES-GCM authentication failed (wrong key or modified ciphertext)
    #[error("Authentication failed: {0}")]
    Tampered(String),

    /// The supplied secret does not match the stored verification hash
    #[error("Incorrect key: the supplied secret does not unlock this data")]
    IncorrectKey,

    /// Unknown key type or missing derivation inputs
    #[error("Key configuration error: {0}")]
    KeyConfig(String),

    /// An operation exceeded its time budget
    #[error("{operation} timed out after {limit_ms} ms")]
    Timeout {
        operation: &'static str,
        limit_ms: u64,
    },

    /// Generic encryption errors (cipher construction, encoding)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerLockError {
    /// Create a "not found" error for key records
    pub fn key_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Encryption key",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for trusted contexts
    pub fn context_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Trusted context",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if the error means the supplied key could not open the data
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Tampered(_) | Self::IncorrectKey)
    }
}

impl From<std::io::Error> for LedgerLockError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerLockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for LedgerLock operations
pub type LedgerLockResult<T> = Result<T, LedgerLockError>;
