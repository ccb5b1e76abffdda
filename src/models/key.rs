//! Encryption key record model
//!
//! One record exists per protected target. It holds the wrapped DEK and the
//! public metadata needed to unwrap it again, never the user secret itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::KeyId;
use crate::error::LedgerLockError;

/// The kind of user-held secret protecting a DEK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Random high-entropy token shown to the user once
    Token,
    /// User-chosen passphrase stretched with scrypt
    Passphrase,
    /// Generated Ed25519 keypair; the private key acts as the secret
    Keypair,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Token => write!(f, "token"),
            KeyType::Passphrase => write!(f, "passphrase"),
            KeyType::Keypair => write!(f, "keypair"),
        }
    }
}

impl FromStr for KeyType {
    type Err = LedgerLockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "token" => Ok(KeyType::Token),
            "passphrase" => Ok(KeyType::Passphrase),
            "keypair" => Ok(KeyType::Keypair),
            other => Err(LedgerLockError::KeyConfig(format!(
                "Unknown key type: {}",
                other
            ))),
        }
    }
}

/// The kind of entity a key protects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    User,
    Workspace,
    Account,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::User => write!(f, "user"),
            TargetType::Workspace => write!(f, "workspace"),
            TargetType::Account => write!(f, "account"),
        }
    }
}

impl FromStr for TargetType {
    type Err = LedgerLockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(TargetType::User),
            "workspace" => Ok(TargetType::Workspace),
            "account" => Ok(TargetType::Account),
            other => Err(LedgerLockError::Validation(format!(
                "Unknown target type: {}",
                other
            ))),
        }
    }
}

/// Identifies the entity a key record protects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyTarget {
    pub target_type: TargetType,
    pub target_id: String,
}

impl KeyTarget {
    pub fn new(target_type: TargetType, target_id: impl Into<String>) -> Self {
        Self {
            target_type,
            target_id: target_id.into(),
        }
    }

    pub fn account(id: impl Into<String>) -> Self {
        Self::new(TargetType::Account, id)
    }

    pub fn workspace(id: impl Into<String>) -> Self {
        Self::new(TargetType::Workspace, id)
    }
}

impl fmt::Display for KeyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.target_type, self.target_id)
    }
}

/// scrypt inputs stored alongside a passphrase-protected key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationParams {
    /// Random salt (hex encoded)
    pub salt: String,
    /// log2 of the scrypt CPU/memory cost N
    pub log_n: u8,
    /// scrypt block size
    pub r: u32,
    /// scrypt parallelization
    pub p: u32,
}

/// Stored key material for one protected target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionKeyRecord {
    pub id: KeyId,
    pub target: KeyTarget,
    pub key_type: KeyType,

    /// `<ivHex>:<authTagHex>:<encryptedDekHex>`
    pub wrapped_dek: String,

    /// HMAC-SHA256 of the DEK keyed by the user secret (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_hash: Option<String>,

    /// Public half of a keypair key, for display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation_params: Option<DerivationParams>,

    pub version: u32,
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl EncryptionKeyRecord {
    /// Record a successful unlock
    pub fn touch(&mut self) {
        self.last_used_at = Some(Utc::now());
    }
}
