//! Key derivation
//!
//! Turns user secrets into wrapping keys:
//!
//! - scrypt for passphrases (memory-hard, stored salt and cost)
//! - SHA-256 for high-entropy secrets (tokens, exported private keys)
//! - Argon2id for the provider-credential master key
//!
//! The memory-hard paths run on a worker thread bounded by a timeout.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use argon2::{Argon2, Params};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{LedgerLockError, LedgerLockResult};
use crate::models::DerivationParams;

use super::secure_memory::{WrappingKey, KEY_LEN};

/// Salt length for scrypt and argon2 derivations
pub const SALT_LEN: usize = 16;

/// scrypt cost settings for newly created passphrase keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptCost {
    /// log2(N); N = 32768 by default
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
}

impl Default for ScryptCost {
    fn default() -> Self {
        Self {
            log_n: 15,
            r: 8,
            p: 1,
        }
    }
}

impl ScryptCost {
    /// Below this, derivation still works but a warning is logged
    const RECOMMENDED_LOG_N: u8 = 14;

    /// Create fresh derivation params with a random salt
    pub fn new_params(&self) -> DerivationParams {
        let mut salt = [0u8; SALT_LEN];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        DerivationParams {
            salt: hex::encode(salt),
            log_n: self.log_n,
            r: self.r,
            p: self.p,
        }
    }
}

/// Derive a wrapping key from a passphrase with scrypt
pub fn derive_scrypt(passphrase: &[u8], params: &DerivationParams) -> LedgerLockResult<WrappingKey> {
    let salt = hex::decode(&params.salt)
        .map_err(|e| LedgerLockError::KeyConfig(format!("Invalid salt encoding: {}", e)))?;
    if salt.is_empty() {
        return Err(LedgerLockError::KeyConfig("Empty scrypt salt".to_string()));
    }

    if params.log_n < ScryptCost::RECOMMENDED_LOG_N {
        tracing::warn!(log_n = params.log_n, "scrypt cost below recommended minimum");
    }

    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_LEN)
        .map_err(|e| LedgerLockError::KeyConfig(format!("Invalid scrypt parameters: {}", e)))?;

    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(passphrase, &salt, &scrypt_params, &mut out[..])
        .map_err(|e| LedgerLockError::Encryption(format!("Key derivation failed: {}", e)))?;

    Ok(WrappingKey::from_bytes(*out))
}

/// Derive a wrapping key from a high-entropy secret with a single SHA-256
pub fn derive_sha256(secret: &[u8]) -> WrappingKey {
    let digest = Sha256::digest(secret);
    let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
    bytes.copy_from_slice(&digest);
    WrappingKey::from_bytes(*bytes)
}

/// Argon2id settings for the credential master key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Cost {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism degree (default: 4)
    pub parallelism: u32,
}

impl Default for Argon2Cost {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Derive a key from a master secret with Argon2id
pub fn derive_argon2(secret: &[u8], salt: &[u8], cost: &Argon2Cost) -> LedgerLockResult<WrappingKey> {
    let params = Params::new(cost.memory_cost, cost.time_cost, cost.parallelism, Some(KEY_LEN))
        .map_err(|e| LedgerLockError::KeyConfig(format!("Invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(secret, salt, &mut out[..])
        .map_err(|e| LedgerLockError::Encryption(format!("Key derivation failed: {}", e)))?;

    Ok(WrappingKey::from_bytes(*out))
}

/// Run a CPU-heavy derivation on a worker thread, bounded by `limit`
///
/// On timeout the worker is detached; it finishes on its own and its result
/// is dropped (and zeroized) when the channel send fails.
pub fn run_with_timeout<T, F>(operation: &'static str, limit: Duration, f: F) -> LedgerLockResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> LedgerLockResult<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name(format!("ledgerlock-{}", operation.replace(' ', "-")))
        .spawn(move || {
            let _ = tx.send(f());
        })
        .map_err(|e| LedgerLockError::Encryption(format!("Failed to spawn {}: {}", operation, e)))?;

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(operation, limit_ms = limit.as_millis() as u64, "operation timed out");
            Err(LedgerLockError::Timeout {
                operation,
                limit_ms: limit.as_millis() as u64,
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(LedgerLockError::Encryption(format!(
            "{} worker exited without a result",
            operation
        ))),
    }
}
