//! Cryptographic primitives for LedgerLock
//!
//! AES-256-GCM with detached tags, scrypt/SHA-256/Argon2id key derivation,
//! HMAC-SHA256, and zeroizing containers for secrets and raw keys.

pub mod encryption;
pub mod key_derivation;
pub mod mac;
pub mod secure_memory;

pub use encryption::{open, seal, SealedParts, IV_SIZE, TAG_SIZE};
pub use key_derivation::{
    derive_argon2, derive_scrypt, derive_sha256, run_with_timeout, Argon2Cost, ScryptCost,
};
pub use mac::{hmac_sha256_hex, verify_hmac_sha256_hex};
pub use secure_memory::{DataKey, SecureString, WrappingKey, KEY_LEN};
