//! Single-value field encryption
//!
//! Encrypted values are self-describing strings:
//!
//! ```text
//! enc:v1:<ivBase64>:<authTagBase64>:<ciphertextBase64>
//! ```
//!
//! Anything without the `enc:v` prefix is treated as a legacy plaintext
//! value and passes through decryption untouched.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::crypto::{hmac_sha256_hex, open, seal, DataKey, SealedParts};
use crate::error::{LedgerLockError, LedgerLockResult};

/// Prefix shared by every encrypted field value
pub const ENCRYPTED_PREFIX: &str = "enc:v";

/// Current field format version
pub const FIELD_FORMAT_VERSION: u32 = 1;

/// Check whether a value carries the encrypted-field prefix
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_PREFIX)
}

/// Check whether a value is a complete `enc:v1` field, not just prefixed
///
/// Plaintext such as `enc:vacation fund` starts with the prefix but does not
/// parse, so it still needs encrypting.
pub fn is_field_ciphertext(value: &str) -> bool {
    is_encrypted(value) && parse_field(value).is_ok()
}

/// Encrypt a single field value
pub fn encrypt_field(plaintext: &str, dek: &DataKey) -> LedgerLockResult<String> {
    let parts = seal(dek.as_bytes(), plaintext.as_bytes())?;
    Ok(format!(
        "{}{}:{}:{}:{}",
        ENCRYPTED_PREFIX,
        FIELD_FORMAT_VERSION,
        STANDARD.encode(parts.iv),
        STANDARD.encode(parts.tag),
        STANDARD.encode(&parts.ciphertext)
    ))
}

/// Decrypt a single field value, passing unencrypted values through
pub fn decrypt_field(value: &str, dek: &DataKey) -> LedgerLockResult<String> {
    if !is_encrypted(value) {
        return Ok(value.to_string());
    }

    let parts = parse_field(value)?;
    let plaintext = open(dek.as_bytes(), &parts)?;

    String::from_utf8(plaintext)
        .map_err(|e| LedgerLockError::Format(format!("Decrypted field is not UTF-8: {}", e)))
}

fn parse_field(value: &str) -> LedgerLockResult<SealedParts> {
    let body = &value[ENCRYPTED_PREFIX.len()..];
    let segments: Vec<&str> = body.split(':').collect();
    if segments.len() != 4 {
        return Err(LedgerLockError::Format(format!(
            "Encrypted field must have 4 segments after the prefix, found {}",
            segments.len()
        )));
    }

    let version: u32 = segments[0].parse().map_err(|_| {
        LedgerLockError::Format(format!("Invalid encrypted field version: {}", segments[0]))
    })?;
    if version != FIELD_FORMAT_VERSION {
        return Err(LedgerLockError::Format(format!(
            "Unsupported encrypted field version: {}",
            version
        )));
    }

    let decode = |label: &str, segment: &str| {
        STANDARD.decode(segment).map_err(|e| {
            LedgerLockError::Format(format!("Invalid {} encoding: {}", label, e))
        })
    };

    let iv = decode("IV", segments[1])?;
    let tag = decode("auth tag", segments[2])?;
    let ciphertext = decode("ciphertext", segments[3])?;

    SealedParts::from_decoded(&iv, &tag, ciphertext)
}

/// Normalize a value for blind indexing: trimmed, lowercased, single spaces
pub fn normalize_for_index(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Deterministic keyed hash for exact-match lookup on encrypted columns
pub fn create_blind_index(value: &str, dek: &DataKey) -> LedgerLockResult<String> {
    hmac_sha256_hex(dek.as_bytes(), normalize_for_index(value).as_bytes())
}
