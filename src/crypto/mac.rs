//! HMAC-SHA256 helpers
//!
//! Used for DEK verification hashes and blind indexes.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{LedgerLockError, LedgerLockResult};

type HmacSha256 = Hmac<Sha256>;

fn mac(key: &[u8], data: &[u8]) -> LedgerLockResult<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| LedgerLockError::Encryption(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac)
}

/// HMAC-SHA256 of `data` keyed by `key`, hex encoded
pub fn hmac_sha256_hex(key: &[u8], data: &[u8]) -> LedgerLockResult<String> {
    Ok(hex::encode(mac(key, data)?.finalize().into_bytes()))
}

/// Constant-time check of a hex HMAC
///
/// A malformed expected value simply fails verification.
pub fn verify_hmac_sha256_hex(key: &[u8], data: &[u8], expected_hex: &str) -> LedgerLockResult<bool> {
    let expected = match hex::decode(expected_hex) {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };
    Ok(mac(key, data)?.verify_slice(&expected).is_ok())
}
