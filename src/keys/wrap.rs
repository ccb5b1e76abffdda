//! Wrapped DEK format
//!
//! A wrapped DEK is stored as `<ivHex>:<authTagHex>:<encryptedDekHex>`,
//! produced by AES-256-GCM under a wrapping key derived from the user
//! secret.

use crate::crypto::{open, seal, DataKey, SealedParts, WrappingKey};
use crate::error::{LedgerLockError, LedgerLockResult};

/// Encrypt a DEK under a wrapping key
pub fn wrap_dek(dek: &DataKey, wrapping_key: &WrappingKey) -> LedgerLockResult<String> {
    Ok(seal(wrapping_key.as_bytes(), dek.as_bytes())?.to_hex())
}

/// Decrypt a wrapped DEK
///
/// Fails with `Format` on a malformed string and `Tampered` when the
/// wrapping key does not authenticate the ciphertext.
pub fn unwrap_dek(wrapped: &str, wrapping_key: &WrappingKey) -> LedgerLockResult<DataKey> {
    let parts = SealedParts::from_hex(wrapped, "Wrapped DEK")?;
    let plaintext = zeroize::Zeroizing::new(open(wrapping_key.as_bytes(), &parts)?);

    DataKey::from_slice(&plaintext).ok_or_else(|| {
        LedgerLockError::Format(format!(
            "Unwrapped DEK has invalid length: {}",
            plaintext.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_unwrap() {
        let dek = DataKey::generate();
        let wk = WrappingKey::from_bytes([1u8; 32]);
        let wrapped = wrap_dek(&dek, &wk).unwrap();

        let segments: Vec<&str> = wrapped.split(':').collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].len(), 32);
        assert_eq!(segments[1].len(), 32);
        assert_eq!(segments[2].len(), 64);

        let unwrapped = unwrap_dek(&wrapped, &wk).unwrap();
        assert_eq!(unwrapped.as_bytes(), dek.as_bytes());
    }

    #[test]
    fn test_wrong_wrapping_key() {
        let dek = DataKey::generate();
        let wrapped = wrap_dek(&dek, &WrappingKey::from_bytes([1u8; 32])).unwrap();
        let result = unwrap_dek(&wrapped, &WrappingKey::from_bytes([2u8; 32]));
        assert!(matches!(result, Err(LedgerLockError::Tampered(_))));
    }

    #[test]
    fn test_malformed_wrapped_dek() {
        let wk = WrappingKey::from_bytes([1u8; 32]);
        assert!(matches!(unwrap_dek("abc", &wk), Err(LedgerLockError::Format(_))));
        assert!(matches!(
            unwrap_dek("zz:zz:zz", &wk),
            Err(LedgerLockError::Format(_))
        ));
        assert!(matches!(
            unwrap_dek(&format!("{}:{}:", "00".repeat(16), "00".repeat(16)), &wk),
            Err(LedgerLockError::Format(_))
        ));
    }
}
