//! AES-256-GCM encryption/decryption
//!
//! Authenticated encryption shared by DEK wrapping, field encryption and
//! provider credentials. A fresh random 16-byte IV is drawn for every call
//! and the authentication tag is kept detached so callers can lay out the
//! three parts in their own string formats.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use rand::RngCore;

use crate::error::{LedgerLockError, LedgerLockResult};

use super::secure_memory::KEY_LEN;

/// AES-256-GCM with a 128-bit IV
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Size of the IV in bytes
pub const IV_SIZE: usize = 16;

/// Size of the GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// The three parts of an AES-GCM encryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedParts {
    pub iv: [u8; IV_SIZE],
    pub tag: [u8; TAG_SIZE],
    pub ciphertext: Vec<u8>,
}

impl SealedParts {
    /// Assemble parts decoded from an external format, checking lengths
    pub fn from_decoded(iv: &[u8], tag: &[u8], ciphertext: Vec<u8>) -> LedgerLockResult<Self> {
        let iv: [u8; IV_SIZE] = iv.try_into().map_err(|_| {
            LedgerLockError::Format(format!(
                "Invalid IV size: expected {}, got {}",
                IV_SIZE,
                iv.len()
            ))
        })?;
        let tag: [u8; TAG_SIZE] = tag.try_into().map_err(|_| {
            LedgerLockError::Format(format!(
                "Invalid auth tag size: expected {}, got {}",
                TAG_SIZE,
                tag.len()
            ))
        })?;

        Ok(Self {
            iv,
            tag,
            ciphertext,
        })
    }

    /// `<ivHex>:<tagHex>:<ciphertextHex>`
    pub fn to_hex(&self) -> String {
        format!(
            "{}:{}:{}",
            hex::encode(self.iv),
            hex::encode(self.tag),
            hex::encode(&self.ciphertext)
        )
    }

    /// Parse the `to_hex` layout; `label` names the value in errors
    pub fn from_hex(value: &str, label: &str) -> LedgerLockResult<Self> {
        let segments: Vec<&str> = value.trim().split(':').collect();
        if segments.len() != 3 {
            return Err(LedgerLockError::Format(format!(
                "{} must have 3 segments, found {}",
                label,
                segments.len()
            )));
        }

        let decode = |part: &str, segment: &str| {
            hex::decode(segment)
                .map_err(|e| LedgerLockError::Format(format!("Invalid {} hex: {}", part, e)))
        };

        let iv = decode("IV", segments[0])?;
        let tag = decode("auth tag", segments[1])?;
        let ciphertext = decode("ciphertext", segments[2])?;
        if ciphertext.is_empty() {
            return Err(LedgerLockError::Format(format!("{} has no ciphertext", label)));
        }

        Self::from_decoded(&iv, &tag, ciphertext)
    }
}

fn cipher(key: &[u8; KEY_LEN]) -> LedgerLockResult<Aes256Gcm16> {
    Aes256Gcm16::new_from_slice(key)
        .map_err(|e| LedgerLockError::Encryption(format!("Failed to create cipher: {}", e)))
}

/// Encrypt plaintext under a 256-bit key
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> LedgerLockResult<SealedParts> {
    let cipher = cipher(key)?;

    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut buffer)
        .map_err(|e| LedgerLockError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(SealedParts {
        iv,
        tag: tag_bytes,
        ciphertext: buffer,
    })
}

/// Decrypt and authenticate
///
/// Any authentication failure is reported as `Tampered`: GCM cannot tell a
/// wrong key from modified bytes.
pub fn open(key: &[u8; KEY_LEN], parts: &SealedParts) -> LedgerLockResult<Vec<u8>> {
    let cipher = cipher(key)?;

    let mut buffer = parts.ciphertext.clone();
    cipher
        .decrypt_in_place_detached(
            Nonce::<U16>::from_slice(&parts.iv),
            b"",
            &mut buffer,
            Tag::<U16>::from_slice(&parts.tag),
        )
        .map_err(|_| {
            LedgerLockError::Tampered("invalid key or corrupted data".to_string())
        })?;

    Ok(buffer)
}
