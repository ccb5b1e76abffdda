//! User-held secrets
//!
//! Generation, shape checks, wrapping-key derivation and masked display for
//! the three secret kinds.
//!
//! The keypair kind is secret-backed, not asymmetric: the exported private
//! key is hashed into a symmetric wrapping key exactly like a token, and the
//! public key is kept only so users can recognise which key they hold.

use std::time::Duration;

use ed25519_dalek::SigningKey;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::crypto::{derive_scrypt, derive_sha256, run_with_timeout, SecureString, WrappingKey};
use crate::error::{LedgerLockError, LedgerLockResult};
use crate::models::{DerivationParams, KeyType};

/// Prefix on generated tokens so they are recognisable when pasted
pub const TOKEN_PREFIX: &str = "llk_";

/// Prefix on exported keypair private keys
pub const PRIVATE_KEY_PREFIX: &str = "llkp_";

/// Prefix on displayed public keys
pub const PUBLIC_KEY_PREFIX: &str = "ed25519:";

/// Random bytes in a token
const TOKEN_BYTES: usize = 32;

/// Minimum accepted passphrase length
pub const MIN_PASSPHRASE_LEN: usize = 8;

/// Generate a random token secret
pub fn generate_token() -> SecureString {
    let mut bytes = Zeroizing::new([0u8; TOKEN_BYTES]);
    rand::rngs::OsRng.fill_bytes(bytes.as_mut_slice());
    let encoded = Zeroizing::new(hex::encode(bytes.as_slice()));
    SecureString::new(format!("{}{}", TOKEN_PREFIX, encoded.as_str()))
}

/// Generate an Ed25519 keypair; returns (exported private key, public key)
pub fn generate_keypair() -> (SecureString, String) {
    let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
    let seed = Zeroizing::new(signing_key.to_bytes());
    let encoded = Zeroizing::new(hex::encode(seed.as_slice()));

    let private_key = SecureString::new(format!("{}{}", PRIVATE_KEY_PREFIX, encoded.as_str()));
    let public_key = format!(
        "{}{}",
        PUBLIC_KEY_PREFIX,
        hex::encode(signing_key.verifying_key().to_bytes())
    );

    (private_key, public_key)
}

/// Public key belonging to an exported private key, if it parses
pub fn public_key_for(private_key: &str) -> Option<String> {
    let hex_part = private_key.trim().strip_prefix(PRIVATE_KEY_PREFIX)?;
    let bytes = Zeroizing::new(hex::decode(hex_part).ok()?);
    let seed: Zeroizing<[u8; 32]> = Zeroizing::new(bytes.as_slice().try_into().ok()?);
    let signing_key = SigningKey::from_bytes(&seed);
    Some(format!(
        "{}{}",
        PUBLIC_KEY_PREFIX,
        hex::encode(signing_key.verifying_key().to_bytes())
    ))
}

/// Reject secrets that cannot possibly belong to `key_type`
///
/// A malformed secret is reported as an incorrect key, the same as a
/// well-formed secret that fails verification.
pub fn check_secret_shape(key_type: KeyType, secret: &str) -> LedgerLockResult<()> {
    let ok = match key_type {
        KeyType::Token => secret
            .strip_prefix(TOKEN_PREFIX)
            .map(|rest| rest.len() == TOKEN_BYTES * 2 && rest.bytes().all(|b| b.is_ascii_hexdigit()))
            .unwrap_or(false),
        KeyType::Passphrase => !secret.is_empty(),
        KeyType::Keypair => public_key_for(secret).is_some(),
    };

    if ok {
        Ok(())
    } else {
        Err(LedgerLockError::IncorrectKey)
    }
}

/// Validate a new passphrase before it protects anything
pub fn validate_new_passphrase(passphrase: &str) -> LedgerLockResult<()> {
    if passphrase.trim().is_empty() || passphrase.chars().count() < MIN_PASSPHRASE_LEN {
        return Err(LedgerLockError::Validation(format!(
            "Passphrase must be at least {} characters",
            MIN_PASSPHRASE_LEN
        )));
    }
    Ok(())
}

/// Derive the wrapping key for a secret of the given type
///
/// Passphrases require their stored scrypt parameters and run under the
/// derivation timeout.
pub fn derive_wrapping_key(
    key_type: KeyType,
    secret: &SecureString,
    params: Option<&DerivationParams>,
    timeout: Duration,
) -> LedgerLockResult<WrappingKey> {
    match key_type {
        KeyType::Token => Ok(derive_sha256(secret.as_bytes())),
        KeyType::Keypair => Ok(derive_sha256(secret.trim().as_bytes())),
        KeyType::Passphrase => {
            let params = params.cloned().ok_or_else(|| {
                LedgerLockError::KeyConfig(
                    "Passphrase keys require stored derivation parameters".to_string(),
                )
            })?;
            let secret = secret.clone();
            run_with_timeout("key derivation", timeout, move || {
                derive_scrypt(secret.as_bytes(), &params)
            })
        }
    }
}

/// Display form of a secret that never reveals it
pub fn mask_secret(key_type: KeyType, secret: &str) -> String {
    match key_type {
        KeyType::Token => {
            let chars: Vec<char> = secret.chars().collect();
            if chars.len() <= 8 {
                "*".repeat(chars.len())
            } else {
                let head: String = chars[..4].iter().collect();
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("{}...{}", head, tail)
            }
        }
        KeyType::Passphrase => "••••••••".to_string(),
        KeyType::Keypair => "[private key - keep it safe]".to_string(),
    }
}
