//! Envelope key manager
//!
//! Generates DEKs, wraps them under a user secret, unwraps them again after
//! verifying the secret, and re-wraps them on rotation. The manager holds no
//! keys between calls; every raw DEK it returns is owned by the caller and
//! zeroized when dropped.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::secret::{
    check_secret_shape, derive_wrapping_key, generate_keypair, generate_token, public_key_for,
    validate_new_passphrase,
};
use super::wrap::{unwrap_dek, wrap_dek};
use crate::crypto::{hmac_sha256_hex, verify_hmac_sha256_hex, DataKey, ScryptCost, SecureString};
use crate::error::{LedgerLockError, LedgerLockResult};
use crate::models::{DerivationParams, EncryptionKeyRecord, KeyType};

/// Tunables for the key manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyManagerConfig {
    /// Cost used for new passphrase keys
    pub scrypt: ScryptCost,
    /// Upper bound on a single passphrase derivation
    pub derivation_timeout: Duration,
}

impl Default for KeyManagerConfig {
    fn default() -> Self {
        Self {
            scrypt: ScryptCost::default(),
            derivation_timeout: Duration::from_secs(10),
        }
    }
}

/// A freshly wrapped key bundle
///
/// `user_secret` is shown to the user once and never stored.
#[derive(Debug)]
pub struct GeneratedKey {
    pub key_type: KeyType,
    pub user_secret: SecureString,
    pub wrapped_dek: String,
    pub verification_hash: String,
    pub public_key: Option<String>,
    pub derivation_params: Option<DerivationParams>,
}

#[derive(Debug, Clone, Default)]
pub struct KeyManager {
    config: KeyManagerConfig,
}

impl KeyManager {
    pub fn new(config: KeyManagerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeyManagerConfig {
        &self.config
    }

    /// Generate a new DEK and wrap it under a new secret of `key_type`
    pub fn generate(
        &self,
        key_type: KeyType,
        passphrase: Option<&str>,
    ) -> LedgerLockResult<GeneratedKey> {
        let dek = DataKey::generate();
        let generated = self.wrap_with_new_secret(&dek, key_type, passphrase)?;
        tracing::debug!(%key_type, "generated data encryption key");
        Ok(generated)
    }

    /// Wrap an existing DEK under a brand-new secret
    fn wrap_with_new_secret(
        &self,
        dek: &DataKey,
        key_type: KeyType,
        passphrase: Option<&str>,
    ) -> LedgerLockResult<GeneratedKey> {
        let (user_secret, public_key, derivation_params) = match key_type {
            KeyType::Token => (generate_token(), None, None),
            KeyType::Passphrase => {
                let passphrase = passphrase.ok_or_else(|| {
                    LedgerLockError::KeyConfig("Passphrase keys require a passphrase".to_string())
                })?;
                validate_new_passphrase(passphrase)?;
                (
                    SecureString::new(passphrase),
                    None,
                    Some(self.config.scrypt.new_params()),
                )
            }
            KeyType::Keypair => {
                let (private_key, public_key) = generate_keypair();
                (private_key, Some(public_key), None)
            }
        };

        let wrapping_key = derive_wrapping_key(
            key_type,
            &user_secret,
            derivation_params.as_ref(),
            self.config.derivation_timeout,
        )?;
        let wrapped_dek = wrap_dek(dek, &wrapping_key)?;
        let verification_hash = hmac_sha256_hex(user_secret.as_bytes(), dek.as_bytes())?;

        Ok(GeneratedKey {
            key_type,
            user_secret,
            wrapped_dek,
            verification_hash,
            public_key,
            derivation_params,
        })
    }

    /// Recover the raw DEK from its wrapped form
    ///
    /// The secret is first checked for the shape its type requires, then
    /// used to unwrap, then checked against the verification hash. A
    /// missing verification hash is tolerated for records that predate it.
    pub fn unwrap(
        &self,
        user_secret: &str,
        key_type: KeyType,
        wrapped_dek: &str,
        derivation_params: Option<&DerivationParams>,
        verification_hash: Option<&str>,
    ) -> LedgerLockResult<DataKey> {
        // Passphrases are used exactly as typed; generated secrets tolerate
        // surrounding whitespace from copy and paste
        let user_secret = match key_type {
            KeyType::Passphrase => SecureString::new(user_secret),
            KeyType::Token | KeyType::Keypair => SecureString::new(user_secret.trim()),
        };
        check_secret_shape(key_type, &user_secret)?;

        let wrapping_key = derive_wrapping_key(
            key_type,
            &user_secret,
            derivation_params,
            self.config.derivation_timeout,
        )?;
        let dek = unwrap_dek(wrapped_dek, &wrapping_key)?;

        match verification_hash {
            Some(expected) => {
                if !verify_hmac_sha256_hex(user_secret.as_bytes(), dek.as_bytes(), expected)? {
                    tracing::warn!(%key_type, "verification hash mismatch on unwrap");
                    return Err(LedgerLockError::IncorrectKey);
                }
            }
            None => tracing::warn!(%key_type, "unwrapping key without verification hash"),
        }

        Ok(dek)
    }

    /// Unwrap using everything stored on a key record
    pub fn unwrap_record(
        &self,
        record: &EncryptionKeyRecord,
        user_secret: &str,
    ) -> LedgerLockResult<DataKey> {
        if let (KeyType::Keypair, Some(stored)) = (record.key_type, record.public_key.as_deref()) {
            if public_key_for(user_secret).as_deref() != Some(stored) {
                return Err(LedgerLockError::IncorrectKey);
            }
        }

        self.unwrap(
            user_secret,
            record.key_type,
            &record.wrapped_dek,
            record.derivation_params.as_ref(),
            record.verification_hash.as_deref(),
        )
    }

    /// Re-wrap a record's DEK under a new secret
    ///
    /// The DEK itself is unchanged, so data encrypted before rotation stays
    /// readable with the new secret.
    pub fn rotate(
        &self,
        record: &EncryptionKeyRecord,
        old_secret: &str,
        new_key_type: KeyType,
        new_passphrase: Option<&str>,
    ) -> LedgerLockResult<GeneratedKey> {
        let dek = self.unwrap_record(record, old_secret)?;
        let generated = self.wrap_with_new_secret(&dek, new_key_type, new_passphrase)?;
        tracing::debug!(
            from = %record.key_type,
            to = %new_key_type,
            "re-wrapped data encryption key"
        );
        Ok(generated)
    }
}
