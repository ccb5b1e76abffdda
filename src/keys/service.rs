//! Key service
//!
//! Stores and retrieves key records per target and drives the key manager
//! for enable, unlock and rotate.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::manager::{GeneratedKey, KeyManager};
use crate::crypto::{DataKey, SecureString};
use crate::error::{LedgerLockError, LedgerLockResult};
use crate::models::{EncryptionKeyRecord, KeyId, KeyTarget, KeyType};
use crate::storage::Storage;

/// Public view of a target's key, safe to display
#[derive(Debug, Clone, Serialize)]
pub struct KeyStatus {
    pub target: KeyTarget,
    pub key_type: KeyType,
    pub version: u32,
    pub public_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub rotated_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<&EncryptionKeyRecord> for KeyStatus {
    fn from(record: &EncryptionKeyRecord) -> Self {
        Self {
            target: record.target.clone(),
            key_type: record.key_type,
            version: record.version,
            public_key: record.public_key.clone(),
            created_at: record.created_at,
            rotated_at: record.rotated_at,
            last_used_at: record.last_used_at,
        }
    }
}

/// Service for per-target key management
pub struct KeyService<'a> {
    storage: &'a Storage,
    manager: KeyManager,
}

impl<'a> KeyService<'a> {
    pub fn new(storage: &'a Storage, manager: KeyManager) -> Self {
        Self { storage, manager }
    }

    pub fn get(&self, target: &KeyTarget) -> LedgerLockResult<Option<EncryptionKeyRecord>> {
        self.storage.keys.get(target)
    }

    fn require(&self, target: &KeyTarget) -> LedgerLockResult<EncryptionKeyRecord> {
        self.get(target)?
            .ok_or_else(|| LedgerLockError::key_not_found(target.to_string()))
    }

    /// Turn on encryption for a target
    ///
    /// Returns the stored record and the user secret, which is never stored
    /// and must be shown to the user now.
    pub fn enable(
        &self,
        target: KeyTarget,
        key_type: KeyType,
        passphrase: Option<&str>,
    ) -> LedgerLockResult<(EncryptionKeyRecord, SecureString)> {
        if self.get(&target)?.is_some() {
            return Err(LedgerLockError::Duplicate {
                entity_type: "Encryption key",
                identifier: target.to_string(),
            });
        }

        let generated = self.manager.generate(key_type, passphrase)?;
        let (record, user_secret) = new_record(target, generated);

        self.storage.keys.insert_new(record.clone())?;
        self.storage.keys.save()?;

        tracing::info!(target = %record.target, key_type = %record.key_type, "encryption enabled");
        Ok((record, user_secret))
    }

    /// Unwrap a target's DEK with the user's secret
    ///
    /// Only `last_used_at` is written back; the wrapped DEK and version on
    /// the stored record are never replaced by an unlock.
    pub fn unlock(&self, target: &KeyTarget, user_secret: &str) -> LedgerLockResult<DataKey> {
        let record = self.require(target)?;
        let dek = self.manager.unwrap_record(&record, user_secret)?;

        self.storage.keys.touch(target)?;
        self.storage.keys.save()?;

        tracing::debug!(target = %target, "unlocked data encryption key");
        Ok(dek)
    }

    /// Re-wrap a target's DEK under a new secret
    pub fn rotate(
        &self,
        target: &KeyTarget,
        old_secret: &str,
        new_key_type: KeyType,
        new_passphrase: Option<&str>,
    ) -> LedgerLockResult<(EncryptionKeyRecord, SecureString)> {
        let existing = self.require(target)?;
        self.rotate_record(existing, old_secret, new_key_type, new_passphrase)
    }

    /// Rotate by key id instead of target
    pub fn rotate_by_id(
        &self,
        id: KeyId,
        old_secret: &str,
        new_key_type: KeyType,
        new_passphrase: Option<&str>,
    ) -> LedgerLockResult<(EncryptionKeyRecord, SecureString)> {
        let existing = self
            .storage
            .keys
            .get_by_id(id)?
            .ok_or_else(|| LedgerLockError::key_not_found(id.to_string()))?;
        self.rotate_record(existing, old_secret, new_key_type, new_passphrase)
    }

    /// Fails with `Conflict` if another rotation landed after `existing` was read
    fn rotate_record(
        &self,
        existing: EncryptionKeyRecord,
        old_secret: &str,
        new_key_type: KeyType,
        new_passphrase: Option<&str>,
    ) -> LedgerLockResult<(EncryptionKeyRecord, SecureString)> {
        let generated = self
            .manager
            .rotate(&existing, old_secret, new_key_type, new_passphrase)?;

        let now = Utc::now();
        let expected_version = existing.version;
        let record = EncryptionKeyRecord {
            key_type: generated.key_type,
            wrapped_dek: generated.wrapped_dek,
            verification_hash: Some(generated.verification_hash),
            public_key: generated.public_key,
            derivation_params: generated.derivation_params,
            version: existing.version.saturating_add(1),
            rotated_at: Some(now),
            last_used_at: Some(now),
            ..existing
        };

        self.storage.keys.update(record.clone(), expected_version)?;
        self.storage.keys.save()?;

        tracing::info!(
            target = %record.target,
            key_type = %record.key_type,
            version = record.version,
            "key rotated"
        );
        Ok((record, generated.user_secret))
    }

    /// Display-safe status for a target, if it has a key
    pub fn status(&self, target: &KeyTarget) -> LedgerLockResult<Option<KeyStatus>> {
        Ok(self.get(target)?.as_ref().map(KeyStatus::from))
    }

    pub fn list(&self) -> LedgerLockResult<Vec<KeyStatus>> {
        Ok(self
            .storage
            .keys
            .get_all()?
            .iter()
            .map(KeyStatus::from)
            .collect())
    }
}

fn new_record(target: KeyTarget, generated: GeneratedKey) -> (EncryptionKeyRecord, SecureString) {
    let record = EncryptionKeyRecord {
        id: KeyId::new(),
        target,
        key_type: generated.key_type,
        wrapped_dek: generated.wrapped_dek,
        verification_hash: Some(generated.verification_hash),
        public_key: generated.public_key,
        derivation_params: generated.derivation_params,
        version: 1,
        created_at: Utc::now(),
        rotated_at: None,
        last_used_at: None,
    };
    (record, generated.user_secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{decrypt_field, encrypt_field};
    use crate::config::LedgerLockPaths;
    use crate::crypto::ScryptCost;
    use crate::keys::KeyManagerConfig;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerLockPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths, Duration::from_secs(2)).unwrap();
        (temp_dir, storage)
    }

    fn manager() -> KeyManager {
        KeyManager::new(KeyManagerConfig {
            scrypt: ScryptCost {
                log_n: 10,
                r: 8,
                p: 1,
            },
            derivation_timeout: Duration::from_secs(30),
        })
    }

    #[test]
    fn test_enable_once_per_target() {
        let (_temp_dir, storage) = create_test_storage();
        let service = KeyService::new(&storage, manager());
        let target = KeyTarget::account("acc-1");

        let (record, secret) = service.enable(target.clone(), KeyType::Token, None).unwrap();
        assert_eq!(record.version, 1);
        assert!(secret.starts_with("llk_"));
        assert!(!record.wrapped_dek.contains(secret.as_str()));

        let err = service.enable(target, KeyType::Token, None).unwrap_err();
        assert!(matches!(err, LedgerLockError::Duplicate { .. }));
    }

    #[test]
    fn test_unlock_touches_record() {
        let (_temp_dir, storage) = create_test_storage();
        let service = KeyService::new(&storage, manager());
        let target = KeyTarget::workspace("ws-1");

        let (_, secret) = service
            .enable(target.clone(), KeyType::Passphrase, Some("a long passphrase"))
            .unwrap();
        service.unlock(&target, &secret).unwrap();

        let status = service.status(&target).unwrap().unwrap();
        assert!(status.last_used_at.is_some());
        assert_eq!(status.key_type, KeyType::Passphrase);

        assert!(service
            .unlock(&target, "not the passphrase")
            .unwrap_err()
            .is_authentication_failure());
    }

    #[test]
    fn test_unlock_missing_target() {
        let (_temp_dir, storage) = create_test_storage();
        let service = KeyService::new(&storage, manager());
        assert!(service
            .unlock(&KeyTarget::account("nope"), "secret")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_rotate_bumps_version_and_keeps_data() {
        let (_temp_dir, storage) = create_test_storage();
        let service = KeyService::new(&storage, manager());
        let target = KeyTarget::account("acc-1");

        let (original, token) = service.enable(target.clone(), KeyType::Token, None).unwrap();
        let dek = service.unlock(&target, &token).unwrap();
        let ciphertext = encrypt_field("000123456789", &dek).unwrap();

        let (rotated, private_key) = service
            .rotate(&target, &token, KeyType::Keypair, None)
            .unwrap();
        assert_eq!(rotated.id, original.id);
        assert_eq!(rotated.version, 2);
        assert!(rotated.rotated_at.is_some());
        assert!(rotated.public_key.is_some());

        let dek = service.unlock(&target, &private_key).unwrap();
        assert_eq!(decrypt_field(&ciphertext, &dek).unwrap(), "000123456789");
        assert!(service.unlock(&target, &token).is_err());
    }

    #[test]
    fn test_rotate_by_id() {
        let (_temp_dir, storage) = create_test_storage();
        let service = KeyService::new(&storage, manager());
        let (record, token) = service
            .enable(KeyTarget::account("acc-1"), KeyType::Token, None)
            .unwrap();

        let (rotated, _) = service
            .rotate_by_id(record.id, &token, KeyType::Token, None)
            .unwrap();
        assert_eq!(rotated.version, 2);
        assert!(service
            .rotate_by_id(KeyId::new(), &token, KeyType::Token, None)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_unlock_during_rotation_keeps_rotated_record() {
        let (_temp_dir, storage) = create_test_storage();
        let service = KeyService::new(&storage, manager());
        let target = KeyTarget::workspace("ws-1");
        let old = "the original passphrase";
        service
            .enable(target.clone(), KeyType::Passphrase, Some(old))
            .unwrap();

        let start = Barrier::new(2);
        let (rotated, new_token) = thread::scope(|scope| {
            let rotation = scope.spawn(|| {
                start.wait();
                service.rotate(&target, old, KeyType::Token, None).unwrap()
            });
            scope.spawn(|| {
                start.wait();
                // Either side of the rotation is fine; only the old secret is offered
                let _ = service.unlock(&target, old);
            });
            rotation.join().unwrap()
        });

        let stored = service.get(&target).unwrap().unwrap();
        assert_eq!(rotated.version, 2);
        assert_eq!(stored.version, 2);
        assert_eq!(stored.key_type, KeyType::Token);
        assert_eq!(stored.wrapped_dek, rotated.wrapped_dek);
        assert!(service.unlock(&target, &new_token).is_ok());
        assert!(service.unlock(&target, old).is_err());
    }

    #[test]
    fn test_overlapping_rotations_do_not_both_win() {
        let (_temp_dir, storage) = create_test_storage();
        let service = KeyService::new(&storage, manager());
        let target = KeyTarget::account("acc-1");
        let (_, token) = service.enable(target.clone(), KeyType::Token, None).unwrap();

        let start = Barrier::new(2);
        let (start, service_ref, target_ref, token_ref) = (&start, &service, &target, &token);
        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    scope.spawn(move || {
                        start.wait();
                        service_ref.rotate(target_ref, token_ref, KeyType::Token, None)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        for loser in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(loser.is_conflict() || loser.is_authentication_failure());
        }

        let (record, secret) = winners[0];
        assert_eq!(service.get(&target).unwrap().unwrap().version, 2);
        assert_eq!(record.version, 2);
        assert!(service.unlock(&target, secret).is_ok());
    }

    #[test]
    fn test_stale_rotation_is_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let service = KeyService::new(&storage, manager());
        let target = KeyTarget::account("acc-1");
        let (_, token) = service.enable(target.clone(), KeyType::Token, None).unwrap();

        let stale = service.get(&target).unwrap().unwrap();
        let (_, newer) = service.rotate(&target, &token, KeyType::Token, None).unwrap();

        let err = service
            .rotate_record(stale, &token, KeyType::Token, None)
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(service.unlock(&target, &newer).is_ok());
        assert_eq!(service.get(&target).unwrap().unwrap().version, 2);
    }

    #[test]
    fn test_records_persist() {
        let (temp_dir, storage) = create_test_storage();
        let service = KeyService::new(&storage, manager());
        service
            .enable(KeyTarget::account("acc-1"), KeyType::Token, None)
            .unwrap();

        let paths = LedgerLockPaths::with_base_dir(temp_dir.path().to_path_buf());
        let reopened = Storage::open(paths, Duration::from_secs(2)).unwrap();
        assert_eq!(reopened.keys.count().unwrap(), 1);
    }
}
