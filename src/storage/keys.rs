//! Key repository for JSON storage
//!
//! Manages loading and saving wrapped DEKs to keys.json. Records are keyed by
//! their target; there is exactly one per target and no delete operation,
//! since removing a record orphans everything encrypted under its DEK.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::error::{LedgerLockError, LedgerLockResult};
use crate::models::{EncryptionKeyRecord, KeyId, KeyTarget};

use super::file_io::{read_json, write_json_atomic};
use super::{lock_within, read_within, write_within};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct KeyData {
    keys: Vec<EncryptionKeyRecord>,
}

/// Repository for key record persistence
pub struct KeyRepository {
    path: PathBuf,
    lock_timeout: Duration,
    data: RwLock<HashMap<KeyTarget, EncryptionKeyRecord>>,
    save_lock: Mutex<()>,
}

impl KeyRepository {
    pub fn new(path: PathBuf, lock_timeout: Duration) -> Self {
        Self {
            path,
            lock_timeout,
            data: RwLock::new(HashMap::new()),
            save_lock: Mutex::new(()),
        }
    }

    /// Load key records from disk
    pub fn load(&self) -> LedgerLockResult<()> {
        let file_data: KeyData = read_json(&self.path)?;
        let mut data = write_within(&self.data, self.lock_timeout)?;

        data.clear();
        for record in file_data.keys {
            data.insert(record.target.clone(), record);
        }

        Ok(())
    }

    /// Save key records to disk
    ///
    /// Saves are serialized, and each takes its snapshot after the previous
    /// one finished writing, so the file always ends at the newest state.
    pub fn save(&self) -> LedgerLockResult<()> {
        let _saving = lock_within(&self.save_lock, self.lock_timeout)?;

        let mut keys: Vec<_> = {
            let data = read_within(&self.data, self.lock_timeout)?;
            data.values().cloned().collect()
        };
        keys.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &KeyData { keys })
    }

    /// Get the key record protecting a target
    pub fn get(&self, target: &KeyTarget) -> LedgerLockResult<Option<EncryptionKeyRecord>> {
        let data = read_within(&self.data, self.lock_timeout)?;
        Ok(data.get(target).cloned())
    }

    pub fn get_by_id(&self, id: KeyId) -> LedgerLockResult<Option<EncryptionKeyRecord>> {
        let data = read_within(&self.data, self.lock_timeout)?;
        Ok(data.values().find(|r| r.id == id).cloned())
    }

    pub fn get_all(&self) -> LedgerLockResult<Vec<EncryptionKeyRecord>> {
        let data = read_within(&self.data, self.lock_timeout)?;
        let mut keys: Vec<_> = data.values().cloned().collect();
        keys.sort_by(|a, b| a.target.to_string().cmp(&b.target.to_string()));
        Ok(keys)
    }

    /// Insert the first record for a target
    pub fn insert_new(&self, record: EncryptionKeyRecord) -> LedgerLockResult<()> {
        let mut data = write_within(&self.data, self.lock_timeout)?;

        if data.contains_key(&record.target) {
            return Err(LedgerLockError::Duplicate {
                entity_type: "Encryption key",
                identifier: record.target.to_string(),
            });
        }

        data.insert(record.target.clone(), record);
        Ok(())
    }

    /// Replace a record, provided it is still at `expected_version`
    ///
    /// Anything that read the record before a rotation landed gets a
    /// `Conflict` instead of writing the old wrapped DEK back.
    pub fn update(
        &self,
        record: EncryptionKeyRecord,
        expected_version: u32,
    ) -> LedgerLockResult<()> {
        let mut data = write_within(&self.data, self.lock_timeout)?;

        match data.get_mut(&record.target) {
            Some(existing) if existing.id != record.id => Err(LedgerLockError::Validation(
                format!("Key {} does not belong to {}", record.id, record.target),
            )),
            Some(existing) if existing.version != expected_version => {
                Err(LedgerLockError::Conflict {
                    entity_type: "Encryption key",
                    identifier: record.target.to_string(),
                    expected: expected_version,
                    found: existing.version,
                })
            }
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(LedgerLockError::key_not_found(record.target.to_string())),
        }
    }

    /// Stamp `last_used_at` on whatever record is current for the target
    pub fn touch(&self, target: &KeyTarget) -> LedgerLockResult<()> {
        let mut data = write_within(&self.data, self.lock_timeout)?;
        data.get_mut(target)
            .ok_or_else(|| LedgerLockError::key_not_found(target.to_string()))?
            .touch();
        Ok(())
    }

    pub fn count(&self) -> LedgerLockResult<usize> {
        let data = read_within(&self.data, self.lock_timeout)?;
        Ok(data.len())
    }
}
