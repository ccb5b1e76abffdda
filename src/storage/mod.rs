//! Storage layer for LedgerLock
//!
//! JSON file storage with atomic writes, bounded lock waits and automatic
//! directory creation, plus the append-only access log.

pub mod file_io;
pub mod keys;
pub mod trusted_contexts;

pub use file_io::{read_json, write_json_atomic};
pub use keys::KeyRepository;
pub use trusted_contexts::TrustedContextRepository;

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::audit::AccessLogger;
use crate::config::paths::LedgerLockPaths;
use crate::error::{LedgerLockError, LedgerLockResult};

fn store_timeout(limit: Duration) -> LedgerLockError {
    LedgerLockError::Timeout {
        operation: "store",
        limit_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
    }
}

/// Acquire a read lock or fail after `limit`
pub(crate) fn read_within<T>(
    lock: &RwLock<T>,
    limit: Duration,
) -> LedgerLockResult<RwLockReadGuard<'_, T>> {
    lock.try_read_for(limit).ok_or_else(|| store_timeout(limit))
}

/// Acquire a write lock or fail after `limit`
pub(crate) fn write_within<T>(
    lock: &RwLock<T>,
    limit: Duration,
) -> LedgerLockResult<RwLockWriteGuard<'_, T>> {
    lock.try_write_for(limit).ok_or_else(|| store_timeout(limit))
}

/// Acquire a mutex or fail after `limit`
pub(crate) fn lock_within<T>(lock: &Mutex<T>, limit: Duration) -> LedgerLockResult<MutexGuard<'_, T>> {
    lock.try_lock_for(limit).ok_or_else(|| store_timeout(limit))
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: LedgerLockPaths,
    pub keys: KeyRepository,
    pub contexts: TrustedContextRepository,
    pub access_log: AccessLogger,
}

impl Storage {
    /// Create storage rooted at `paths`, creating directories as needed
    pub fn new(paths: LedgerLockPaths, lock_timeout: Duration) -> LedgerLockResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            keys: KeyRepository::new(paths.keys_file(), lock_timeout),
            contexts: TrustedContextRepository::new(paths.trusted_contexts_file(), lock_timeout),
            access_log: AccessLogger::new(paths.access_log()),
            paths,
        })
    }

    /// Create and load storage in one step
    pub fn open(paths: LedgerLockPaths, lock_timeout: Duration) -> LedgerLockResult<Self> {
        let storage = Self::new(paths, lock_timeout)?;
        storage.load_all()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &LedgerLockPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> LedgerLockResult<()> {
        self.keys.load()?;
        self.contexts.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> LedgerLockResult<()> {
        self.keys.save()?;
        self.contexts.save()?;
        Ok(())
    }
}
