//! Trusted context repository for JSON storage
//!
//! Contexts are keyed by (user, context type, value hash). A successful login
//! updates or creates its context in one step under a single write lock, so
//! two concurrent logins from the same context can never lose an increment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::error::{LedgerLockError, LedgerLockResult};
use crate::models::{ContextId, ContextType, TrustGrowth, TrustedContext};

use super::file_io::{read_json, write_json_atomic};
use super::{lock_within, read_within, write_within};

type ContextKey = (String, ContextType, String);

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TrustedContextData {
    contexts: Vec<TrustedContext>,
}

fn key_of(context: &TrustedContext) -> ContextKey {
    (
        context.user_id.clone(),
        context.context_type,
        context.value_hash.clone(),
    )
}

/// Repository for trusted context persistence
pub struct TrustedContextRepository {
    path: PathBuf,
    lock_timeout: Duration,
    data: RwLock<HashMap<ContextKey, TrustedContext>>,
    save_lock: Mutex<()>,
}

impl TrustedContextRepository {
    pub fn new(path: PathBuf, lock_timeout: Duration) -> Self {
        Self {
            path,
            lock_timeout,
            data: RwLock::new(HashMap::new()),
            save_lock: Mutex::new(()),
        }
    }

    pub fn load(&self) -> LedgerLockResult<()> {
        let file_data: TrustedContextData = read_json(&self.path)?;
        let mut data = write_within(&self.data, self.lock_timeout)?;

        data.clear();
        for context in file_data.contexts {
            data.insert(key_of(&context), context);
        }

        Ok(())
    }

    /// Write the current contexts; concurrent callers take turns
    pub fn save(&self) -> LedgerLockResult<()> {
        let _saving = lock_within(&self.save_lock, self.lock_timeout)?;

        let mut contexts: Vec<_> = {
            let data = read_within(&self.data, self.lock_timeout)?;
            data.values().cloned().collect()
        };
        contexts.sort_by(|a, b| a.first_seen.cmp(&b.first_seen));

        write_json_atomic(&self.path, &TrustedContextData { contexts })
    }

    /// Look up a context by its hashed value
    pub fn find(
        &self,
        user_id: &str,
        context_type: ContextType,
        value_hash: &str,
    ) -> LedgerLockResult<Option<TrustedContext>> {
        let data = read_within(&self.data, self.lock_timeout)?;
        let key = (user_id.to_string(), context_type, value_hash.to_string());
        Ok(data.get(&key).cloned())
    }

    pub fn get(&self, id: ContextId) -> LedgerLockResult<Option<TrustedContext>> {
        let data = read_within(&self.data, self.lock_timeout)?;
        Ok(data.values().find(|c| c.id == id).cloned())
    }

    /// All contexts for a user, most recently seen first
    pub fn list_for_user(&self, user_id: &str) -> LedgerLockResult<Vec<TrustedContext>> {
        let data = read_within(&self.data, self.lock_timeout)?;

        let mut contexts: Vec<_> = data
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        contexts.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));

        Ok(contexts)
    }

    /// Insert-or-increment for a successful login
    pub fn record_success(
        &self,
        user_id: &str,
        context_type: ContextType,
        value_hash: &str,
        label: Option<&str>,
        growth: &TrustGrowth,
    ) -> LedgerLockResult<TrustedContext> {
        let mut data = write_within(&self.data, self.lock_timeout)?;
        let key = (user_id.to_string(), context_type, value_hash.to_string());

        let context = data
            .entry(key)
            .and_modify(|existing| existing.grow(growth))
            .or_insert_with(|| {
                TrustedContext::new(user_id, context_type, value_hash, growth.initial)
            });

        if let Some(label) = label {
            context.label = Some(label.to_string());
        }

        tracing::debug!(
            context_type = %context_type,
            value_hash = %context.value_hash,
            seen_count = context.seen_count,
            trust_score = context.trust_score,
            "recorded trusted context"
        );

        Ok(context.clone())
    }

    /// Revoke a context by id; its history is kept
    pub fn revoke(&self, id: ContextId) -> LedgerLockResult<TrustedContext> {
        self.modify(id, TrustedContext::revoke)
    }

    /// Mark a context as explicitly trusted
    pub fn mark_trusted(&self, id: ContextId, score: f64) -> LedgerLockResult<TrustedContext> {
        self.modify(id, |context| context.mark_trusted(score))
    }

    fn modify<F>(&self, id: ContextId, f: F) -> LedgerLockResult<TrustedContext>
    where
        F: FnOnce(&mut TrustedContext),
    {
        let mut data = write_within(&self.data, self.lock_timeout)?;
        let context = data
            .values_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| LedgerLockError::context_not_found(id.to_string()))?;

        f(context);
        Ok(context.clone())
    }

    pub fn count(&self) -> LedgerLockResult<usize> {
        let data = read_within(&self.data, self.lock_timeout)?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TrustedContextRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trusted_contexts.json");
        let repo = TrustedContextRepository::new(path, Duration::from_secs(2));
        (temp_dir, repo)
    }

    #[test]
    fn test_record_success_inserts_then_increments() {
        let (_temp_dir, repo) = create_test_repo();
        let growth = TrustGrowth::default();

        let first = repo
            .record_success("user-1", ContextType::Ip, "hash-a", None, &growth)
            .unwrap();
        assert_eq!(first.seen_count, 1);
        assert!((first.trust_score - 0.5).abs() < 1e-9);

        let second = repo
            .record_success("user-1", ContextType::Ip, "hash-a", None, &growth)
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.seen_count, 2);
        assert!((second.trust_score - 0.55).abs() < 1e-9);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_contexts_are_per_user() {
        let (_temp_dir, repo) = create_test_repo();
        let growth = TrustGrowth::default();
        repo.record_success("user-1", ContextType::Device, "d", None, &growth)
            .unwrap();
        repo.record_success("user-2", ContextType::Device, "d", None, &growth)
            .unwrap();

        assert_eq!(repo.list_for_user("user-1").unwrap().len(), 1);
        assert!(repo
            .find("user-3", ContextType::Device, "d")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_concurrent_successes_are_not_lost() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trusted_contexts.json");
        let repo = Arc::new(TrustedContextRepository::new(path.clone(), Duration::from_secs(10)));
        let growth = TrustGrowth {
            initial: 0.0,
            increment: 0.0,
            max: 1.0,
        };

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    for _ in 0..25 {
                        repo.record_success("user-1", ContextType::Ip, "h", None, &growth)
                            .unwrap();
                        repo.save().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let context = repo.find("user-1", ContextType::Ip, "h").unwrap().unwrap();
        assert_eq!(context.seen_count, 200);

        let reloaded = TrustedContextRepository::new(path, Duration::from_secs(2));
        reloaded.load().unwrap();
        let saved = reloaded.find("user-1", ContextType::Ip, "h").unwrap().unwrap();
        assert_eq!(saved.seen_count, 200);
    }

    #[test]
    fn test_revoke_and_trust() {
        let (_temp_dir, repo) = create_test_repo();
        let context = repo
            .record_success("user-1", ContextType::Device, "d", Some("Firefox"), &TrustGrowth::default())
            .unwrap();

        let revoked = repo.revoke(context.id).unwrap();
        assert!(revoked.is_revoked());
        assert_eq!(revoked.trust_score, 0.0);
        assert_eq!(revoked.label.as_deref(), Some("Firefox"));

        let trusted = repo.mark_trusted(context.id, 0.95).unwrap();
        assert!(!trusted.is_revoked());
        assert!(trusted.explicitly_trusted);

        assert!(repo.revoke(ContextId::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_save_and_load() {
        let (temp_dir, repo) = create_test_repo();
        repo.record_success("user-1", ContextType::Location, "l", None, &TrustGrowth::default())
            .unwrap();
        repo.save().unwrap();

        let repo2 = TrustedContextRepository::new(
            temp_dir.path().join("trusted_contexts.json"),
            Duration::from_secs(2),
        );
        repo2.load().unwrap();
        assert!(repo2
            .find("user-1", ContextType::Location, "l")
            .unwrap()
            .is_some());
    }
}
