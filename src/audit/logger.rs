//! Access logger for the append-only access log
//!
//! Each entry is written as a single JSON line and flushed immediately.
//! Entries are never rewritten.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::error::{LedgerLockError, LedgerLockResult};

use super::entry::AccessLogEntry;

/// Handles writing entries to the access log file (JSONL)
pub struct AccessLogger {
    log_path: PathBuf,
}

impl AccessLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append an entry and flush it
    pub fn log(&self, entry: &AccessLogEntry) -> LedgerLockResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| LedgerLockError::Io(format!("Failed to open access log: {}", e)))?;

        let json = serde_json::to_string(entry).map_err(|e| {
            LedgerLockError::Json(format!("Failed to serialize access entry: {}", e))
        })?;

        writeln!(file, "{}", json)
            .map_err(|e| LedgerLockError::Io(format!("Failed to write access entry: {}", e)))?;

        file.flush()
            .map_err(|e| LedgerLockError::Io(format!("Failed to flush access log: {}", e)))?;

        Ok(())
    }

    /// Read all entries, oldest first
    pub fn read_all(&self) -> LedgerLockResult<Vec<AccessLogEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| LedgerLockError::Io(format!("Failed to open access log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                LedgerLockError::Io(format!(
                    "Failed to read access log line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: AccessLogEntry = serde_json::from_str(&line).map_err(|e| {
                LedgerLockError::Json(format!(
                    "Failed to parse access entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            entries.push(entry);
        }

        Ok(entries)
    }

    /// Read the most recent N entries from the log
    pub fn read_recent(&self, count: usize) -> LedgerLockResult<Vec<AccessLogEntry>> {
        let all_entries = self.read_all()?;
        let start = all_entries.len().saturating_sub(count);
        Ok(all_entries[start..].to_vec())
    }

    /// The most recent `limit` entries for one user, oldest first
    pub fn entries_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> LedgerLockResult<Vec<AccessLogEntry>> {
        let mut entries: Vec<_> = self
            .read_all()?
            .into_iter()
            .filter(|e| e.user_id == user_id)
            .collect();
        let start = entries.len().saturating_sub(limit);
        Ok(entries.split_off(start))
    }

    pub fn entry_count(&self) -> LedgerLockResult<usize> {
        if !self.log_path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.log_path)
            .map_err(|e| LedgerLockError::Io(format!("Failed to open access log: {}", e)))?;

        let reader = BufReader::new(file);
        let count = reader
            .lines()
            .map_while(Result::ok)
            .filter(|l| !l.trim().is_empty())
            .count();

        Ok(count)
    }

    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccessLogId;
    use crate::trust::AccessDecision;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_logger() -> (AccessLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let logger = AccessLogger::new(temp_dir.path().join("access.log"));
        (logger, temp_dir)
    }

    fn entry(user_id: &str, risk_score: f64) -> AccessLogEntry {
        AccessLogEntry {
            id: AccessLogId::new(),
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            ip_hash: None,
            device_hash: None,
            country: None,
            region: None,
            local_hour: None,
            day_of_week: None,
            risk_score,
            action: AccessDecision::Allow,
            challenge_required: false,
            challenge_passed: None,
            key_unlocked: true,
        }
    }

    #[test]
    fn test_log_and_read() {
        let (logger, _temp) = create_test_logger();
        logger.log(&entry("user-1", 91.0)).unwrap();

        let entries = logger.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AccessDecision::Allow);
        assert!(entries[0].key_unlocked);
    }

    #[test]
    fn test_read_recent() {
        let (logger, _temp) = create_test_logger();
        for i in 0..10 {
            logger.log(&entry("user-1", i as f64)).unwrap();
        }

        let recent = logger.read_recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].risk_score, 7.0);
        assert_eq!(recent[2].risk_score, 9.0);
        assert_eq!(logger.entry_count().unwrap(), 10);
    }

    #[test]
    fn test_entries_for_user() {
        let (logger, _temp) = create_test_logger();
        for i in 0..6 {
            let user = if i % 2 == 0 { "user-1" } else { "user-2" };
            logger.log(&entry(user, i as f64)).unwrap();
        }

        let entries = logger.entries_for_user("user-1", 2).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].risk_score, 2.0);
        assert_eq!(entries[1].risk_score, 4.0);
        assert!(logger.entries_for_user("nobody", 10).unwrap().is_empty());
    }

    #[test]
    fn test_empty_log() {
        let (logger, _temp) = create_test_logger();
        assert!(!logger.exists());
        assert_eq!(logger.entry_count().unwrap(), 0);
        assert!(logger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_survives_restart() {
        let (logger, temp) = create_test_logger();
        logger.log(&entry("user-1", 50.0)).unwrap();

        let logger2 = AccessLogger::new(temp.path().join("access.log"));
        assert_eq!(logger2.read_all().unwrap().len(), 1);
    }
}
