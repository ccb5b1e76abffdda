//! Path management for LedgerLock
//!
//! Provides XDG-compliant path resolution for configuration, key records,
//! trust history and the access log.
//!
//! ## Path Resolution Order
//!
//! 1. `LEDGERLOCK_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/ledgerlock` or `~/.config/ledgerlock`
//! 3. Windows: `%APPDATA%\ledgerlock`

use std::path::PathBuf;

use crate::error::LedgerLockError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "LEDGERLOCK_DATA_DIR";

/// Manages all paths used by LedgerLock
#[derive(Debug, Clone)]
pub struct LedgerLockPaths {
    base_dir: PathBuf,
}

impl LedgerLockPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, LedgerLockError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (~/.config/ledgerlock/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the append-only access log
    pub fn access_log(&self) -> PathBuf {
        self.base_dir.join("access.log")
    }

    /// Get the path to keys.json (wrapped DEKs)
    pub fn keys_file(&self) -> PathBuf {
        self.data_dir().join("keys.json")
    }

    /// Get the path to trusted_contexts.json
    pub fn trusted_contexts_file(&self) -> PathBuf {
        self.data_dir().join("trusted_contexts.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), LedgerLockError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| LedgerLockError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| LedgerLockError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if LedgerLock has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, LedgerLockError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.trim().is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var("HOME").map_err(|_| {
                LedgerLockError::Config("Could not determine HOME directory".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("ledgerlock"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, LedgerLockError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| LedgerLockError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("ledgerlock"))
}
