//! User settings for LedgerLock
//!
//! Manages the default encryption level, passphrase derivation cost, risk
//! scoring policy and operation timeouts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::LedgerLockPaths;
use crate::crypto::ScryptCost;
use crate::error::LedgerLockError;
use crate::keys::KeyManagerConfig;
use crate::levels::EncryptionLevel;
use crate::storage::write_json_atomic;
use crate::trust::RiskSettings;

/// Time budgets for slow operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Passphrase key derivation (scrypt / argon2)
    pub derivation_ms: u64,
    /// Acquiring a repository lock
    pub store_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            derivation_ms: 10_000,
            store_ms: 2_000,
        }
    }
}

impl Timeouts {
    pub fn derivation(&self) -> Duration {
        Duration::from_millis(self.derivation_ms)
    }

    pub fn store(&self) -> Duration {
        Duration::from_millis(self.store_ms)
    }
}

/// User settings for LedgerLock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Level applied when a user has no stored preference
    #[serde(default = "default_level")]
    pub default_level: EncryptionLevel,

    /// Cost parameters for new passphrase keys
    #[serde(default)]
    pub scrypt: ScryptCost,

    #[serde(default)]
    pub risk: RiskSettings,

    #[serde(default)]
    pub timeouts: Timeouts,
}

fn default_schema_version() -> u32 {
    1
}

fn default_level() -> EncryptionLevel {
    EncryptionLevel::Basic
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_level: default_level(),
            scrypt: ScryptCost::default(),
            risk: RiskSettings::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Settings {
    /// Key manager tunables derived from these settings
    pub fn key_manager_config(&self) -> KeyManagerConfig {
        KeyManagerConfig {
            scrypt: self.scrypt,
            derivation_timeout: self.timeouts.derivation(),
        }
    }

    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &LedgerLockPaths) -> Result<Self, LedgerLockError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                LedgerLockError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerLockError::Config(format!("Failed to parse settings file: {}", e))
            })?;
            settings.validate()?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerLockPaths) -> Result<(), LedgerLockError> {
        self.validate()?;
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Reject settings that would make scoring or derivation meaningless
    pub fn validate(&self) -> Result<(), LedgerLockError> {
        if self.timeouts.derivation_ms == 0 || self.timeouts.store_ms == 0 {
            return Err(LedgerLockError::Config(
                "Timeouts must be greater than zero".into(),
            ));
        }
        self.risk.validate()
    }
}
