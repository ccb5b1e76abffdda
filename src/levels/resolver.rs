//! Encryption level resolution
//!
//! Levels are inherited user → workspace → account. A workspace without a
//! setting takes the user's level; an account without a setting takes the
//! workspace's. An account may raise the level but never lower it below its
//! workspace. All functions here are pure.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::level::{EncryptionLevel, FeatureAvailability};
use crate::error::LedgerLockError;

/// A level setting at one scope: a concrete level or "inherit"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawLevelSetting", into = "RawLevelSetting")]
pub enum LevelSetting {
    #[default]
    Inherit,
    Level(EncryptionLevel),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawLevelSetting {
    Level(u8),
    Keyword(String),
}

impl TryFrom<RawLevelSetting> for LevelSetting {
    type Error = LedgerLockError;

    fn try_from(raw: RawLevelSetting) -> Result<Self, Self::Error> {
        match raw {
            RawLevelSetting::Level(value) => Ok(LevelSetting::Level(value.try_into()?)),
            RawLevelSetting::Keyword(s) => s.parse(),
        }
    }
}

impl From<LevelSetting> for RawLevelSetting {
    fn from(setting: LevelSetting) -> Self {
        match setting {
            LevelSetting::Inherit => RawLevelSetting::Keyword("inherit".to_string()),
            LevelSetting::Level(level) => RawLevelSetting::Level(level.as_u8()),
        }
    }
}

impl FromStr for LevelSetting {
    type Err = LedgerLockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("inherit") {
            Ok(LevelSetting::Inherit)
        } else {
            Ok(LevelSetting::Level(s.parse()?))
        }
    }
}

impl From<EncryptionLevel> for LevelSetting {
    fn from(level: EncryptionLevel) -> Self {
        LevelSetting::Level(level)
    }
}

impl fmt::Display for LevelSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSetting::Inherit => write!(f, "inherit"),
            LevelSetting::Level(level) => write!(f, "{}", level),
        }
    }
}

/// Which scope determined the effective level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelSource {
    User,
    Workspace,
    Account,
}

impl fmt::Display for LevelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSource::User => write!(f, "user"),
            LevelSource::Workspace => write!(f, "workspace"),
            LevelSource::Account => write!(f, "account"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEncryptionPreferences {
    pub default_level: EncryptionLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkspaceEncryptionPreferences {
    #[serde(default)]
    pub level: LevelSetting,
}

/// Inputs for resolving one account's effective level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncryptionContext {
    #[serde(default)]
    pub user: Option<UserEncryptionPreferences>,
    #[serde(default)]
    pub workspace: Option<WorkspaceEncryptionPreferences>,
    #[serde(default)]
    pub account: LevelSetting,
}

impl EncryptionContext {
    pub fn new(
        user_level: Option<EncryptionLevel>,
        workspace: LevelSetting,
        account: LevelSetting,
    ) -> Self {
        Self {
            user: user_level.map(|default_level| UserEncryptionPreferences { default_level }),
            workspace: Some(WorkspaceEncryptionPreferences { level: workspace }),
            account,
        }
    }
}

/// Outcome of resolving an [`EncryptionContext`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEncryption {
    pub level: EncryptionLevel,
    pub source: LevelSource,
    pub features: FeatureAvailability,
    pub warnings: Vec<String>,
}

/// Resolve the workspace level, inheriting from the user when unset
pub fn resolve_workspace_level(
    user_level: EncryptionLevel,
    workspace: LevelSetting,
) -> (EncryptionLevel, LevelSource) {
    match workspace {
        LevelSetting::Inherit => (user_level, LevelSource::User),
        LevelSetting::Level(level) => (level, LevelSource::Workspace),
    }
}

/// Resolve the account level; the result is never below `workspace_level`
pub fn resolve_account_level(
    account: LevelSetting,
    workspace_level: EncryptionLevel,
) -> EncryptionLevel {
    match account {
        LevelSetting::Inherit => workspace_level,
        LevelSetting::Level(declared) => declared.max(workspace_level),
    }
}

/// Resolve the effective level for an account
///
/// `system_default` applies when the context carries no user preferences.
pub fn resolve(context: &EncryptionContext, system_default: EncryptionLevel) -> ResolvedEncryption {
    let user_level = context
        .user
        .map(|prefs| prefs.default_level)
        .unwrap_or(system_default);
    let workspace_setting = context.workspace.map(|w| w.level).unwrap_or_default();

    let (workspace_level, workspace_source) =
        resolve_workspace_level(user_level, workspace_setting);
    let level = resolve_account_level(context.account, workspace_level);

    let mut warnings = Vec::new();
    let source = match context.account {
        LevelSetting::Level(declared) if declared < workspace_level => {
            warnings.push(format!(
                "Account level {} is below the workspace level; using {}",
                declared.as_u8(),
                workspace_level
            ));
            workspace_source
        }
        LevelSetting::Level(_) => LevelSource::Account,
        LevelSetting::Inherit => workspace_source,
    };

    match level {
        EncryptionLevel::None => {
            warnings.push("Financial data for this account is stored unencrypted".to_string())
        }
        EncryptionLevel::ZeroKnowledge => warnings.push(
            "Zero-knowledge encryption: data cannot be recovered without your key, and AI features are disabled"
                .to_string(),
        ),
        _ => {}
    }

    ResolvedEncryption {
        level,
        source,
        features: level.features(),
        warnings,
    }
}

/// Result of checking a requested level change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelChangeCheck {
    pub allowed: bool,
    /// The caller must obtain explicit confirmation before applying
    pub requires_confirmation: bool,
    /// Existing data must be decrypted with the current key first
    pub requires_current_key: bool,
    pub warnings: Vec<String>,
}

/// Check a level change at any scope
///
/// Leaving the highest tier needs explicit confirmation and the current
/// key, since existing data has to be decrypted before the weaker policy
/// applies.
pub fn validate_level_change(current: EncryptionLevel, requested: EncryptionLevel) -> LevelChangeCheck {
    let mut warnings = Vec::new();
    let mut requires_confirmation = false;
    let mut requires_current_key = false;

    if current == EncryptionLevel::HIGHEST && requested < current {
        requires_confirmation = true;
        requires_current_key = true;
        warnings.push(
            "Leaving zero-knowledge encryption requires your current key to decrypt existing data"
                .to_string(),
        );
    } else if requested < current {
        warnings.push(format!(
            "Lowering encryption from {} to {} leaves more fields in plaintext",
            current, requested
        ));
    }

    if requested == EncryptionLevel::HIGHEST && current < requested {
        warnings.push(
            "Zero-knowledge encryption cannot be recovered if your key is lost".to_string(),
        );
    }

    LevelChangeCheck {
        allowed: true,
        requires_confirmation,
        requires_current_key,
        warnings,
    }
}

/// Check an account override against its workspace level
///
/// An explicit level below the workspace is refused; "inherit" is always fine.
pub fn validate_account_override(
    requested: LevelSetting,
    workspace_level: EncryptionLevel,
) -> LevelChangeCheck {
    match requested {
        LevelSetting::Level(level) if level < workspace_level => LevelChangeCheck {
            allowed: false,
            requires_confirmation: false,
            requires_current_key: false,
            warnings: vec![format!(
                "Account encryption cannot be lower than the workspace level ({})",
                workspace_level
            )],
        },
        _ => LevelChangeCheck {
            allowed: true,
            requires_confirmation: false,
            requires_current_key: false,
            warnings: Vec::new(),
        },
    }
}
