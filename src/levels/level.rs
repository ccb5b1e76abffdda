//! Encryption tiers and the features each tier leaves usable
//!
//! The feature table is consumed by the settings UI and must stay stable:
//! every level maps every [`Feature`] to exactly one [`FeatureStatus`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LedgerLockError;

/// Encryption tier, totally ordered from weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum EncryptionLevel {
    None = 0,
    Basic = 1,
    EnhancedPii = 2,
    FullField = 3,
    ZeroKnowledge = 4,
}

impl EncryptionLevel {
    pub const ALL: [EncryptionLevel; 5] = [
        EncryptionLevel::None,
        EncryptionLevel::Basic,
        EncryptionLevel::EnhancedPii,
        EncryptionLevel::FullField,
        EncryptionLevel::ZeroKnowledge,
    ];

    pub const HIGHEST: EncryptionLevel = EncryptionLevel::ZeroKnowledge;

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            EncryptionLevel::None => "None",
            EncryptionLevel::Basic => "Basic",
            EncryptionLevel::EnhancedPii => "Enhanced PII",
            EncryptionLevel::FullField => "Full Field",
            EncryptionLevel::ZeroKnowledge => "Zero Knowledge",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            EncryptionLevel::None => "Data is stored without field encryption.",
            EncryptionLevel::Basic => {
                "Account and routing numbers are encrypted; everything else stays searchable."
            }
            EncryptionLevel::EnhancedPii => {
                "Personal details such as account names, institutions and payees are encrypted."
            }
            EncryptionLevel::FullField => {
                "All descriptive transaction, account and budget text is encrypted."
            }
            EncryptionLevel::ZeroKnowledge => {
                "Every string field is encrypted and only your key can decrypt it. Lost keys cannot be recovered."
            }
        }
    }

    /// Feature availability for this level
    pub fn features(self) -> FeatureAvailability {
        FeatureAvailability::for_level(self)
    }
}

impl From<EncryptionLevel> for u8 {
    fn from(level: EncryptionLevel) -> u8 {
        level.as_u8()
    }
}

impl TryFrom<u8> for EncryptionLevel {
    type Error = LedgerLockError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        EncryptionLevel::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| {
                LedgerLockError::Validation(format!(
                    "Encryption level must be between 0 and 4, got {}",
                    value
                ))
            })
    }
}

impl FromStr for EncryptionLevel {
    type Err = LedgerLockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s.trim().parse().map_err(|_| {
            LedgerLockError::Validation(format!("Invalid encryption level: {}", s))
        })?;
        EncryptionLevel::try_from(value)
    }
}

impl fmt::Display for EncryptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level {} ({})", self.as_u8(), self.name())
    }
}

/// Application features whose behavior depends on the encryption tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    AiCategorization,
    TransactionSearch,
    PayeeMatching,
    SpendingReports,
    BankImport,
    DataExport,
    SharedWorkspaces,
    AccountRecovery,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::AiCategorization,
        Feature::TransactionSearch,
        Feature::PayeeMatching,
        Feature::SpendingReports,
        Feature::BankImport,
        Feature::DataExport,
        Feature::SharedWorkspaces,
        Feature::AccountRecovery,
    ];
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::AiCategorization => "ai_categorization",
            Feature::TransactionSearch => "transaction_search",
            Feature::PayeeMatching => "payee_matching",
            Feature::SpendingReports => "spending_reports",
            Feature::BankImport => "bank_import",
            Feature::DataExport => "data_export",
            Feature::SharedWorkspaces => "shared_workspaces",
            Feature::AccountRecovery => "account_recovery",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureStatus {
    Available,
    Limited,
    Disabled,
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureStatus::Available => write!(f, "available"),
            FeatureStatus::Limited => write!(f, "limited"),
            FeatureStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// Per-feature status for one encryption level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureAvailability(BTreeMap<Feature, FeatureStatus>);

impl FeatureAvailability {
    pub fn for_level(level: EncryptionLevel) -> Self {
        use FeatureStatus::{Available as A, Disabled as D, Limited as L};

        // Columns follow Feature::ALL order.
        let row: [FeatureStatus; 8] = match level {
            EncryptionLevel::None | EncryptionLevel::Basic => [A, A, A, A, A, A, A, A],
            EncryptionLevel::EnhancedPii => [L, A, L, A, A, A, A, A],
            EncryptionLevel::FullField => [L, L, L, A, A, L, L, L],
            EncryptionLevel::ZeroKnowledge => [D, D, D, L, L, L, D, D],
        };

        Self(Feature::ALL.iter().copied().zip(row).collect())
    }

    pub fn status(&self, feature: Feature) -> FeatureStatus {
        self.0
            .get(&feature)
            .copied()
            .unwrap_or(FeatureStatus::Disabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, FeatureStatus)> + '_ {
        self.0.iter().map(|(f, s)| (*f, *s))
    }
}
