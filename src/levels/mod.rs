//! Encryption level hierarchy
//!
//! Decides which tier applies to an account and what that tier means for
//! the rest of the application.

pub mod level;
pub mod resolver;

pub use level::{EncryptionLevel, Feature, FeatureAvailability, FeatureStatus};
pub use resolver::{
    resolve, resolve_account_level, resolve_workspace_level, validate_account_override,
    validate_level_change, EncryptionContext, LevelChangeCheck, LevelSetting, LevelSource,
    ResolvedEncryption, UserEncryptionPreferences, WorkspaceEncryptionPreferences,
};
