//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod field;
pub mod key;
pub mod level;
pub mod trust;

pub use field::{handle_field_command, FieldCommands};
pub use key::{handle_key_command, KeyCommands};
pub use level::{handle_level_command, LevelCommands};
pub use trust::{handle_trust_command, TrustCommands};

use clap::Args;

use crate::crypto::SecureString;
use crate::error::{LedgerLockError, LedgerLockResult};
use crate::keys::MIN_PASSPHRASE_LEN;
use crate::models::{KeyTarget, TargetType};

/// Identifies the entity a key protects
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// user, workspace or account
    pub target_type: TargetType,
    /// ID of the user, workspace or account
    pub target_id: String,
}

impl TargetArgs {
    pub fn target(&self) -> KeyTarget {
        KeyTarget::new(self.target_type, self.target_id.trim())
    }
}

/// Use a supplied secret or prompt for one with hidden input
pub(crate) fn read_secret(provided: Option<String>, prompt: &str) -> LedgerLockResult<SecureString> {
    match provided {
        Some(secret) => Ok(SecureString::new(secret)),
        None => prompt_hidden(prompt),
    }
}

/// Use a supplied new passphrase or prompt twice for one
pub(crate) fn read_new_passphrase(provided: Option<String>) -> LedgerLockResult<SecureString> {
    if let Some(passphrase) = provided {
        return Ok(SecureString::new(passphrase));
    }

    loop {
        let first = prompt_hidden("Enter new passphrase: ")?;

        if first.chars().count() < MIN_PASSPHRASE_LEN {
            println!(
                "Passphrase must be at least {} characters. Please try again.",
                MIN_PASSPHRASE_LEN
            );
            continue;
        }

        let second = prompt_hidden("Confirm passphrase: ")?;

        if first.as_str() != second.as_str() {
            println!("Passphrases do not match. Please try again.");
            continue;
        }

        return Ok(first);
    }
}

fn prompt_hidden(prompt: &str) -> LedgerLockResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::new)
        .map_err(|e| LedgerLockError::Io(format!("Failed to read secret: {}", e)))
}
