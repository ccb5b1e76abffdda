//! Field encryption CLI commands

use std::path::{Path, PathBuf};

use clap::Subcommand;

use super::{read_secret, TargetArgs};
use crate::cipher::{
    create_blind_index, decrypt_field, decrypt_records, encrypt_field, encrypt_records, Record,
};
use crate::config::Settings;
use crate::crypto::DataKey;
use crate::error::{LedgerLockError, LedgerLockResult};
use crate::keys::{KeyManager, KeyService};
use crate::levels::EncryptionLevel;
use crate::storage::Storage;

/// Field encryption commands
#[derive(Subcommand)]
pub enum FieldCommands {
    /// Encrypt a single value
    Encrypt {
        #[command(flatten)]
        target: TargetArgs,
        value: String,
        #[arg(long, env = "LEDGERLOCK_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Decrypt a single value (plaintext passes through unchanged)
    Decrypt {
        #[command(flatten)]
        target: TargetArgs,
        value: String,
        #[arg(long, env = "LEDGERLOCK_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Compute the blind index of a value
    Index {
        #[command(flatten)]
        target: TargetArgs,
        value: String,
        #[arg(long, env = "LEDGERLOCK_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Encrypt a JSON array of records from one table
    EncryptRecords {
        #[command(flatten)]
        target: TargetArgs,
        /// Table the records belong to (accounts, transactions, ...)
        #[arg(long)]
        table: String,
        #[arg(long)]
        level: EncryptionLevel,
        /// JSON file containing an array of objects
        file: PathBuf,
        #[arg(long, env = "LEDGERLOCK_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Decrypt a JSON array of records from one table
    DecryptRecords {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long)]
        table: String,
        #[arg(long)]
        level: EncryptionLevel,
        file: PathBuf,
        #[arg(long, env = "LEDGERLOCK_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
}

/// Handle field commands
pub fn handle_field_command(
    settings: &Settings,
    storage: &Storage,
    cmd: FieldCommands,
) -> LedgerLockResult<()> {
    let service = KeyService::new(storage, KeyManager::new(settings.key_manager_config()));
    let unlock = |target: &TargetArgs, secret: Option<String>| -> LedgerLockResult<DataKey> {
        let secret = read_secret(secret, "Secret: ")?;
        service.unlock(&target.target(), &secret)
    };

    match cmd {
        FieldCommands::Encrypt {
            target,
            value,
            secret,
        } => {
            let dek = unlock(&target, secret)?;
            println!("{}", encrypt_field(&value, &dek)?);
        }

        FieldCommands::Decrypt {
            target,
            value,
            secret,
        } => {
            let dek = unlock(&target, secret)?;
            println!("{}", decrypt_field(&value, &dek)?);
        }

        FieldCommands::Index {
            target,
            value,
            secret,
        } => {
            let dek = unlock(&target, secret)?;
            println!("{}", create_blind_index(&value, &dek)?);
        }

        FieldCommands::EncryptRecords {
            target,
            table,
            level,
            file,
            secret,
        } => {
            let records = read_records(&file)?;
            let dek = unlock(&target, secret)?;
            let encrypted = encrypt_records(&table, &records, level, &dek)?;
            println!("{}", serde_json::to_string_pretty(&encrypted)?);
        }

        FieldCommands::DecryptRecords {
            target,
            table,
            level,
            file,
            secret,
        } => {
            let records = read_records(&file)?;
            let dek = unlock(&target, secret)?;
            let batch = decrypt_records(&table, &records, level, &dek);
            println!("{}", serde_json::to_string_pretty(&batch.records)?);

            for failure in &batch.failures {
                eprintln!(
                    "Warning: record {} field '{}' could not be decrypted: {}",
                    failure.record_index, failure.field, failure.error
                );
            }
        }
    }

    Ok(())
}

fn read_records(path: &Path) -> LedgerLockResult<Vec<Record>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| LedgerLockError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&contents).map_err(|e| {
        LedgerLockError::Validation(format!(
            "{} must contain a JSON array of objects: {}",
            path.display(),
            e
        ))
    })
}
