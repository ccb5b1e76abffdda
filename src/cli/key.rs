//! Key management CLI commands
//!
//! Secrets are read from `LEDGERLOCK_SECRET` / `LEDGERLOCK_NEW_PASSPHRASE`
//! when set, otherwise prompted for with hidden input.

use clap::Subcommand;

use super::{read_new_passphrase, read_secret, TargetArgs};
use crate::config::Settings;
use crate::display::{format_key_details, format_key_list, format_new_secret};
use crate::error::{LedgerLockError, LedgerLockResult};
use crate::keys::{mask_secret, KeyManager, KeyService};
use crate::models::KeyType;
use crate::storage::Storage;

/// Key management commands
#[derive(Subcommand)]
pub enum KeyCommands {
    /// Enable encryption for a target by generating its key
    Enable {
        #[command(flatten)]
        target: TargetArgs,
        /// token, passphrase or keypair
        #[arg(long = "type", default_value = "token")]
        key_type: KeyType,
        #[arg(long, env = "LEDGERLOCK_NEW_PASSPHRASE", hide_env_values = true)]
        new_passphrase: Option<String>,
    },

    /// Show key status for one target
    Status {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List all keys
    List,

    /// Re-wrap a target's key under a new secret
    Rotate {
        #[command(flatten)]
        target: TargetArgs,
        /// Type of the new secret
        #[arg(long = "to", default_value = "token")]
        new_type: KeyType,
        #[arg(long, env = "LEDGERLOCK_SECRET", hide_env_values = true)]
        secret: Option<String>,
        #[arg(long, env = "LEDGERLOCK_NEW_PASSPHRASE", hide_env_values = true)]
        new_passphrase: Option<String>,
    },

    /// Check that a secret unlocks a target's key
    Verify {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long, env = "LEDGERLOCK_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
}

/// Handle key commands
pub fn handle_key_command(
    settings: &Settings,
    storage: &Storage,
    cmd: KeyCommands,
) -> LedgerLockResult<()> {
    let service = KeyService::new(storage, KeyManager::new(settings.key_manager_config()));

    match cmd {
        KeyCommands::Enable {
            target,
            key_type,
            new_passphrase,
        } => {
            let passphrase = match key_type {
                KeyType::Passphrase => Some(read_new_passphrase(new_passphrase)?),
                _ => None,
            };

            let (record, secret) =
                service.enable(target.target(), key_type, passphrase.as_deref())?;
            println!("Encryption enabled for {}", record.target);
            println!();
            println!("{}", format_new_secret(record.key_type, &secret));
        }

        KeyCommands::Status { target } => {
            let target = target.target();
            match service.status(&target)? {
                Some(status) => print!("{}", format_key_details(&status)),
                None => println!("Encryption is not enabled for {}", target),
            }
        }

        KeyCommands::List => print!("{}", format_key_list(&service.list()?)),

        KeyCommands::Rotate {
            target,
            new_type,
            secret,
            new_passphrase,
        } => {
            let target = target.target();
            let old_secret = read_secret(secret, "Current secret: ")?;
            let passphrase = match new_type {
                KeyType::Passphrase => Some(read_new_passphrase(new_passphrase)?),
                _ => None,
            };

            let (record, new_secret) =
                service.rotate(&target, &old_secret, new_type, passphrase.as_deref())?;
            println!("Rotated key for {} (version {})", record.target, record.version);
            println!();
            println!("{}", format_new_secret(record.key_type, &new_secret));
        }

        KeyCommands::Verify { target, secret } => {
            let target = target.target();
            let record = service
                .get(&target)?
                .ok_or_else(|| LedgerLockError::key_not_found(target.to_string()))?;
            let secret = read_secret(secret, "Secret: ")?;

            service.unlock(&target, &secret)?;
            println!(
                "Key verified for {} ({})",
                target,
                mask_secret(record.key_type, &secret)
            );
        }
    }

    Ok(())
}
