//! Encryption level CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_features, format_level_check, format_level_info, format_resolved};
use crate::error::{LedgerLockError, LedgerLockResult};
use crate::levels::{
    resolve, validate_account_override, validate_level_change, EncryptionContext, EncryptionLevel,
    LevelSetting,
};

/// Encryption level commands
#[derive(Subcommand)]
pub enum LevelCommands {
    /// Resolve the effective level for an account
    Resolve {
        /// User default level (0-4); falls back to the configured default
        #[arg(long)]
        user: Option<EncryptionLevel>,
        /// Workspace level (0-4 or "inherit")
        #[arg(long, default_value = "inherit")]
        workspace: LevelSetting,
        /// Account level (0-4 or "inherit")
        #[arg(long, default_value = "inherit")]
        account: LevelSetting,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check whether a level change is allowed
    Check {
        /// Current level (0-4)
        current: EncryptionLevel,
        /// Requested level (0-4)
        requested: EncryptionLevel,
        /// Treat the change as an account override below this workspace level
        #[arg(long)]
        workspace_level: Option<EncryptionLevel>,
    },

    /// Describe the levels and their feature availability
    Info {
        /// Show features for one level only
        level: Option<EncryptionLevel>,
    },
}

/// Handle level commands
pub fn handle_level_command(settings: &Settings, cmd: LevelCommands) -> LedgerLockResult<()> {
    match cmd {
        LevelCommands::Resolve {
            user,
            workspace,
            account,
            json,
        } => {
            let context = EncryptionContext::new(user, workspace, account);
            let resolved = resolve(&context, settings.default_level);

            if json {
                let text = serde_json::to_string_pretty(&resolved)
                    .map_err(|e| LedgerLockError::Json(e.to_string()))?;
                println!("{}", text);
            } else {
                println!("{}", format_resolved(&resolved));
            }
        }

        LevelCommands::Check {
            current,
            requested,
            workspace_level,
        } => {
            let mut check = validate_level_change(current, requested);
            if let Some(workspace_level) = workspace_level {
                let scope = validate_account_override(LevelSetting::Level(requested), workspace_level);
                check.allowed &= scope.allowed;
                check.warnings.extend(scope.warnings);
            }
            println!("{}", format_level_check(&check));
        }

        LevelCommands::Info { level } => match level {
            Some(level) => {
                println!("{}", format_level_info(&[level]));
                println!("{}", format_features(&level.features()));
            }
            None => println!("{}", format_level_info(&EncryptionLevel::ALL)),
        },
    }

    Ok(())
}
