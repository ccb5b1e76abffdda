//! Trust management CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_assessment, format_context_list, format_history};
use crate::error::LedgerLockResult;
use crate::storage::Storage;
use crate::trust::{GeoLocation, LoginContext, LoginOutcome, TrustEngine};

/// Trust management commands
#[derive(Subcommand)]
pub enum TrustCommands {
    /// List a user's trusted devices
    Devices {
        user: String,
        /// Include IP and location contexts
        #[arg(long)]
        all: bool,
    },

    /// Revoke trust in a device
    Revoke {
        user: String,
        /// Context id as listed by `trust devices` (e.g. ctx-1a2b3c4d)
        context_id: String,
    },

    /// Explicitly trust a device or other context
    Allow { user: String, context_id: String },

    /// Show recent login attempts
    History {
        user: String,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Score a login attempt
    Login {
        user: String,
        #[arg(long)]
        ip: String,
        #[arg(long, default_value = "")]
        user_agent: String,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        region: Option<String>,
        /// Local hour (0-23)
        #[arg(long)]
        hour: Option<u8>,
        /// Day of week (0 = Sunday)
        #[arg(long)]
        day: Option<u8>,
        #[arg(long)]
        fingerprint: Option<String>,
        /// Score as if the password was wrong
        #[arg(long)]
        wrong_password: bool,
        /// Record the attempt; treat a required challenge as passed
        #[arg(long)]
        record: bool,
    },
}

/// Handle trust commands
pub fn handle_trust_command(
    settings: &Settings,
    storage: &Storage,
    cmd: TrustCommands,
) -> LedgerLockResult<()> {
    let engine = TrustEngine::new(storage, &settings.risk);

    match cmd {
        TrustCommands::Devices { user, all } => {
            let contexts = if all {
                engine.get_trusted_contexts(&user)?
            } else {
                engine.get_trusted_devices(&user)?
            };
            print!("{}", format_context_list(&contexts));
        }

        TrustCommands::Revoke { user, context_id } => {
            let id = engine.resolve_context_id(&user, &context_id)?;
            let context = engine.revoke_device_trust(&user, id)?;
            println!("Revoked trust in {} {}", context.context_type, context.id);
        }

        TrustCommands::Allow { user, context_id } => {
            let id = engine.resolve_context_id(&user, &context_id)?;
            let context = engine.trust_device(&user, id)?;
            println!(
                "Trusted {} {} (score {:.2})",
                context.context_type, context.id, context.trust_score
            );
        }

        TrustCommands::History { user, limit } => {
            println!("{}", format_history(&engine.login_history(&user, limit)?));
        }

        TrustCommands::Login {
            user,
            ip,
            user_agent,
            country,
            region,
            hour,
            day,
            fingerprint,
            wrong_password,
            record,
        } => {
            let login = LoginContext {
                ip,
                user_agent,
                geo: country.map(|country| GeoLocation {
                    country,
                    region,
                    city: None,
                }),
                local_hour: hour,
                day_of_week: day,
                device_fingerprint: fingerprint,
            };

            let assessment = engine.assess(&user, &login, !wrong_password)?;
            print!("{}", format_assessment(&assessment));

            if record {
                let outcome = LoginOutcome {
                    challenge_passed: assessment.action.requires_challenge().then_some(true),
                    key_unlocked: false,
                };
                let entry = engine.record_login(&user, &login, &assessment, outcome)?;
                println!("\nRecorded: {}", entry.format_human_readable());
            }
        }
    }

    Ok(())
}
