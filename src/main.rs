use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ledgerlock::cli::{
    handle_field_command, handle_key_command, handle_level_command, handle_trust_command,
};
use ledgerlock::config::{LedgerLockPaths, Settings};
use ledgerlock::storage::Storage;

/// Environment variable holding the log filter, e.g. `ledgerlock=debug`
const LOG_ENV: &str = "LEDGERLOCK_LOG";

#[derive(Parser)]
#[command(
    name = "ledgerlock",
    author = "Kaylee Beyene",
    version,
    about = "Tiered encryption and risk-based access for budgeting data",
    long_about = "LedgerLock manages per-account encryption levels, envelope-encrypted \
                  data keys, field-level encryption with blind indexes, and the \
                  trust history used to score logins."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encryption level commands
    #[command(subcommand)]
    Level(ledgerlock::cli::LevelCommands),

    /// Key management commands
    #[command(subcommand)]
    Key(ledgerlock::cli::KeyCommands),

    /// Field encryption commands
    #[command(subcommand)]
    Field(ledgerlock::cli::FieldCommands),

    /// Trusted device and login risk commands
    #[command(subcommand)]
    Trust(ledgerlock::cli::TrustCommands),

    /// Write the default configuration file
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = LedgerLockPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let storage = Storage::open(paths.clone(), settings.timeouts.store())?;

    match cli.command {
        Some(Commands::Level(cmd)) => handle_level_command(&settings, cmd)?,
        Some(Commands::Key(cmd)) => handle_key_command(&settings, &storage, cmd)?,
        Some(Commands::Field(cmd)) => handle_field_command(&settings, &storage, cmd)?,
        Some(Commands::Trust(cmd)) => handle_trust_command(&settings, &storage, cmd)?,
        Some(Commands::Init) => {
            settings.save(&paths)?;
            println!("Initialized LedgerLock at: {}", paths.base_dir().display());
            println!("Settings written to {}", paths.settings_file().display());
        }
        Some(Commands::Config) => {
            println!("LedgerLock Configuration");
            println!("========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Access log:       {}", paths.access_log().display());
            println!();
            println!("Settings:");
            println!("  Default level:      {}", settings.default_level);
            println!(
                "  Scrypt cost:        N=2^{} r={} p={}",
                settings.scrypt.log_n, settings.scrypt.r, settings.scrypt.p
            );
            println!("  Derivation timeout: {} ms", settings.timeouts.derivation_ms);
            println!("  Store timeout:      {} ms", settings.timeouts.store_ms);
            println!(
                "  Risk thresholds:    allow >= {}, email >= {}, challenge >= {}",
                settings.risk.allow_threshold,
                settings.risk.email_threshold,
                settings.risk.challenge_threshold
            );
        }
        None => {
            println!("LedgerLock - tiered encryption and risk-based access");
            println!();
            println!("Run 'ledgerlock --help' for usage information.");
        }
    }

    Ok(())
}

/// Log to stderr so command output on stdout stays clean
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
