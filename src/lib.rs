//! LedgerLock - tiered encryption and risk-based access for budgeting data
//!
//! This library provides the security core for a personal-finance backend:
//! choosing how much of a user's data is encrypted, holding the keys that do
//! the encrypting, encrypting individual fields, and deciding how much to
//! trust each login.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `levels`: Encryption level hierarchy and resolution
//! - `keys`: Envelope key management (token, passphrase, keypair secrets)
//! - `cipher`: Field-level encryption and blind indexes
//! - `trust`: Risk scoring and trusted-context tracking
//! - `crypto`: AES-GCM, key derivation and zeroizing key types
//! - `credentials`: At-rest encryption of third-party API credentials
//! - `storage`: JSON file storage for key records and trusted contexts
//! - `audit`: Append-only access log
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use ledgerlock::config::{LedgerLockPaths, Settings};
//! use ledgerlock::keys::{KeyManager, KeyService};
//! use ledgerlock::models::{KeyTarget, KeyType};
//! use ledgerlock::storage::Storage;
//!
//! let paths = LedgerLockPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths, settings.timeouts.store())?;
//!
//! let keys = KeyService::new(&storage, KeyManager::new(settings.key_manager_config()));
//! let (_, token) = keys.enable(KeyTarget::account("acct-1"), KeyType::Token, None)?;
//! let dek = keys.unlock(&KeyTarget::account("acct-1"), &token)?;
//! let stored = ledgerlock::cipher::encrypt_field("Groceries", &dek)?;
//! ```

pub mod audit;
pub mod cipher;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod display;
pub mod error;
pub mod keys;
pub mod levels;
pub mod models;
pub mod storage;
pub mod trust;

pub use error::{LedgerLockError, LedgerLockResult};
