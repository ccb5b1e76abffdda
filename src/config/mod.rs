//! Configuration module for LedgerLock
//!
//! - XDG-compliant path resolution
//! - Settings persistence

pub mod paths;
pub mod settings;

pub use paths::LedgerLockPaths;
pub use settings::{Settings, Timeouts};
