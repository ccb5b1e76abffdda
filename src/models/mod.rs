//! Core data models for LedgerLock
//!
//! Key records, trusted contexts and the typed ids that link them.

pub mod ids;
pub mod key;
pub mod trusted_context;

pub use ids::{AccessLogId, ContextId, KeyId};
pub use key::{DerivationParams, EncryptionKeyRecord, KeyTarget, KeyType, TargetType};
pub use trusted_context::{hash_context_value, ContextType, TrustGrowth, TrustedContext};
