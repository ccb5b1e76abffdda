//! Trusted access context model
//!
//! A trusted context remembers an IP, coarse location or device that a user
//! has successfully logged in from. Only a hash of the value is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::ids::ContextId;

/// Which aspect of a login a context describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    Ip,
    Location,
    Device,
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextType::Ip => write!(f, "ip"),
            ContextType::Location => write!(f, "location"),
            ContextType::Device => write!(f, "device"),
        }
    }
}

/// Hash a raw context value for storage and comparison
///
/// The context type is mixed in so an IP and a device string never collide.
pub fn hash_context_value(context_type: ContextType, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(context_type.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(value.trim().to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// How trust scores move on successful logins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustGrowth {
    /// Score given to a context the first time it succeeds
    pub initial: f64,
    /// Added on every later success
    pub increment: f64,
    /// Ceiling reachable through successes alone
    pub max: f64,
}

impl Default for TrustGrowth {
    fn default() -> Self {
        Self {
            initial: 0.5,
            increment: 0.05,
            max: 0.95,
        }
    }
}

/// Per-user trust history for a single context value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedContext {
    pub id: ContextId,
    pub user_id: String,
    pub context_type: ContextType,
    pub value_hash: String,

    /// Running trust estimate in [0, 1]
    pub trust_score: f64,
    pub seen_count: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,

    /// Set when the user explicitly marked this context as trusted
    #[serde(default)]
    pub explicitly_trusted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,

    /// Display label (e.g. a user agent summary); never the raw IP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TrustedContext {
    pub fn new(
        user_id: impl Into<String>,
        context_type: ContextType,
        value_hash: impl Into<String>,
        initial_score: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ContextId::new(),
            user_id: user_id.into(),
            context_type,
            value_hash: value_hash.into(),
            trust_score: initial_score.clamp(0.0, 1.0),
            seen_count: 1,
            first_seen: now,
            last_seen: now,
            explicitly_trusted: false,
            revoked_at: None,
            label: None,
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Apply one more successful login from this context
    ///
    /// Revoked contexts keep their history but never regain score this way.
    pub fn record_success(&mut self, increment: f64, max_score: f64) {
        self.seen_count = self.seen_count.saturating_add(1);
        self.last_seen = Utc::now();
        if !self.is_revoked() {
            self.trust_score = (self.trust_score + increment).min(max_score);
        }
    }

    /// Apply a success using the configured growth curve
    pub fn grow(&mut self, growth: &TrustGrowth) {
        self.record_success(growth.increment, growth.max);
    }

    /// Zero the score and exclude the context from scoring
    pub fn revoke(&mut self) {
        self.trust_score = 0.0;
        self.explicitly_trusted = false;
        self.revoked_at = Some(Utc::now());
    }

    /// Explicit user trust jumps the score and clears any revocation
    pub fn mark_trusted(&mut self, score: f64) {
        self.trust_score = score.clamp(0.0, 1.0);
        self.explicitly_trusted = true;
        self.revoked_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_normalized_and_typed() {
        let a = hash_context_value(ContextType::Ip, "10.0.0.1");
        let b = hash_context_value(ContextType::Ip, " 10.0.0.1 ");
        let c = hash_context_value(ContextType::Device, "10.0.0.1");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_record_success_caps_score() {
        let mut ctx = TrustedContext::new("user-1", ContextType::Device, "h", 0.9);
        ctx.record_success(0.1, 0.95);
        assert_eq!(ctx.seen_count, 2);
        assert!((ctx.trust_score - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_revoked_context_does_not_regain_score() {
        let mut ctx = TrustedContext::new("user-1", ContextType::Device, "h", 0.5);
        ctx.revoke();
        ctx.record_success(0.1, 0.95);
        assert_eq!(ctx.trust_score, 0.0);
        assert_eq!(ctx.seen_count, 2);
        assert!(ctx.is_revoked());
    }

    #[test]
    fn test_mark_trusted_clears_revocation() {
        let mut ctx = TrustedContext::new("user-1", ContextType::Ip, "h", 0.5);
        ctx.revoke();
        ctx.mark_trusted(0.95);
        assert!(!ctx.is_revoked());
        assert!(ctx.explicitly_trusted);
        assert!((ctx.trust_score - 0.95).abs() < f64::EPSILON);
    }
}
