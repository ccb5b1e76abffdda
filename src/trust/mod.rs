//! Risk-based access
//!
//! Decides whether a login is trusted enough to go on and unwrap a key:
//! allow, challenge, or deny.

pub mod context;
pub mod engine;
pub mod scoring;

pub use context::{GeoLocation, LoginContext};
pub use engine::{LoginOutcome, TrustEngine};
pub use scoring::{
    combine, context_score, time_pattern_score, AccessDecision, EnabledFactors, FactorScore,
    FactorWeights, LoginTime, RiskAssessment, RiskFactor, RiskSettings, NEUTRAL_SCORE,
};
