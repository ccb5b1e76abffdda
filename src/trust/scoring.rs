//! Risk scoring
//!
//! A login is scored out of 100. The correct password contributes a fixed
//! baseline; IP, location, device and time-of-day each add a weighted share
//! scaled by how well the login matches the user's history. Factors that
//! were not evaluated (disabled, or absent from the login) are left out of
//! both the sum and the normalising weight total.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerLockError, LedgerLockResult};
use crate::models::{TrustGrowth, TrustedContext};

/// Hours either side of a past login that count as "the same time"
const DEFAULT_TIME_WINDOW_HOURS: u8 = 2;

/// Share of the time score that comes from the hour match
const HOUR_SHARE: f64 = 0.7;

/// Returned by the time factor until enough history exists
pub const NEUTRAL_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    Password,
    Ip,
    Location,
    Device,
    TimePattern,
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFactor::Password => write!(f, "password"),
            RiskFactor::Ip => write!(f, "ip"),
            RiskFactor::Location => write!(f, "location"),
            RiskFactor::Device => write!(f, "device"),
            RiskFactor::TimePattern => write!(f, "time pattern"),
        }
    }
}

/// Relative weight of each factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub password: f64,
    pub ip: f64,
    pub location: f64,
    pub device: f64,
    pub time_pattern: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            password: 30.0,
            ip: 20.0,
            location: 15.0,
            device: 25.0,
            time_pattern: 10.0,
        }
    }
}

impl FactorWeights {
    pub fn weight(&self, factor: RiskFactor) -> f64 {
        match factor {
            RiskFactor::Password => self.password,
            RiskFactor::Ip => self.ip,
            RiskFactor::Location => self.location,
            RiskFactor::Device => self.device,
            RiskFactor::TimePattern => self.time_pattern,
        }
    }
}

/// Which optional factors take part in scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnabledFactors {
    pub ip: bool,
    pub location: bool,
    pub device: bool,
    pub time_pattern: bool,
}

impl Default for EnabledFactors {
    fn default() -> Self {
        Self {
            ip: true,
            location: true,
            device: true,
            time_pattern: true,
        }
    }
}

impl EnabledFactors {
    pub fn is_enabled(&self, factor: RiskFactor) -> bool {
        match factor {
            RiskFactor::Password => true,
            RiskFactor::Ip => self.ip,
            RiskFactor::Location => self.location,
            RiskFactor::Device => self.device,
            RiskFactor::TimePattern => self.time_pattern,
        }
    }
}

/// Scoring policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub weights: FactorWeights,
    pub enabled: EnabledFactors,

    /// Score given to a context value never seen before
    pub unknown_context_score: f64,

    /// Prior successful logins needed before time-of-day counts
    pub min_time_history: usize,
    pub time_window_hours: u8,
    /// How many recent logins the time pattern looks at
    pub history_window: usize,

    pub allow_threshold: f64,
    pub email_threshold: f64,
    pub challenge_threshold: f64,

    pub trust: TrustGrowth,
    /// Score set when a user explicitly trusts a context
    pub explicit_trust_score: f64,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            enabled: EnabledFactors::default(),
            unknown_context_score: 0.3,
            min_time_history: 5,
            time_window_hours: DEFAULT_TIME_WINDOW_HOURS,
            history_window: 50,
            allow_threshold: 80.0,
            email_threshold: 60.0,
            challenge_threshold: 40.0,
            trust: TrustGrowth::default(),
            explicit_trust_score: 0.95,
        }
    }
}

impl RiskSettings {
    pub fn validate(&self) -> LedgerLockResult<()> {
        let w = &self.weights;
        let weights = [w.password, w.ip, w.location, w.device, w.time_pattern];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || w.password <= 0.0 {
            return Err(LedgerLockError::Config(
                "Risk weights must be non-negative and the password weight positive".into(),
            ));
        }

        let unit = [
            self.unknown_context_score,
            self.explicit_trust_score,
            self.trust.initial,
            self.trust.increment,
            self.trust.max,
        ];
        if unit.iter().any(|v| !(0.0..=1.0).contains(v)) || self.trust.initial > self.trust.max {
            return Err(LedgerLockError::Config(
                "Trust scores must lie in [0, 1] with initial <= max".into(),
            ));
        }

        let ordered = 0.0 <= self.challenge_threshold
            && self.challenge_threshold <= self.email_threshold
            && self.email_threshold <= self.allow_threshold
            && self.allow_threshold <= 100.0;
        if !ordered {
            return Err(LedgerLockError::Config(
                "Risk thresholds must satisfy 0 <= challenge <= email <= allow <= 100".into(),
            ));
        }

        if self.time_window_hours > 12 {
            return Err(LedgerLockError::Config(
                "Time window cannot exceed 12 hours".into(),
            ));
        }

        Ok(())
    }

    /// Map a score to an action
    pub fn decide(&self, score: f64) -> AccessDecision {
        if score >= self.allow_threshold {
            AccessDecision::Allow
        } else if score >= self.email_threshold {
            AccessDecision::ChallengeEmail
        } else if score >= self.challenge_threshold {
            AccessDecision::Reauthenticate
        } else {
            AccessDecision::Deny
        }
    }
}

/// What the login flow should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    /// Upper challenge band: confirm by email
    ChallengeEmail,
    /// Lower challenge band: sign in again
    Reauthenticate,
    Deny,
}

impl AccessDecision {
    pub fn requires_challenge(&self) -> bool {
        matches!(self, Self::ChallengeEmail | Self::Reauthenticate)
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDecision::Allow => write!(f, "allow"),
            AccessDecision::ChallengeEmail => write!(f, "challenge (email)"),
            AccessDecision::Reauthenticate => write!(f, "challenge (re-authenticate)"),
            AccessDecision::Deny => write!(f, "deny"),
        }
    }
}

/// One evaluated factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: RiskFactor,
    pub weight: f64,
    /// Match quality in [0, 1]
    pub score: f64,
}

/// Result of scoring a login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Normalised score in [0, 100]
    pub score: f64,
    pub action: AccessDecision,
    pub factors: Vec<FactorScore>,
}

impl RiskAssessment {
    /// Build an assessment from evaluated factors
    pub fn from_factors(factors: Vec<FactorScore>, settings: &RiskSettings) -> Self {
        let score = combine(&factors);
        Self {
            score,
            action: settings.decide(score),
            factors,
        }
    }

    pub fn factor(&self, factor: RiskFactor) -> Option<&FactorScore> {
        self.factors.iter().find(|f| f.factor == factor)
    }
}

/// Weighted average of evaluated factors, scaled to 0-100
pub fn combine(factors: &[FactorScore]) -> f64 {
    let total_weight: f64 = factors.iter().map(|f| f.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let earned: f64 = factors
        .iter()
        .map(|f| f.weight * f.score.clamp(0.0, 1.0))
        .sum();
    (earned / total_weight * 100.0).clamp(0.0, 100.0)
}

/// Match quality of a context value given its stored history
///
/// Unknown values get the benefit of the doubt; revoked values get nothing.
pub fn context_score(known: Option<&TrustedContext>, settings: &RiskSettings) -> f64 {
    match known {
        None => settings.unknown_context_score,
        Some(ctx) if ctx.is_revoked() => 0.0,
        Some(ctx) => ctx.trust_score.max(settings.unknown_context_score),
    }
}

/// A past successful login's time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTime {
    pub hour: u8,
    pub day_of_week: Option<u8>,
}

fn hour_distance(a: u8, b: u8) -> u8 {
    let diff = a.abs_diff(b) % 24;
    diff.min(24 - diff)
}

fn is_weekend(day: u8) -> bool {
    day == 0 || day == 6
}

/// How typical this hour and day are for the user
pub fn time_pattern_score(
    hour: u8,
    day_of_week: Option<u8>,
    history: &[LoginTime],
    settings: &RiskSettings,
) -> f64 {
    if history.len() < settings.min_time_history {
        return NEUTRAL_SCORE;
    }

    let in_window = history
        .iter()
        .filter(|t| hour_distance(t.hour, hour) <= settings.time_window_hours)
        .count();
    let hour_score = in_window as f64 / history.len() as f64;

    let day_score = day_of_week.and_then(|day| {
        let days: Vec<u8> = history.iter().filter_map(|t| t.day_of_week).collect();
        if days.is_empty() {
            return None;
        }
        let same_class = days
            .iter()
            .filter(|d| is_weekend(**d) == is_weekend(day))
            .count();
        Some(same_class as f64 / days.len() as f64)
    });

    match day_score {
        Some(day_score) => HOUR_SHARE * hour_score + (1.0 - HOUR_SHARE) * day_score,
        None => hour_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContextType;

    fn factor(factor: RiskFactor, weight: f64, score: f64) -> FactorScore {
        FactorScore {
            factor,
            weight,
            score,
        }
    }

    #[test]
    fn test_thresholds() {
        let s = RiskSettings::default();
        assert_eq!(s.decide(100.0), AccessDecision::Allow);
        assert_eq!(s.decide(80.0), AccessDecision::Allow);
        assert_eq!(s.decide(79.9), AccessDecision::ChallengeEmail);
        assert_eq!(s.decide(60.0), AccessDecision::ChallengeEmail);
        assert_eq!(s.decide(59.9), AccessDecision::Reauthenticate);
        assert_eq!(s.decide(40.0), AccessDecision::Reauthenticate);
        assert_eq!(s.decide(39.9), AccessDecision::Deny);
    }

    #[test]
    fn test_combine_excludes_unevaluated_factors() {
        let only_password = combine(&[factor(RiskFactor::Password, 30.0, 1.0)]);
        assert!((only_password - 100.0).abs() < 1e-9);

        let with_device = combine(&[
            factor(RiskFactor::Password, 30.0, 1.0),
            factor(RiskFactor::Device, 25.0, 0.0),
        ]);
        assert!((with_device - 30.0 / 55.0 * 100.0).abs() < 1e-9);
        assert_eq!(combine(&[]), 0.0);
    }

    #[test]
    fn test_context_score() {
        let s = RiskSettings::default();
        assert_eq!(context_score(None, &s), 0.3);

        let mut ctx = TrustedContext::new("u", ContextType::Device, "h", 0.8);
        assert_eq!(context_score(Some(&ctx), &s), 0.8);

        ctx.trust_score = 0.1;
        assert_eq!(context_score(Some(&ctx), &s), 0.3);

        ctx.revoke();
        assert_eq!(context_score(Some(&ctx), &s), 0.0);
    }

    #[test]
    fn test_time_pattern_needs_history() {
        let s = RiskSettings::default();
        let history = vec![
            LoginTime {
                hour: 9,
                day_of_week: Some(1)
            };
            4
        ];
        assert_eq!(time_pattern_score(3, Some(0), &history, &s), NEUTRAL_SCORE);
    }

    #[test]
    fn test_time_pattern_matches() {
        let s = RiskSettings::default();
        let history = vec![
            LoginTime {
                hour: 9,
                day_of_week: Some(2)
            };
            10
        ];
        assert!((time_pattern_score(10, Some(3), &history, &s) - 1.0).abs() < 1e-9);
        assert!(time_pattern_score(3, Some(0), &history, &s).abs() < 1e-9);
        assert!((time_pattern_score(10, None, &history, &s) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hour_distance_wraps_midnight() {
        assert_eq!(hour_distance(23, 1), 2);
        assert_eq!(hour_distance(0, 12), 12);
        assert_eq!(hour_distance(5, 5), 0);
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let mut s = RiskSettings::default();
        assert!(s.validate().is_ok());
        s.email_threshold = 90.0;
        assert!(s.validate().is_err());

        let mut s = RiskSettings::default();
        s.weights.password = 0.0;
        assert!(s.validate().is_err());
    }
}
