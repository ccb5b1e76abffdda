//! Access log entry
//!
//! One entry per authentication event. Raw IPs and device strings never reach
//! the log; only their context hashes and a coarse location do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::AccessLogId;
use crate::trust::AccessDecision;

/// A single access log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub id: AccessLogId,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Local hour of the login, 0-23
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_hour: Option<u8>,

    /// Day of week, 0 = Sunday
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,

    /// Score in [0, 100]
    pub risk_score: f64,
    pub action: AccessDecision,
    pub challenge_required: bool,

    /// `None` until a required challenge has been answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_passed: Option<bool>,

    pub key_unlocked: bool,
}

impl AccessLogEntry {
    /// Whether this event counts as a successful login
    pub fn is_successful(&self) -> bool {
        match self.action {
            AccessDecision::Allow => true,
            AccessDecision::Deny => false,
            _ => self.challenge_passed == Some(true),
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} score={:.1} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.user_id,
            self.risk_score,
            self.action
        );

        if let Some(passed) = self.challenge_passed {
            output.push_str(if passed {
                " (challenge passed)"
            } else {
                " (challenge failed)"
            });
        }

        if let Some(country) = &self.country {
            output.push_str(&format!(" from {}", country));
            if let Some(region) = &self.region {
                output.push_str(&format!("/{}", region));
            }
        }

        if self.key_unlocked {
            output.push_str(" [key unlocked]");
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: AccessDecision, challenge_passed: Option<bool>) -> AccessLogEntry {
        AccessLogEntry {
            id: AccessLogId::new(),
            user_id: "user-1".into(),
            timestamp: Utc::now(),
            ip_hash: Some("abc".into()),
            device_hash: None,
            country: Some("US".into()),
            region: Some("CA".into()),
            local_hour: Some(9),
            day_of_week: Some(2),
            risk_score: 72.5,
            action,
            challenge_required: action.requires_challenge(),
            challenge_passed,
            key_unlocked: false,
        }
    }

    #[test]
    fn test_success_rules() {
        assert!(entry(AccessDecision::Allow, None).is_successful());
        assert!(!entry(AccessDecision::Deny, None).is_successful());
        assert!(!entry(AccessDecision::ChallengeEmail, None).is_successful());
        assert!(entry(AccessDecision::ChallengeEmail, Some(true)).is_successful());
        assert!(!entry(AccessDecision::Reauthenticate, Some(false)).is_successful());
    }

    #[test]
    fn test_human_readable() {
        let text = entry(AccessDecision::ChallengeEmail, Some(true)).format_human_readable();
        assert!(text.contains("score=72.5"));
        assert!(text.contains("challenge passed"));
        assert!(text.contains("US/CA"));
    }

    #[test]
    fn test_serialization_omits_empty_fields() {
        let json = serde_json::to_string(&entry(AccessDecision::Allow, None)).unwrap();
        assert!(!json.contains("device_hash"));
        assert!(!json.contains("challenge_passed"));
        assert!(json.contains("\"action\":\"allow\""));
    }
}
