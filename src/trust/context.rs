//! Login context
//!
//! What the caller knows about a login attempt. Raw values live only for
//! the duration of a request; everything persisted is hashed.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerLockError, LedgerLockResult};
use crate::models::{hash_context_value, ContextType};

/// Longest user-agent summary kept as a device label
const LABEL_MAX_CHARS: usize = 60;

/// Coarse geolocation of a login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub country: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl GeoLocation {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: None,
            city: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Value compared for location trust; city is too fine-grained to use
    pub fn location_key(&self) -> String {
        format!(
            "{}|{}",
            self.country.trim(),
            self.region.as_deref().unwrap_or("").trim()
        )
    }
}

/// Everything known about a single login attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginContext {
    pub ip: String,
    pub user_agent: String,
    #[serde(default)]
    pub geo: Option<GeoLocation>,
    /// Local hour, 0-23
    #[serde(default)]
    pub local_hour: Option<u8>,
    /// Day of week, 0 = Sunday
    #[serde(default)]
    pub day_of_week: Option<u8>,
    #[serde(default)]
    pub device_fingerprint: Option<String>,
}

impl LoginContext {
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
            ..Default::default()
        }
    }

    pub fn with_geo(mut self, geo: GeoLocation) -> Self {
        self.geo = Some(geo);
        self
    }

    pub fn with_time(mut self, local_hour: u8, day_of_week: u8) -> Self {
        self.local_hour = Some(local_hour);
        self.day_of_week = Some(day_of_week);
        self
    }

    pub fn with_device_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.device_fingerprint = Some(fingerprint.into());
        self
    }

    pub fn validate(&self) -> LedgerLockResult<()> {
        if matches!(self.local_hour, Some(h) if h > 23) {
            return Err(LedgerLockError::Validation(
                "Local hour must be between 0 and 23".into(),
            ));
        }
        if matches!(self.day_of_week, Some(d) if d > 6) {
            return Err(LedgerLockError::Validation(
                "Day of week must be between 0 (Sunday) and 6".into(),
            ));
        }
        Ok(())
    }

    pub fn ip_hash(&self) -> Option<String> {
        non_empty(&self.ip).map(|ip| hash_context_value(ContextType::Ip, ip))
    }

    pub fn location_hash(&self) -> Option<String> {
        self.geo
            .as_ref()
            .filter(|g| !g.country.trim().is_empty())
            .map(|g| hash_context_value(ContextType::Location, &g.location_key()))
    }

    /// Device identity: the fingerprint when present, else the user agent
    pub fn device_hash(&self) -> Option<String> {
        self.device_fingerprint
            .as_deref()
            .and_then(non_empty)
            .or_else(|| non_empty(&self.user_agent))
            .map(|device| hash_context_value(ContextType::Device, device))
    }

    /// Hash for one context type, if the login carries that aspect
    pub fn hash_for(&self, context_type: ContextType) -> Option<String> {
        match context_type {
            ContextType::Ip => self.ip_hash(),
            ContextType::Location => self.location_hash(),
            ContextType::Device => self.device_hash(),
        }
    }

    /// Human label stored alongside a device context
    pub fn device_label(&self) -> Option<String> {
        non_empty(&self.user_agent).map(|ua| ua.chars().take(LABEL_MAX_CHARS).collect())
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_prefers_fingerprint() {
        let by_agent = LoginContext::new("1.2.3.4", "Mozilla/5.0");
        let by_print = by_agent.clone().with_device_fingerprint("fp-123");
        let other_agent = LoginContext::new("1.2.3.4", "curl/8.0").with_device_fingerprint("fp-123");

        assert_ne!(by_agent.device_hash(), by_print.device_hash());
        assert_eq!(by_print.device_hash(), other_agent.device_hash());
    }

    #[test]
    fn test_missing_aspects_have_no_hash() {
        let ctx = LoginContext::new("", "");
        assert!(ctx.ip_hash().is_none());
        assert!(ctx.device_hash().is_none());
        assert!(ctx.location_hash().is_none());
    }

    #[test]
    fn test_location_ignores_city() {
        let mut a = GeoLocation::new("US").with_region("CA");
        a.city = Some("Oakland".into());
        let b = GeoLocation::new("us").with_region("ca");

        let ctx_a = LoginContext::new("1.1.1.1", "ua").with_geo(a);
        let ctx_b = LoginContext::new("1.1.1.1", "ua").with_geo(b);
        assert_eq!(ctx_a.location_hash(), ctx_b.location_hash());
    }

    #[test]
    fn test_validate_time() {
        assert!(LoginContext::new("ip", "ua").with_time(23, 6).validate().is_ok());
        assert!(LoginContext::new("ip", "ua")
            .with_time(24, 1)
            .validate()
            .unwrap_err()
            .is_validation());
        assert!(LoginContext::new("ip", "ua").with_time(1, 7).validate().is_err());
    }
}
