//! Trust engine
//!
//! Scores login attempts against a user's trusted-context history, records
//! every attempt in the access log, and feeds successful logins back into the
//! history used for future scoring.

use chrono::Utc;

use super::context::LoginContext;
use super::scoring::{
    context_score, time_pattern_score, FactorScore, LoginTime, RiskAssessment, RiskFactor,
    RiskSettings,
};
use crate::audit::AccessLogEntry;
use crate::error::{LedgerLockError, LedgerLockResult};
use crate::models::{AccessLogId, ContextId, ContextType, TrustedContext};
use crate::storage::Storage;

/// How a login attempt ended, as reported by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoginOutcome {
    /// `None` when no challenge was answered
    pub challenge_passed: Option<bool>,
    pub key_unlocked: bool,
}

/// Risk-based access decisions over persisted trust history
pub struct TrustEngine<'a> {
    storage: &'a Storage,
    settings: &'a RiskSettings,
}

impl<'a> TrustEngine<'a> {
    pub fn new(storage: &'a Storage, settings: &'a RiskSettings) -> Self {
        Self { storage, settings }
    }

    /// Score a login attempt without recording anything
    ///
    /// A wrong password is denied outright.
    pub fn assess(
        &self,
        user_id: &str,
        login: &LoginContext,
        password_verified: bool,
    ) -> LedgerLockResult<RiskAssessment> {
        login.validate()?;
        let weights = &self.settings.weights;

        if !password_verified {
            return Ok(RiskAssessment::from_factors(
                vec![FactorScore {
                    factor: RiskFactor::Password,
                    weight: weights.password,
                    score: 0.0,
                }],
                self.settings,
            ));
        }

        let mut factors = vec![FactorScore {
            factor: RiskFactor::Password,
            weight: weights.password,
            score: 1.0,
        }];

        for (factor, context_type) in [
            (RiskFactor::Ip, ContextType::Ip),
            (RiskFactor::Location, ContextType::Location),
            (RiskFactor::Device, ContextType::Device),
        ] {
            if !self.settings.enabled.is_enabled(factor) {
                continue;
            }
            let Some(hash) = login.hash_for(context_type) else {
                continue;
            };
            let known = self.storage.contexts.find(user_id, context_type, &hash)?;
            factors.push(FactorScore {
                factor,
                weight: weights.weight(factor),
                score: context_score(known.as_ref(), self.settings),
            });
        }

        if self.settings.enabled.time_pattern {
            if let Some(hour) = login.local_hour {
                let history = self.successful_login_times(user_id)?;
                factors.push(FactorScore {
                    factor: RiskFactor::TimePattern,
                    weight: weights.time_pattern,
                    score: time_pattern_score(hour, login.day_of_week, &history, self.settings),
                });
            }
        }

        let assessment = RiskAssessment::from_factors(factors, self.settings);
        tracing::debug!(
            score = assessment.score,
            action = %assessment.action,
            factors = assessment.factors.len(),
            "assessed login"
        );
        Ok(assessment)
    }

    fn successful_login_times(&self, user_id: &str) -> LedgerLockResult<Vec<LoginTime>> {
        let entries = self
            .storage
            .access_log
            .entries_for_user(user_id, self.settings.history_window)?;

        Ok(entries
            .iter()
            .filter(|e| e.is_successful())
            .filter_map(|e| {
                e.local_hour.map(|hour| LoginTime {
                    hour,
                    day_of_week: e.day_of_week,
                })
            })
            .collect())
    }

    /// Log an attempt and, if it succeeded, strengthen its contexts
    ///
    /// The access log entry is written whatever the outcome.
    pub fn record_login(
        &self,
        user_id: &str,
        login: &LoginContext,
        assessment: &RiskAssessment,
        outcome: LoginOutcome,
    ) -> LedgerLockResult<AccessLogEntry> {
        let entry = AccessLogEntry {
            id: AccessLogId::new(),
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            ip_hash: login.ip_hash(),
            device_hash: login.device_hash(),
            country: login.geo.as_ref().map(|g| g.country.clone()),
            region: login.geo.as_ref().and_then(|g| g.region.clone()),
            local_hour: login.local_hour,
            day_of_week: login.day_of_week,
            risk_score: assessment.score,
            action: assessment.action,
            challenge_required: assessment.action.requires_challenge(),
            challenge_passed: outcome.challenge_passed,
            key_unlocked: outcome.key_unlocked,
        };
        self.storage.access_log.log(&entry)?;

        if entry.is_successful() {
            for context_type in [ContextType::Ip, ContextType::Location, ContextType::Device] {
                let Some(hash) = login.hash_for(context_type) else {
                    continue;
                };
                let label = match context_type {
                    ContextType::Device => login.device_label(),
                    _ => None,
                };
                self.storage.contexts.record_success(
                    user_id,
                    context_type,
                    &hash,
                    label.as_deref(),
                    &self.settings.trust,
                )?;
            }
            self.storage.contexts.save()?;
            tracing::info!(score = entry.risk_score, action = %entry.action, "login succeeded");
        } else {
            tracing::warn!(score = entry.risk_score, action = %entry.action, "login not trusted");
        }

        Ok(entry)
    }

    /// Assess, answer any required challenge, and record in one step
    ///
    /// `challenge` runs only when the assessment asks for one. A challenged
    /// login counts as successful, and builds trust, only if it returns true.
    pub fn evaluate_login<F>(
        &self,
        user_id: &str,
        login: &LoginContext,
        password_verified: bool,
        challenge: F,
    ) -> LedgerLockResult<RiskAssessment>
    where
        F: FnOnce(&RiskAssessment) -> bool,
    {
        let assessment = self.assess(user_id, login, password_verified)?;
        let outcome = LoginOutcome {
            challenge_passed: assessment
                .action
                .requires_challenge()
                .then(|| challenge(&assessment)),
            key_unlocked: false,
        };
        self.record_login(user_id, login, &assessment, outcome)?;
        Ok(assessment)
    }

    /// Non-revoked device contexts, most recently seen first
    pub fn get_trusted_devices(&self, user_id: &str) -> LedgerLockResult<Vec<TrustedContext>> {
        Ok(self
            .get_trusted_contexts(user_id)?
            .into_iter()
            .filter(|c| c.context_type == ContextType::Device)
            .collect())
    }

    /// All non-revoked contexts, most recently seen first
    pub fn get_trusted_contexts(&self, user_id: &str) -> LedgerLockResult<Vec<TrustedContext>> {
        Ok(self
            .storage
            .contexts
            .list_for_user(user_id)?
            .into_iter()
            .filter(|c| !c.is_revoked())
            .collect())
    }

    /// Find one of the user's contexts (revoked included) by full or short id
    pub fn resolve_context_id(&self, user_id: &str, input: &str) -> LedgerLockResult<ContextId> {
        let found: Vec<ContextId> = self
            .storage
            .contexts
            .list_for_user(user_id)?
            .into_iter()
            .map(|c| c.id)
            .filter(|id| id.matches(input))
            .collect();

        match found.as_slice() {
            [id] => Ok(*id),
            [] => Err(LedgerLockError::context_not_found(input.trim())),
            _ => Err(LedgerLockError::Validation(format!(
                "'{}' matches more than one context; use the full id",
                input.trim()
            ))),
        }
    }

    fn owned_context(&self, user_id: &str, id: ContextId) -> LedgerLockResult<TrustedContext> {
        self.storage
            .contexts
            .get(id)?
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| LedgerLockError::context_not_found(id.to_string()))
    }

    /// Revoke trust in a device; its history is kept
    pub fn revoke_device_trust(
        &self,
        user_id: &str,
        id: ContextId,
    ) -> LedgerLockResult<TrustedContext> {
        let context = self.owned_context(user_id, id)?;
        if context.context_type != ContextType::Device {
            return Err(LedgerLockError::Validation(format!(
                "{} is a {} context, not a device",
                id, context.context_type
            )));
        }

        let revoked = self.storage.contexts.revoke(id)?;
        self.storage.contexts.save()?;
        tracing::info!(context = %id, "revoked device trust");
        Ok(revoked)
    }

    /// Explicitly trust a context, clearing any revocation
    pub fn trust_device(&self, user_id: &str, id: ContextId) -> LedgerLockResult<TrustedContext> {
        self.owned_context(user_id, id)?;

        let trusted = self
            .storage
            .contexts
            .mark_trusted(id, self.settings.explicit_trust_score)?;
        self.storage.contexts.save()?;
        tracing::info!(context = %id, "explicitly trusted context");
        Ok(trusted)
    }

    /// Most recent access log entries for a user, newest first
    pub fn login_history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> LedgerLockResult<Vec<AccessLogEntry>> {
        let mut entries = self.storage.access_log.entries_for_user(user_id, limit)?;
        entries.reverse();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerLockPaths;
    use crate::trust::{AccessDecision, GeoLocation};
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerLockPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths, Duration::from_secs(2)).unwrap();
        (temp_dir, storage)
    }

    fn laptop() -> LoginContext {
        LoginContext::new("203.0.113.7", "Mozilla/5.0 (X11; Linux x86_64)")
            .with_geo(GeoLocation::new("US").with_region("OR"))
            .with_device_fingerprint("fp-laptop")
            .with_time(9, 2)
    }

    #[test]
    fn test_wrong_password_denied() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = RiskSettings::default();
        let engine = TrustEngine::new(&storage, &settings);

        let assessment = engine.assess("user-1", &laptop(), false).unwrap();
        assert_eq!(assessment.action, AccessDecision::Deny);
        assert_eq!(assessment.score, 0.0);
    }

    #[test]
    fn test_new_user_is_challenged() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = RiskSettings::default();
        let engine = TrustEngine::new(&storage, &settings);

        let assessment = engine
            .evaluate_login("user-1", &laptop(), true, |_| false)
            .unwrap();
        assert!(assessment.action.requires_challenge());
        assert_eq!(storage.access_log.entry_count().unwrap(), 1);
        assert!(engine.get_trusted_contexts("user-1").unwrap().is_empty());
    }

    #[test]
    fn test_evaluate_login_counts_passed_challenge() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = RiskSettings::default();
        let engine = TrustEngine::new(&storage, &settings);

        let mut asked = false;
        let assessment = engine
            .evaluate_login("user-1", &laptop(), true, |assessment| {
                asked = true;
                assessment.action.requires_challenge()
            })
            .unwrap();
        assert!(asked);
        assert!(assessment.action.requires_challenge());

        assert_eq!(engine.get_trusted_contexts("user-1").unwrap().len(), 3);
        let history = engine.login_history("user-1", 10).unwrap();
        assert!(history[0].is_successful());
    }

    #[test]
    fn test_evaluate_login_skips_challenge_on_deny() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = RiskSettings::default();
        let engine = TrustEngine::new(&storage, &settings);

        engine
            .evaluate_login("user-1", &laptop(), false, |_| panic!("no challenge on deny"))
            .unwrap();
        assert!(engine.get_trusted_contexts("user-1").unwrap().is_empty());
    }

    #[test]
    fn test_passed_challenge_builds_trust() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = RiskSettings::default();
        let engine = TrustEngine::new(&storage, &settings);
        let login = laptop();

        let assessment = engine.assess("user-1", &login, true).unwrap();
        engine
            .record_login(
                "user-1",
                &login,
                &assessment,
                LoginOutcome {
                    challenge_passed: Some(true),
                    key_unlocked: true,
                },
            )
            .unwrap();

        assert_eq!(engine.get_trusted_contexts("user-1").unwrap().len(), 3);
        let devices = engine.get_trusted_devices("user-1").unwrap();
        assert_eq!(devices.len(), 1);
        assert!(devices[0].label.as_deref().unwrap().starts_with("Mozilla"));

        let again = engine.assess("user-1", &login, true).unwrap();
        assert!(again.score > assessment.score);
    }

    #[test]
    fn test_disabled_factor_is_not_scored() {
        let (_temp_dir, storage) = create_test_storage();
        let mut settings = RiskSettings::default();
        settings.enabled.location = false;
        let engine = TrustEngine::new(&storage, &settings);

        let assessment = engine.assess("user-1", &laptop(), true).unwrap();
        assert!(assessment.factor(RiskFactor::Location).is_none());
        assert!(assessment.factor(RiskFactor::Ip).is_some());
    }

    #[test]
    fn test_revoke_and_trust_device() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = RiskSettings::default();
        let engine = TrustEngine::new(&storage, &settings);
        let login = laptop();

        let assessment = engine.assess("user-1", &login, true).unwrap();
        let outcome = LoginOutcome {
            challenge_passed: Some(true),
            key_unlocked: false,
        };
        engine
            .record_login("user-1", &login, &assessment, outcome)
            .unwrap();
        let device = engine.get_trusted_devices("user-1").unwrap().remove(0);

        assert!(engine.revoke_device_trust("user-2", device.id).unwrap_err().is_not_found());

        let revoked = engine.revoke_device_trust("user-1", device.id).unwrap();
        assert_eq!(revoked.trust_score, 0.0);
        assert!(engine.get_trusted_devices("user-1").unwrap().is_empty());

        let trusted = engine.trust_device("user-1", device.id).unwrap();
        assert!((trusted.trust_score - 0.95).abs() < 1e-9);
        assert_eq!(engine.get_trusted_devices("user-1").unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_context_id_from_short_form() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = RiskSettings::default();
        let engine = TrustEngine::new(&storage, &settings);
        let login = laptop();

        let assessment = engine.assess("user-1", &login, true).unwrap();
        let outcome = LoginOutcome {
            challenge_passed: Some(true),
            key_unlocked: false,
        };
        engine
            .record_login("user-1", &login, &assessment, outcome)
            .unwrap();
        let device = engine.get_trusted_devices("user-1").unwrap().remove(0);
        let short = device.id.to_string();

        assert_eq!(engine.resolve_context_id("user-1", &short).unwrap(), device.id);
        assert!(engine
            .resolve_context_id("user-2", &short)
            .unwrap_err()
            .is_not_found());

        // Revoked contexts stay addressable so they can be trusted again
        engine.revoke_device_trust("user-1", device.id).unwrap();
        assert_eq!(engine.resolve_context_id("user-1", &short).unwrap(), device.id);
    }

    #[test]
    fn test_revoke_rejects_non_device_context() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = RiskSettings::default();
        let engine = TrustEngine::new(&storage, &settings);
        let login = laptop();

        let assessment = engine.assess("user-1", &login, true).unwrap();
        engine
            .record_login(
                "user-1",
                &login,
                &assessment,
                LoginOutcome {
                    challenge_passed: Some(true),
                    key_unlocked: false,
                },
            )
            .unwrap();
        let ip = engine
            .get_trusted_contexts("user-1")
            .unwrap()
            .into_iter()
            .find(|c| c.context_type == ContextType::Ip)
            .unwrap();

        assert!(engine
            .revoke_device_trust("user-1", ip.id)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_login_history_newest_first() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = RiskSettings::default();
        let engine = TrustEngine::new(&storage, &settings);

        engine.evaluate_login("user-1", &laptop(), false, |_| false).unwrap();
        engine.evaluate_login("user-1", &laptop(), true, |_| false).unwrap();

        let history = engine.login_history("user-1", 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].action, AccessDecision::Deny);
        assert!(history[0].risk_score > 0.0);
    }
}
