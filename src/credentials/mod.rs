//! Provider credential encryption
//!
//! Third-party API keys (AI categorisation providers) are encrypted with
//! AES-256-GCM under a master key stretched with Argon2id from a secret
//! supplied through the environment. There is no built-in fallback key: if
//! the master secret is missing, nothing can be encrypted or decrypted.
//!
//! The per-provider format checks are advisory only.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::{
    derive_argon2, open, run_with_timeout, seal, Argon2Cost, SealedParts, SecureString,
    WrappingKey,
};
use crate::error::{LedgerLockError, LedgerLockResult};

pub const MASTER_SECRET_ENV: &str = "LEDGERLOCK_MASTER_SECRET";
pub const MASTER_SALT_ENV: &str = "LEDGERLOCK_MASTER_SALT";

/// Salt used when no salt is configured
const DEFAULT_SALT: &str = "ledgerlock-provider-credentials";

/// Argon2 rejects salts shorter than this
const MIN_SALT_LEN: usize = 8;

/// AI providers whose keys can be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Groq,
    Google,
    OpenRouter,
    Mistral,
}

impl Provider {
    pub const ALL: [Provider; 6] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Groq,
        Provider::Google,
        Provider::OpenRouter,
        Provider::Mistral,
    ];

    /// Whether `api_key` looks like a key for this provider
    pub fn accepts(&self, api_key: &str) -> bool {
        let key = api_key.trim();
        match self {
            Provider::Anthropic => key.starts_with("sk-ant-"),
            Provider::OpenRouter => key.starts_with("sk-or-"),
            Provider::OpenAi => {
                key.starts_with("sk-") && !key.starts_with("sk-ant-") && !key.starts_with("sk-or-")
            }
            Provider::Groq => key.starts_with("gsk_"),
            Provider::Google => key.starts_with("AIza"),
            Provider::Mistral => key.len() == 32 && key.chars().all(|c| c.is_ascii_alphanumeric()),
        }
    }

    /// Guess the provider from the key's shape
    pub fn detect(api_key: &str) -> Option<Provider> {
        Self::ALL.into_iter().find(|p| p.accepts(api_key))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Anthropic => write!(f, "anthropic"),
            Provider::Groq => write!(f, "groq"),
            Provider::Google => write!(f, "google"),
            Provider::OpenRouter => write!(f, "openrouter"),
            Provider::Mistral => write!(f, "mistral"),
        }
    }
}

impl FromStr for Provider {
    type Err = LedgerLockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.to_string() == s.trim().to_lowercase())
            .ok_or_else(|| LedgerLockError::Validation(format!("Unknown provider: {}", s)))
    }
}

/// Encrypts and decrypts provider API keys under the master key
pub struct CredentialCipher {
    key: WrappingKey,
}

impl CredentialCipher {
    /// Build from `LEDGERLOCK_MASTER_SECRET` / `LEDGERLOCK_MASTER_SALT`
    pub fn from_env(cost: Argon2Cost, timeout: Duration) -> LedgerLockResult<Self> {
        let secret = std::env::var(MASTER_SECRET_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(SecureString::new)
            .ok_or_else(|| {
                LedgerLockError::Config(format!(
                    "{} is not set; provider credentials cannot be protected",
                    MASTER_SECRET_ENV
                ))
            })?;
        let salt = std::env::var(MASTER_SALT_ENV).ok();

        Self::from_secret(&secret, salt.as_deref(), cost, timeout)
    }

    pub fn from_secret(
        secret: &SecureString,
        salt: Option<&str>,
        cost: Argon2Cost,
        timeout: Duration,
    ) -> LedgerLockResult<Self> {
        if secret.trim().is_empty() {
            return Err(LedgerLockError::Config("Master secret is empty".into()));
        }

        let salt = salt
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SALT)
            .to_string();
        if salt.len() < MIN_SALT_LEN {
            return Err(LedgerLockError::Config(format!(
                "{} must be at least {} bytes",
                MASTER_SALT_ENV, MIN_SALT_LEN
            )));
        }

        let secret = secret.clone();
        let key = run_with_timeout("credential key derivation", timeout, move || {
            derive_argon2(secret.as_bytes(), salt.as_bytes(), &cost)
        })?;

        Ok(Self { key })
    }

    /// Encrypt an API key as `<ivHex>:<tagHex>:<ciphertextHex>`
    pub fn encrypt(&self, api_key: &str) -> LedgerLockResult<String> {
        if api_key.trim().is_empty() {
            return Err(LedgerLockError::Validation("API key cannot be empty".into()));
        }
        Ok(seal(self.key.as_bytes(), api_key.trim().as_bytes())?.to_hex())
    }

    pub fn decrypt(&self, encrypted: &str) -> LedgerLockResult<SecureString> {
        let parts = SealedParts::from_hex(encrypted, "Encrypted credential")?;
        let plaintext = zeroize::Zeroizing::new(open(self.key.as_bytes(), &parts)?);

        let text = std::str::from_utf8(&plaintext).map_err(|_| {
            LedgerLockError::Format("Decrypted credential is not valid UTF-8".into())
        })?;
        Ok(SecureString::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2Cost {
        Argon2Cost {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    fn cipher(secret: &str) -> CredentialCipher {
        CredentialCipher::from_secret(
            &SecureString::new(secret),
            None,
            cheap(),
            Duration::from_secs(30),
        )
        .unwrap()
    }

    #[test]
    fn test_encrypt_decrypt() {
        let c = cipher("master secret for tests");
        let encrypted = c.encrypt("sk-ant-api03-abcdef").unwrap();
        assert_eq!(encrypted.split(':').count(), 3);
        assert!(!encrypted.contains("abcdef"));
        assert_eq!(c.decrypt(&encrypted).unwrap().as_str(), "sk-ant-api03-abcdef");
    }

    #[test]
    fn test_wrong_master_secret_fails() {
        let encrypted = cipher("master secret one").encrypt("gsk_123").unwrap();
        let err = cipher("master secret two").decrypt(&encrypted).unwrap_err();
        assert!(matches!(err, LedgerLockError::Tampered(_)));
    }

    #[test]
    fn test_missing_secret_fails_closed() {
        let result = CredentialCipher::from_secret(
            &SecureString::new("  "),
            None,
            cheap(),
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(LedgerLockError::Config(_))));
    }

    #[test]
    fn test_short_salt_rejected() {
        let result = CredentialCipher::from_secret(
            &SecureString::new("master"),
            Some("abc"),
            cheap(),
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(LedgerLockError::Config(_))));
    }

    #[test]
    fn test_provider_detection() {
        assert_eq!(Provider::detect("sk-ant-api03-x"), Some(Provider::Anthropic));
        assert_eq!(Provider::detect("sk-or-v1-x"), Some(Provider::OpenRouter));
        assert_eq!(Provider::detect("sk-proj-x"), Some(Provider::OpenAi));
        assert_eq!(Provider::detect("gsk_x"), Some(Provider::Groq));
        assert_eq!(Provider::detect("AIzaSyX"), Some(Provider::Google));
        assert_eq!(
            Provider::detect("abcdefghijklmnopqrstuvwxyz012345"),
            Some(Provider::Mistral)
        );
        assert_eq!(Provider::detect("hello"), None);
        assert!(!Provider::OpenAi.accepts("sk-ant-api03-x"));
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert!("acme".parse::<Provider>().unwrap_err().is_validation());
    }
}
