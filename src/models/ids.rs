//! Strongly-typed ID wrappers for security records
//!
//! Newtype wrappers keep key ids, context ids and log ids from being mixed
//! up at compile time. Ids display in a short prefixed form
//! (`ctx-1a2b3c4d`); `matches` lets the CLI accept that form back.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Hex characters shown in the short display form
const SHORT_LEN: usize = 8;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Does `input` name this id, in full or by its short form?
            ///
            /// The prefix is optional; at least the displayed characters
            /// must be given.
            pub fn matches(&self, input: &str) -> bool {
                let input = input.trim();
                let bare = input.strip_prefix($prefix).unwrap_or(input).to_ascii_lowercase();
                bare.len() >= SHORT_LEN && self.0.hyphenated().to_string().starts_with(&bare)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let full = self.0.hyphenated().to_string();
                write!(f, "{}{}", $prefix, &full[..SHORT_LEN])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        /// Parses a full UUID, with or without the prefix
        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Uuid::parse_str(s.strip_prefix($prefix).unwrap_or(s)).map(Self)
            }
        }
    };
}

define_id!(
    /// Identifies one stored encryption key record
    KeyId,
    "key-"
);
define_id!(
    /// Identifies one trusted login context
    ContextId,
    "ctx-"
);
define_id!(AccessLogId, "log-");

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_short_display() {
        let id = KeyId::from(Uuid::parse_str(UUID).unwrap());
        assert_eq!(id.to_string(), "key-550e8400");
    }

    #[test]
    fn test_serializes_as_plain_uuid() {
        let id = ContextId::from(Uuid::parse_str(UUID).unwrap());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", UUID));

        let back: ContextId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_parse_full_with_or_without_prefix() {
        let plain: ContextId = UUID.parse().unwrap();
        let prefixed: ContextId = format!("ctx-{}", UUID).parse().unwrap();
        assert_eq!(plain, prefixed);
        assert!("ctx-550e8400".parse::<ContextId>().is_err());
    }

    #[test]
    fn test_matches_short_form() {
        let id = ContextId::from(Uuid::parse_str(UUID).unwrap());

        assert!(id.matches("ctx-550e8400"));
        assert!(id.matches("550E8400"));
        assert!(id.matches(UUID));
        assert!(id.matches(" ctx-550e8400-e29b "));
        assert!(!id.matches("ctx-550e"));
        assert!(!id.matches("ctx-00000000"));
    }
}
