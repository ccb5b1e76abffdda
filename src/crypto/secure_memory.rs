//! Secure memory handling for sensitive data
//!
//! Provides types that zero their memory on drop so secrets and raw keys do
//! not linger after the operation that needed them.

use std::fmt;
use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of every symmetric key in this crate (AES-256)
pub const KEY_LEN: usize = 32;

/// A string that zeros its contents on drop
///
/// Used for user secrets: tokens, passphrases and exported private keys.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    pub fn new(s: impl Into<String>) -> Self {
        Self { inner: s.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }
}

impl Deref for SecureString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl AsRef<str> for SecureString {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} bytes]", self.inner.len())
    }
}

/// Generates a fixed-size symmetric key type that zeroizes on drop
macro_rules! define_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Zeroize, ZeroizeOnDrop)]
        pub struct $name {
            bytes: [u8; KEY_LEN],
        }

        impl $name {
            pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
                Self { bytes }
            }

            /// Build a key from a slice, which must be exactly 32 bytes
            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                let bytes: [u8; KEY_LEN] = bytes.try_into().ok()?;
                Some(Self { bytes })
            }

            pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
                &self.bytes
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "([REDACTED])"))
            }
        }
    };
}

define_key!(
    /// A raw data encryption key. Never persisted unwrapped.
    DataKey
);

define_key!(
    /// A key derived from a user secret, used only to wrap a DEK
    WrappingKey
);

impl DataKey {
    /// Generate a fresh random DEK
    pub fn generate() -> Self {
        use rand::RngCore;

        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let key = Self::from_bytes(bytes);
        bytes.zeroize();
        key
    }
}
