//! Envelope key management
//!
//! Each protected target has one random 256-bit DEK. The DEK is wrapped with
//! AES-256-GCM under a key derived from a secret only the user holds, so the
//! stored record alone can never decrypt anything.

pub mod manager;
pub mod secret;
pub mod service;
pub mod wrap;

pub use manager::{GeneratedKey, KeyManager, KeyManagerConfig};
pub use secret::{
    check_secret_shape, generate_keypair, generate_token, mask_secret, public_key_for,
    MIN_PASSPHRASE_LEN, PRIVATE_KEY_PREFIX, PUBLIC_KEY_PREFIX, TOKEN_PREFIX,
};
pub use service::{KeyService, KeyStatus};
pub use wrap::{unwrap_dek, wrap_dek};
