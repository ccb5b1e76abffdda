//! Field-level encryption engine
//!
//! Stateless transforms over single values and whole records, driven by a
//! raw DEK that the caller has already unwrapped.

pub mod field;
pub mod policy;
pub mod record;

pub use field::{
    create_blind_index, decrypt_field, encrypt_field, is_encrypted, is_field_ciphertext,
    normalize_for_index, ENCRYPTED_PREFIX,
};
pub use policy::{encrypted_fields, is_searchable_field, should_encrypt_field};
pub use record::{
    decrypt_record, decrypt_records, encrypt_record, encrypt_records, DecryptedBatch,
    FieldFailure, Record,
};
