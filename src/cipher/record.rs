//! Record-level batch encryption
//!
//! Records are JSON objects of any shape. Only string fields selected by the
//! level policy are transformed; numbers, booleans and nested values are left
//! alone. Decryption never aborts a batch: a field that fails to decrypt is
//! logged, reported in the result, and left in its encrypted form.

use serde::Serialize;
use serde_json::{Map, Value};

use super::field::{
    create_blind_index, decrypt_field, encrypt_field, is_encrypted, is_field_ciphertext,
};
use super::policy::{blind_index_column, is_searchable_field, should_encrypt_field};
use crate::crypto::DataKey;
use crate::error::LedgerLockResult;
use crate::levels::EncryptionLevel;

/// A database row as a JSON object
pub type Record = Map<String, Value>;

/// A field that could not be decrypted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub record_index: usize,
    pub field: String,
    pub error: String,
}

/// Decrypted records plus any per-field soft failures
#[derive(Debug, Clone, Default)]
pub struct DecryptedBatch {
    pub records: Vec<Record>,
    pub failures: Vec<FieldFailure>,
}

impl DecryptedBatch {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Encrypt the policy-selected string fields of one record
///
/// Values that already parse as encrypted fields are left as they are;
/// plaintext that merely starts with `enc:v` is encrypted like any other. Searchable
/// fields also get a blind-index column computed from the plaintext.
pub fn encrypt_record(
    table: &str,
    record: &Record,
    level: EncryptionLevel,
    dek: &DataKey,
) -> LedgerLockResult<Record> {
    let mut out = record.clone();

    for (field, value) in record {
        let Value::String(plaintext) = value else {
            continue;
        };
        if is_field_ciphertext(plaintext) || !should_encrypt_field(table, field, level) {
            continue;
        }

        out.insert(field.clone(), Value::String(encrypt_field(plaintext, dek)?));

        if is_searchable_field(table, field) {
            out.insert(
                blind_index_column(field),
                Value::String(create_blind_index(plaintext, dek)?),
            );
        }
    }

    Ok(out)
}

/// Decrypt one record, collecting failures instead of returning early
fn decrypt_record_at(
    table: &str,
    record: &Record,
    level: EncryptionLevel,
    dek: &DataKey,
    record_index: usize,
    failures: &mut Vec<FieldFailure>,
) -> Record {
    let mut out = record.clone();

    for (field, value) in record {
        let Value::String(ciphertext) = value else {
            continue;
        };
        if !is_encrypted(ciphertext) || !should_encrypt_field(table, field, level) {
            continue;
        }

        match decrypt_field(ciphertext, dek) {
            Ok(plaintext) => {
                out.insert(field.clone(), Value::String(plaintext));
            }
            Err(e) => {
                tracing::warn!(
                    table,
                    field = field.as_str(),
                    record_index,
                    error = %e,
                    "field decryption failed; leaving value encrypted"
                );
                failures.push(FieldFailure {
                    record_index,
                    field: field.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    out
}

/// Decrypt the policy-selected fields of one record
pub fn decrypt_record(
    table: &str,
    record: &Record,
    level: EncryptionLevel,
    dek: &DataKey,
) -> DecryptedBatch {
    let mut failures = Vec::new();
    let record = decrypt_record_at(table, record, level, dek, 0, &mut failures);
    DecryptedBatch {
        records: vec![record],
        failures,
    }
}

/// Encrypt a batch of records from one table
pub fn encrypt_records(
    table: &str,
    records: &[Record],
    level: EncryptionLevel,
    dek: &DataKey,
) -> LedgerLockResult<Vec<Record>> {
    records
        .iter()
        .map(|record| encrypt_record(table, record, level, dek))
        .collect()
}

/// Decrypt a batch of records from one table
pub fn decrypt_records(
    table: &str,
    records: &[Record],
    level: EncryptionLevel,
    dek: &DataKey,
) -> DecryptedBatch {
    let mut failures = Vec::new();
    let records = records
        .iter()
        .enumerate()
        .map(|(i, record)| decrypt_record_at(table, record, level, dek, i, &mut failures))
        .collect();

    if !failures.is_empty() {
        tracing::warn!(table, failed_fields = failures.len(), "batch decrypted with failures");
    }

    DecryptedBatch { records, failures }
}
