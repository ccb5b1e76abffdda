//! Which fields each encryption level protects
//!
//! Levels are cumulative: each tier encrypts everything the tier below it
//! does plus its own additions. Zero knowledge uses a wildcard that covers
//! every string field except structural ones (ids, timestamps, blind
//! indexes), which must stay readable for lookups and joins.

use std::collections::BTreeMap;

use crate::levels::EncryptionLevel;

/// Matches every non-structural string field
pub const WILDCARD: &str = "*";

/// Suffix of the companion column holding a field's blind index
pub const BLIND_INDEX_SUFFIX: &str = "_bidx";

type TableFields = &'static [(&'static str, &'static [&'static str])];

/// Fields added at each level (not cumulative)
const LEVEL_ADDITIONS: [TableFields; 4] = [
    // None
    &[],
    // Basic
    &[("accounts", &["account_number", "routing_number"])],
    // Enhanced PII
    &[
        ("accounts", &["name", "institution"]),
        ("payees", &["name"]),
        ("transactions", &["payee_name"]),
    ],
    // Full field
    &[
        ("accounts", &["notes"]),
        ("transactions", &["description", "memo", "notes"]),
        ("payees", &["notes"]),
        ("categories", &["name", "notes"]),
        ("budgets", &["name", "notes"]),
    ],
];

/// Fields that get a blind index when they are encrypted
const SEARCHABLE_FIELDS: TableFields = &[
    ("accounts", &["account_number"]),
    ("payees", &["name"]),
    ("transactions", &["payee_name"]),
];

/// True for ids, timestamps and blind-index columns
pub fn is_structural_field(field: &str) -> bool {
    field == "id"
        || field.ends_with("_id")
        || field.ends_with("_at")
        || field.ends_with(BLIND_INDEX_SUFFIX)
}

/// Cumulative table → field list for a level
///
/// Zero knowledge maps to a single wildcard entry.
pub fn encrypted_fields(level: EncryptionLevel) -> BTreeMap<&'static str, Vec<&'static str>> {
    let mut map: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();

    if level == EncryptionLevel::ZeroKnowledge {
        map.insert(WILDCARD, vec![WILDCARD]);
        return map;
    }

    for additions in LEVEL_ADDITIONS.iter().take(level.as_u8() as usize + 1) {
        for (table, fields) in additions.iter() {
            map.entry(*table).or_default().extend(fields.iter().copied());
        }
    }

    map
}

/// Should `table.field` be encrypted at `level`?
pub fn should_encrypt_field(table: &str, field: &str, level: EncryptionLevel) -> bool {
    if is_structural_field(field) {
        return false;
    }
    if level == EncryptionLevel::ZeroKnowledge {
        return true;
    }

    LEVEL_ADDITIONS
        .iter()
        .take(level.as_u8() as usize + 1)
        .flat_map(|additions| additions.iter())
        .any(|(t, fields)| *t == table && fields.contains(&field))
}

/// Does `table.field` carry a blind index alongside its ciphertext?
pub fn is_searchable_field(table: &str, field: &str) -> bool {
    SEARCHABLE_FIELDS
        .iter()
        .any(|(t, fields)| *t == table && fields.contains(&field))
}

/// Name of the blind-index column for a field
pub fn blind_index_column(field: &str) -> String {
    format!("{}{}", field, BLIND_INDEX_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use EncryptionLevel::*;

    #[test]
    fn test_level_none_encrypts_nothing() {
        assert!(encrypted_fields(None).is_empty());
        assert!(!should_encrypt_field("accounts", "account_number", None));
    }

    #[test]
    fn test_levels_are_cumulative() {
        assert!(should_encrypt_field("accounts", "account_number", Basic));
        assert!(!should_encrypt_field("payees", "name", Basic));
        assert!(should_encrypt_field("payees", "name", EnhancedPii));
        assert!(should_encrypt_field("accounts", "account_number", FullField));
        assert!(should_encrypt_field("transactions", "memo", FullField));
        assert!(!should_encrypt_field("transactions", "memo", EnhancedPii));
    }

    #[test]
    fn test_wildcard_level() {
        assert!(should_encrypt_field("anything", "whatever", ZeroKnowledge));
        assert!(!should_encrypt_field("transactions", "id", ZeroKnowledge));
        assert!(!should_encrypt_field("transactions", "account_id", ZeroKnowledge));
        assert!(!should_encrypt_field("transactions", "created_at", ZeroKnowledge));
        assert!(!should_encrypt_field("payees", "name_bidx", ZeroKnowledge));
        assert_eq!(encrypted_fields(ZeroKnowledge)[WILDCARD], vec![WILDCARD]);
    }

    #[test]
    fn test_encrypted_fields_map() {
        let map = encrypted_fields(FullField);
        assert_eq!(
            map["accounts"],
            vec!["account_number", "routing_number", "name", "institution", "notes"]
        );
        assert!(map.contains_key("categories"));
    }

    #[test]
    fn test_searchable_fields() {
        assert!(is_searchable_field("payees", "name"));
        assert!(!is_searchable_field("payees", "notes"));
        assert_eq!(blind_index_column("name"), "name_bidx");
    }
}
