use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ledgerlock::cipher::{
    create_blind_index, decrypt_field, encrypt_field, should_encrypt_field, ENCRYPTED_PREFIX,
};
use ledgerlock::crypto::DataKey;
use ledgerlock::levels::{resolve, EncryptionContext, EncryptionLevel, LevelSetting};
use proptest::prelude::*;

const FIELDS: &[(&str, &str)] = &[
    ("accounts", "account_number"),
    ("accounts", "routing_number"),
    ("accounts", "name"),
    ("accounts", "institution"),
    ("accounts", "notes"),
    ("accounts", "balance_memo"),
    ("payees", "name"),
    ("payees", "notes"),
    ("transactions", "payee_name"),
    ("transactions", "description"),
    ("transactions", "memo"),
    ("transactions", "account_id"),
    ("categories", "name"),
    ("budgets", "notes"),
];

fn level() -> impl Strategy<Value = EncryptionLevel> {
    (0u8..=4).prop_map(|n| EncryptionLevel::try_from(n).unwrap())
}

fn setting() -> impl Strategy<Value = LevelSetting> {
    prop_oneof![Just(LevelSetting::Inherit), level().prop_map(LevelSetting::Level)]
}

fn key() -> impl Strategy<Value = DataKey> {
    any::<[u8; 32]>().prop_map(DataKey::from_bytes)
}

proptest! {
    #[test]
    fn field_round_trips(plaintext in ".*", dek in key()) {
        let encrypted = encrypt_field(&plaintext, &dek).unwrap();
        prop_assert!(encrypted.starts_with(ENCRYPTED_PREFIX));
        prop_assert_eq!(decrypt_field(&encrypted, &dek).unwrap(), plaintext);
    }

    #[test]
    fn unprefixed_values_pass_through(value in ".*", dek in key()) {
        prop_assume!(!value.starts_with(ENCRYPTED_PREFIX));
        prop_assert_eq!(decrypt_field(&value, &dek).unwrap(), value);
    }

    #[test]
    fn blind_index_ignores_case_and_spacing(
        words in proptest::collection::vec("[a-zA-Z0-9]{1,8}", 1..5),
        dek in key(),
    ) {
        let plain = words.join(" ");
        let noisy = format!("  {}  ", words.join("   ").to_uppercase());

        let index = create_blind_index(&plain, &dek).unwrap();
        prop_assert_eq!(&index, &create_blind_index(&plain, &dek).unwrap());
        prop_assert_eq!(index, create_blind_index(&noisy, &dek).unwrap());
    }

    #[test]
    fn tampered_ciphertext_never_decrypts(
        plaintext in ".{1,64}",
        flip in any::<u8>().prop_filter("non-zero", |b| *b != 0),
        dek in key(),
    ) {
        let encrypted = encrypt_field(&plaintext, &dek).unwrap();
        let (head, body) = encrypted.rsplit_once(':').unwrap();

        let mut bytes = STANDARD.decode(body).unwrap();
        bytes[0] ^= flip;
        let tampered = format!("{}:{}", head, STANDARD.encode(bytes));

        prop_assert!(decrypt_field(&tampered, &dek).is_err());
    }

    #[test]
    fn higher_levels_encrypt_a_superset(lower in level(), higher in level()) {
        prop_assume!(lower <= higher);
        for (table, field) in FIELDS {
            if should_encrypt_field(table, field, lower) {
                prop_assert!(
                    should_encrypt_field(table, field, higher),
                    "{}.{} encrypted at {} but not at {}", table, field, lower, higher
                );
            }
        }
    }

    #[test]
    fn account_never_resolves_below_workspace(
        user in proptest::option::of(level()),
        workspace in setting(),
        account in setting(),
        default in level(),
    ) {
        let resolved = resolve(&EncryptionContext::new(user, workspace, account), default);
        let user_level = user.unwrap_or(default);
        let workspace_level = match workspace {
            LevelSetting::Inherit => user_level,
            LevelSetting::Level(level) => level,
        };

        prop_assert!(resolved.level >= workspace_level);
        prop_assert_eq!(resolved.features, resolved.level.features());
    }
}
