//! Key status display formatting
//!
//! Never prints secrets; a freshly generated secret is shown only through
//! [`format_new_secret`], once.

use crate::keys::KeyStatus;
use crate::models::KeyType;

/// Format a list of key statuses as a table
pub fn format_key_list(keys: &[KeyStatus]) -> String {
    if keys.is_empty() {
        return "No encryption keys found.".to_string();
    }

    let target_width = keys
        .iter()
        .map(|k| k.target.to_string().len())
        .max()
        .unwrap_or(6)
        .max(6);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<target_width$}  {:<10}  {:>7}  {:<10}  {}\n",
        "Target",
        "Type",
        "Version",
        "Created",
        "Last used",
        target_width = target_width,
    ));
    output.push_str(&format!(
        "{:-<target_width$}  {:-<10}  {:->7}  {:-<10}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        target_width = target_width,
    ));

    for key in keys {
        output.push_str(&format!(
            "{:<target_width$}  {:<10}  {:>7}  {:<10}  {}\n",
            key.target.to_string(),
            key.key_type.to_string(),
            key.version,
            key.created_at.format("%Y-%m-%d"),
            key.last_used_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
            target_width = target_width,
        ));
    }

    output
}

/// Format a single key's details
pub fn format_key_details(key: &KeyStatus) -> String {
    let mut output = String::new();
    output.push_str(&format!("Target:   {}\n", key.target));
    output.push_str(&format!("Type:     {}\n", key.key_type));
    output.push_str(&format!("Version:  {}\n", key.version));
    output.push_str(&format!(
        "Created:  {}\n",
        key.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(rotated) = key.rotated_at {
        output.push_str(&format!(
            "Rotated:  {}\n",
            rotated.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if let Some(public_key) = &key.public_key {
        output.push_str(&format!("Public:   {}\n", public_key));
    }
    output
}

/// The one-time display of a new secret
pub fn format_new_secret(key_type: KeyType, secret: &str) -> String {
    match key_type {
        KeyType::Passphrase => {
            "Your passphrase now protects this data. It cannot be recovered if forgotten."
                .to_string()
        }
        KeyType::Token => format!(
            "Your access token (shown once, store it somewhere safe):\n\n  {}\n\n\
             Losing this token means losing access to the encrypted data.",
            secret
        ),
        KeyType::Keypair => format!(
            "Your private key (shown once, store it somewhere safe):\n\n  {}\n\n\
             Losing this key means losing access to the encrypted data.",
            secret
        ),
    }
}
