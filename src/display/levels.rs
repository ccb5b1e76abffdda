//! Encryption level display formatting

use crate::levels::{EncryptionLevel, FeatureAvailability, LevelChangeCheck, ResolvedEncryption};

/// Format a feature availability table
pub fn format_features(features: &FeatureAvailability) -> String {
    let width = features
        .iter()
        .map(|(f, _)| f.to_string().len())
        .max()
        .unwrap_or(7)
        .max(7);

    let mut output = String::new();
    output.push_str(&format!("{:<width$}  {}\n", "Feature", "Status", width = width));
    output.push_str(&format!("{:-<width$}  {:-<9}\n", "", "", width = width));
    for (feature, status) in features.iter() {
        output.push_str(&format!(
            "{:<width$}  {}\n",
            feature.to_string(),
            status,
            width = width
        ));
    }
    output
}

/// Format the outcome of a level resolution
pub fn format_resolved(resolved: &ResolvedEncryption) -> String {
    let mut output = String::new();
    output.push_str(&format!("Effective level: {}\n", resolved.level));
    output.push_str(&format!("Determined by:   {}\n", resolved.source));
    output.push('\n');
    output.push_str(&format_features(&resolved.features));

    for warning in &resolved.warnings {
        output.push_str(&format!("\nWarning: {}", warning));
    }
    output
}

/// Format every level with its description
pub fn format_level_info(levels: &[EncryptionLevel]) -> String {
    let mut output = String::new();
    for level in levels {
        output.push_str(&format!("{}\n  {}\n", level, level.description()));
    }
    output
}

/// Format a level change check
pub fn format_level_check(check: &LevelChangeCheck) -> String {
    let mut output = if check.allowed {
        "Change allowed".to_string()
    } else {
        "Change NOT allowed".to_string()
    };

    if check.requires_confirmation {
        output.push_str("\n  Requires explicit confirmation");
    }
    if check.requires_current_key {
        output.push_str("\n  Requires your current key to decrypt existing data");
    }
    for warning in &check.warnings {
        output.push_str(&format!("\n  Warning: {}", warning));
    }
    output
}
