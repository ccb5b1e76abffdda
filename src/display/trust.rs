//! Trust and access display formatting

use crate::audit::AccessLogEntry;
use crate::models::TrustedContext;
use crate::trust::RiskAssessment;

/// Format trusted contexts as a table
pub fn format_context_list(contexts: &[TrustedContext]) -> String {
    if contexts.is_empty() {
        return "No trusted contexts found.".to_string();
    }

    let label_width = contexts
        .iter()
        .map(|c| c.label.as_deref().map_or(1, |l| l.chars().count()))
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<8}  {:>5}  {:>5}  {:<16}  {:<label_width$}  {}\n",
        "ID",
        "Type",
        "Trust",
        "Seen",
        "Last seen",
        "Label",
        "Status",
        label_width = label_width,
    ));
    output.push_str(&format!(
        "{:-<12}  {:-<8}  {:->5}  {:->5}  {:-<16}  {:-<label_width$}  {:-<8}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        label_width = label_width,
    ));

    for context in contexts {
        let status = if context.is_revoked() {
            "revoked"
        } else if context.explicitly_trusted {
            "trusted"
        } else {
            "learned"
        };
        output.push_str(&format!(
            "{:<12}  {:<8}  {:>5.2}  {:>5}  {:<16}  {:<label_width$}  {}\n",
            context.id.to_string(),
            context.context_type.to_string(),
            context.trust_score,
            context.seen_count,
            context.last_seen.format("%Y-%m-%d %H:%M"),
            context.label.as_deref().unwrap_or("-"),
            status,
            label_width = label_width,
        ));
    }

    output
}

/// Format a risk assessment with per-factor breakdown
pub fn format_assessment(assessment: &RiskAssessment) -> String {
    let mut output = format!(
        "Risk score: {:.1} / 100\nDecision:   {}\n\n",
        assessment.score, assessment.action
    );
    for factor in &assessment.factors {
        output.push_str(&format!(
            "  {:<14} weight {:>5.1}  match {:>4.0}%\n",
            factor.factor.to_string(),
            factor.weight,
            factor.score * 100.0
        ));
    }
    output
}

/// Format access log entries, one per line
pub fn format_history(entries: &[AccessLogEntry]) -> String {
    if entries.is_empty() {
        return "No login history.".to_string();
    }
    entries
        .iter()
        .map(AccessLogEntry::format_human_readable)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContextType;
    use crate::trust::{FactorScore, RiskFactor, RiskSettings};

    #[test]
    fn test_format_context_list() {
        let mut ctx = TrustedContext::new("u", ContextType::Device, "h", 0.5);
        ctx.label = Some("Firefox on Linux".into());
        let text = format_context_list(&[ctx.clone()]);
        assert!(text.contains("Firefox on Linux"));
        assert!(text.contains("learned"));

        ctx.revoke();
        assert!(format_context_list(&[ctx]).contains("revoked"));
        assert_eq!(format_context_list(&[]), "No trusted contexts found.");
    }

    #[test]
    fn test_format_assessment() {
        let assessment = RiskAssessment::from_factors(
            vec![
                FactorScore {
                    factor: RiskFactor::Password,
                    weight: 30.0,
                    score: 1.0,
                },
                FactorScore {
                    factor: RiskFactor::Device,
                    weight: 25.0,
                    score: 0.3,
                },
            ],
            &RiskSettings::default(),
        );
        let text = format_assessment(&assessment);
        assert!(text.contains("Risk score"));
        assert!(text.contains("device"));
    }
}
