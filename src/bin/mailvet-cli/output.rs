use anyhow::{Result, bail};

#[cfg(feature = "with-csv")]
use mailvet::Check;
use mailvet::{BatchSummary, SmtpDetails, ValidationResult};

pub fn write_result(result: &ValidationResult, format: &str) -> Result<()> {
    match format {
        "human" => {
            for line in human_lines(result) {
                println!("{line}");
            }
            Ok(())
        }
        "json" => write_json(result),
        other => bail!("unknown --format '{other}', use: human|json"),
    }
}

#[cfg(feature = "with-serde")]
fn write_json(result: &ValidationResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_json(_: &ValidationResult) -> Result<()> {
    bail!("format=json nécessite la feature 'with-serde'")
}

pub fn human_lines(result: &ValidationResult) -> Vec<String> {
    let mut lines = Vec::new();
    let head = format!(
        "confidence={} tier={} risk={}({})",
        result.confidence_score, result.tier, result.risk.level, result.risk.score
    );
    if result.valid {
        lines.push(format!("[OK]      {} {head}", result.email));
    } else if result.reasons.is_empty() {
        lines.push(format!("[INVALID] {} {head}", result.email));
    } else {
        lines.push(format!(
            "[INVALID] {} :: {}",
            result.email,
            result.reasons.join("; ")
        ));
    }

    if !result.checks.is_empty() {
        let checks: Vec<String> = result
            .checks
            .iter()
            .map(|(check, value)| format!("{check}={}", tri_state(value)))
            .collect();
        lines.push(format!("          checks: {}", checks.join(" ")));
    }
    if let Some(smtp) = &result.smtp_details {
        lines.push(format!("          smtp: {}", smtp_summary(smtp)));
    }
    if let Some(suggestion) = &result.suggestion {
        lines.push(format!("          did you mean: {suggestion}"));
    }
    if let Some(provider) = result
        .enrichment
        .as_ref()
        .and_then(|e| e.provider.as_deref())
    {
        lines.push(format!("          provider: {provider}"));
    }
    if !result.risk.factors.is_empty() {
        lines.push(format!("          risk: {}", result.risk.factors.join("; ")));
    }
    lines
}

pub fn summary_line(summary: &BatchSummary) -> String {
    format!(
        "{}/{} processed, {} valid, {} invalid, {} stored in {} ms{}",
        summary.processed,
        summary.total,
        summary.valid,
        summary.invalid,
        summary.stored,
        summary.elapsed.as_millis(),
        if summary.cancelled { " (cancelled)" } else { "" }
    )
}

pub fn tri_state(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "true",
        Some(false) => "false",
        None => "null",
    }
}

/// valeur d'une colonne CSV: vide si le check n'a pas été tenté
#[cfg(feature = "with-csv")]
pub fn check_cell(result: &ValidationResult, check: Check) -> &'static str {
    match result.checks.get(check) {
        Some(value) => tri_state(value),
        None => "",
    }
}

fn smtp_summary(smtp: &SmtpDetails) -> String {
    let mut parts = vec![smtp.status.to_string()];
    if let Some(code) = smtp.code {
        parts.push(format!("code={code}"));
    }
    if let Some(host) = &smtp.mx_host {
        parts.push(format!("host={host}"));
    }
    if smtp.catch_all == Some(true) {
        parts.push("catch-all".to_string());
    }
    if smtp.blocked {
        parts.push("blocked".to_string());
    }
    if let Some(reason) = &smtp.reason {
        parts.push(format!("({reason})"));
    }
    parts.join(" ")
}
