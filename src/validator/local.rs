pub(crate) const MAX_LOCAL_LEN: usize = 64;

/// Push des raisons invalidantes pour la partie locale dans `reasons`.
pub(crate) fn check_local(local: &str, reasons: &mut Vec<String>) {
    if local.is_empty() || local.len() > MAX_LOCAL_LEN {
        reasons.push(format!(
            "local part length {} invalid (1..={MAX_LOCAL_LEN})",
            local.len()
        ));
        if local.is_empty() {
            return;
        }
    }
    if local.starts_with('.') || local.ends_with('.') {
        reasons.push("local part cannot start/end with '.'".to_string());
    }
    if local.contains("..") {
        reasons.push("local part cannot contain consecutive dots".to_string());
    }
    if !local.chars().all(is_atext_or_dot) {
        reasons.push("local part has invalid chars".to_string());
    }
}

/// atext ASCII (RFC 5322) + '.'
fn is_atext_or_dot(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
                | '.'
        )
}
