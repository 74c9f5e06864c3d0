//! Syntax validation: pure, deterministic, no I/O.

mod domain;
mod local;
mod types;

pub use types::{EmailAddress, SyntaxError, SyntaxReport};

use domain::check_domain;
use local::check_local;

/// RFC 5321: 254 max avec le '@'.
pub const MAX_EMAIL_LEN: usize = 254;

pub fn check_syntax(email: &str) -> SyntaxReport {
    let input = email.trim();

    let mut reasons = Vec::new();

    if input.len() > MAX_EMAIL_LEN {
        reasons.push(format!("total length {} > {MAX_EMAIL_LEN}", input.len()));
    }

    // doit contenir exactement un '@'
    let parts: Vec<&str> = input.split('@').collect();
    if parts.len() != 2 {
        reasons.push("must contain exactly one '@'".to_string());
        return SyntaxReport {
            valid: false,
            address: None,
            reasons,
        };
    }
    let (local, domain) = (parts[0], parts[1]);

    check_local(local, &mut reasons);
    let ascii_domain = check_domain(domain, &mut reasons);

    // la limite vaut aussi pour la forme punycode, celle qui part sur le réseau
    if let Some(ascii) = &ascii_domain {
        let ascii_len = local.len() + 1 + ascii.len();
        if ascii_len > MAX_EMAIL_LEN && input.len() <= MAX_EMAIL_LEN {
            reasons.push(format!(
                "length after IDNA conversion {ascii_len} > {MAX_EMAIL_LEN}"
            ));
        }
    }

    match ascii_domain {
        Some(ascii) if reasons.is_empty() => SyntaxReport {
            valid: true,
            address: Some(EmailAddress::new(local, domain, ascii)),
            reasons,
        },
        _ => SyntaxReport {
            valid: false,
            address: None,
            reasons,
        },
    }
}

/// Variante `Result` de [`check_syntax`].
pub fn parse_email(email: &str) -> Result<EmailAddress, SyntaxError> {
    let report = check_syntax(email);
    match report.address {
        Some(address) => Ok(address),
        None => Err(SyntaxError {
            reasons: report.reasons,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_basic() {
        let r = check_syntax("alice@example.com");
        assert!(r.valid, "{:?}", r.reasons);
        let address = r.address.expect("address");
        assert_eq!(address.local(), "alice");
        assert_eq!(address.ascii_domain(), "example.com");
    }

    #[test]
    fn rejects_double_at() {
        let r = check_syntax("bad@@domain");
        assert!(!r.valid);
        assert!(r.address.is_none());
        assert_eq!(r.reasons, vec!["must contain exactly one '@'".to_string()]);
    }

    #[test]
    fn rejects_empty_parts() {
        assert!(!check_syntax("@example.com").valid);
        assert!(!check_syntax("alice@").valid);
        assert!(!check_syntax("").valid);
    }

    #[test]
    fn rejects_overlong_address() {
        let local = "a".repeat(64);
        let domain = format!("{}.{}.{}.com", "b".repeat(63), "c".repeat(63), "d".repeat(63));
        let r = check_syntax(&format!("{local}@{domain}"));
        assert!(!r.valid);
        assert!(r.reasons.iter().any(|reason| reason.starts_with("total length")));
    }

    #[test]
    fn punycode_expansion_counts_toward_the_limit() {
        // 57 octets UTF-8 par label, 63 une fois en punycode
        let label = format!("ä{}", "b".repeat(55));
        let input = format!("{}@{label}.{label}.{label}.com", "a".repeat(64));
        assert!(input.len() <= MAX_EMAIL_LEN);

        let r = check_syntax(&input);
        assert!(!r.valid);
        assert_eq!(r.reasons, vec!["length after IDNA conversion 260 > 254".to_string()]);
    }

    #[cfg(feature = "with-serde")]
    #[test]
    fn deserializing_an_address_revalidates_it() {
        let address = parse_email("Alice@Exämple.com").expect("valid");
        let json = serde_json::to_string(&address).expect("json");
        let back: EmailAddress = serde_json::from_str(&json).expect("round trip");
        assert_eq!(back, address);

        let forged = r#"{"local":"..alice","domain":"not a domain","ascii_domain":"x"}"#;
        let err = serde_json::from_str::<EmailAddress>(forged).expect_err("rejected");
        assert!(err.to_string().contains("invalid email syntax"), "{err}");
    }

    #[test]
    fn normalized_lowercases_and_trims() {
        let address = parse_email("  Alice.Smith@Exämple.COM ").expect("valid");
        assert_eq!(address.local(), "Alice.Smith");
        assert_eq!(address.domain(), "exämple.com");
        assert_eq!(address.normalized(), "alice.smith@xn--exmple-cua.com");
    }

    #[test]
    fn parse_email_reports_every_reason() {
        let err = parse_email(".alice..@-example").expect_err("invalid");
        assert!(err.reasons.len() >= 3, "{:?}", err.reasons);
        assert!(err.to_string().starts_with("invalid email syntax"));
    }
}
