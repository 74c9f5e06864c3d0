use crate::engine::{Check, Checks};

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Contribution of each collected signal. Signals that were not collected
/// contribute nothing.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfidenceWeights {
    pub syntax: i32,
    pub dns_valid: i32,
    pub dns_invalid: i32,
    pub mx_valid: i32,
    pub mx_invalid: i32,
    pub smtp_deliverable: i32,
    pub smtp_undeliverable: i32,
    pub smtp_unknown: i32,
    pub catch_all: i32,
    pub disposable: i32,
    pub role_based: i32,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            syntax: 50,
            dns_valid: 25,
            dns_invalid: -30,
            mx_valid: 25,
            mx_invalid: -20,
            smtp_deliverable: 10,
            smtp_undeliverable: -50,
            smtp_unknown: 0,
            catch_all: -15,
            disposable: -10,
            role_based: -5,
        }
    }
}

/// Weighted sum over `checks`, clamped to 0..=100. Invalid syntax is always 0.
pub fn score(checks: &Checks, weights: &ConfidenceWeights) -> u8 {
    if checks.get(Check::Syntax) != Some(Some(true)) {
        return 0;
    }

    let mut total = weights.syntax;
    total += match checks.get(Check::Dns) {
        Some(Some(true)) => weights.dns_valid,
        Some(Some(false)) => weights.dns_invalid,
        _ => 0,
    };
    total += match checks.get(Check::Mx) {
        Some(Some(true)) => weights.mx_valid,
        Some(Some(false)) => weights.mx_invalid,
        _ => 0,
    };
    total += match checks.get(Check::Smtp) {
        Some(Some(true)) => weights.smtp_deliverable,
        Some(Some(false)) => weights.smtp_undeliverable,
        Some(None) => weights.smtp_unknown,
        None => 0,
    };
    if checks.is_true(Check::CatchAll) {
        total += weights.catch_all;
    }
    if checks.is_true(Check::IsDisposable) {
        total += weights.disposable;
    }
    if checks.is_true(Check::IsRoleBased) {
        total += weights.role_based;
    }

    total.clamp(0, 100) as u8
}
