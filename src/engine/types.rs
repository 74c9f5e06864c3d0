use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::enrichment::Enrichment;
use crate::scoring::Risk;
use crate::smtp_verify::SmtpDetails;
use crate::tier::Tier;

/// Name of a check recorded in [`Checks`].
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Check {
    Syntax,
    Dns,
    Mx,
    Smtp,
    IsDisposable,
    IsRoleBased,
    CatchAll,
}

impl Check {
    pub const ALL: [Check; 7] = [
        Check::Syntax,
        Check::Dns,
        Check::Mx,
        Check::Smtp,
        Check::IsDisposable,
        Check::IsRoleBased,
        Check::CatchAll,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Dns => "dns",
            Self::Mx => "mx",
            Self::Smtp => "smtp",
            Self::IsDisposable => "is_disposable",
            Self::IsRoleBased => "is_role_based",
            Self::CatchAll => "catch_all",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of every attempted check.
///
/// A check that did not run has no entry. One that ran without a conclusive
/// answer maps to `None` (`null` once serialized).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(transparent))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Checks(BTreeMap<Check, Option<bool>>);

impl Checks {
    pub fn set(&mut self, check: Check, value: Option<bool>) {
        self.0.insert(check, value);
    }

    /// `None`: not attempted. `Some(None)`: inconclusive.
    pub fn get(&self, check: Check) -> Option<Option<bool>> {
        self.0.get(&check).copied()
    }

    pub fn contains(&self, check: Check) -> bool {
        self.0.contains_key(&check)
    }

    pub fn is_true(&self, check: Check) -> bool {
        self.get(check) == Some(Some(true))
    }

    pub fn is_false(&self, check: Check) -> bool {
        self.get(check) == Some(Some(false))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Check, Option<bool>)> + '_ {
        self.0.iter().map(|(check, value)| (*check, *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Verdict for one address. Built once per validation, never mutated after.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Input, trimmed.
    pub email: String,
    /// `local@ascii_domain` lower-cased, when the syntax is valid.
    pub normalized: Option<String>,
    pub valid: bool,
    pub confidence_score: u8,
    pub tier: Tier,
    pub checks: Checks,
    pub smtp_details: Option<SmtpDetails>,
    pub risk: Risk,
    pub suggestion: Option<String>,
    pub enrichment: Option<Enrichment>,
    /// Syntax rules the input broke.
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Vec::is_empty", default))]
    pub reasons: Vec<String>,
    #[cfg_attr(feature = "with-serde", serde(rename = "processing_time_ms", with = "duration_ms"))]
    pub processing_time: Duration,
}

/// Result of [`Engine::validate_and_store`](super::Engine::validate_and_store).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValidation {
    #[cfg_attr(feature = "with-serde", serde(flatten))]
    pub result: ValidationResult,
    /// `false` when the result store failed; the result itself is still valid.
    pub stored: bool,
}

#[cfg(feature = "with-serde")]
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
