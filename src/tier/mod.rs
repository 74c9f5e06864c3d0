//! Adaptive tiering: a zero-network preliminary pass decides how much of the
//! expensive pipeline an address deserves.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, PatternFlag};
use crate::validator::{self, EmailAddress, SyntaxReport};

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tier '{0}' (expected low, medium or high)")]
pub struct ParseTierError(String);

impl FromStr for Tier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseTierError(s.to_string())),
        }
    }
}

/// Checks attempted for an address. Syntax always runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckPlan {
    pub dns: bool,
    pub mx: bool,
    pub smtp: bool,
    pub disposable: bool,
    pub role: bool,
    pub catch_all: bool,
    pub typo: bool,
}

impl CheckPlan {
    pub fn for_tier(tier: Tier, smtp_enabled: bool) -> Self {
        match tier {
            Tier::High => Self {
                dns: true,
                mx: true,
                smtp: smtp_enabled,
                disposable: true,
                role: true,
                catch_all: smtp_enabled,
                typo: true,
            },
            Tier::Medium => Self {
                dns: true,
                mx: true,
                disposable: true,
                ..Self::default()
            },
            Tier::Low => Self::default(),
        }
    }

    pub fn needs_network(&self) -> bool {
        self.dns || self.mx || self.smtp
    }
}

/// Outcome of the preliminary pass.
#[derive(Debug, Clone)]
pub struct Preliminary {
    pub syntax: SyntaxReport,
    pub disposable: bool,
    pub role_based: bool,
    pub blacklisted: bool,
    pub spamtrap: bool,
    /// Empty when pattern analysis was not requested.
    pub patterns: Vec<PatternFlag>,
    pub confidence: u8,
}

impl Preliminary {
    pub fn address(&self) -> Option<&EmailAddress> {
        self.syntax.address.as_ref()
    }

    pub fn has_suspicious_pattern(&self) -> bool {
        self.patterns.iter().any(|flag| flag.is_suspicious())
    }
}

/// Syntax + static classification, no I/O.
pub fn preliminary_pass(
    email: &str,
    classifier: &Classifier,
    analyze_patterns: bool,
) -> Preliminary {
    let syntax = validator::check_syntax(email);
    let Some(address) = syntax.address.clone() else {
        return Preliminary {
            syntax,
            disposable: false,
            role_based: false,
            blacklisted: false,
            spamtrap: false,
            patterns: Vec::new(),
            confidence: 0,
        };
    };

    let domain = address.ascii_domain();
    let disposable = classifier.is_disposable(domain);
    let role_based = classifier.is_role_based(address.local());
    let blacklisted = classifier.is_blacklisted(domain);
    let spamtrap = classifier.is_spamtrap(domain);
    let patterns = if analyze_patterns {
        classifier.patterns(address.local())
    } else {
        Vec::new()
    };

    let mut confidence: i32 = 100;
    if disposable {
        confidence -= 10;
    }
    if role_based {
        confidence -= 10;
    }
    if blacklisted {
        confidence -= 50;
    }
    if spamtrap {
        confidence -= 50;
    }
    if patterns.iter().any(|flag| flag.is_suspicious()) {
        confidence -= 20;
    }

    Preliminary {
        syntax,
        disposable,
        role_based,
        blacklisted,
        spamtrap,
        patterns,
        confidence: confidence.clamp(0, 100) as u8,
    }
}

/// Maps a preliminary confidence to a tier.
pub trait TierStrategy: Send + Sync {
    fn select(&self, preliminary: &Preliminary) -> Tier;
}

/// `>= high` → HIGH, `>= medium` → MEDIUM, otherwise LOW.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdLadder {
    pub high: u8,
    pub medium: u8,
}

impl Default for ThresholdLadder {
    fn default() -> Self {
        Self {
            high: 90,
            medium: 60,
        }
    }
}

impl TierStrategy for ThresholdLadder {
    fn select(&self, preliminary: &Preliminary) -> Tier {
        match preliminary.confidence {
            c if c >= self.high => Tier::High,
            c if c >= self.medium => Tier::Medium,
            _ => Tier::Low,
        }
    }
}

/// Final tier: an override wins, except for syntactically invalid input
/// which is always LOW.
pub fn select_tier(
    strategy: &dyn TierStrategy,
    preliminary: &Preliminary,
    requested: Option<Tier>,
) -> Tier {
    if !preliminary.syntax.valid {
        return Tier::Low;
    }
    requested.unwrap_or_else(|| strategy.select(preliminary))
}
