use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::classifier::PatternFlag;

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    /// Spam-trap domain, whatever the score.
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=39 => Self::Low,
            40..=69 => Self::Medium,
            _ => Self::High,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        })
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Risk {
    pub score: u8,
    pub level: RiskLevel,
    /// Human-readable contributions, in evaluation order.
    pub factors: Vec<String>,
}

/// Facts the risk assessment is computed from.
#[derive(Debug, Clone, Default)]
pub struct RiskInput<'a> {
    pub valid: bool,
    pub spamtrap: bool,
    pub blacklisted: bool,
    /// `None` when no bounce history was consulted.
    pub bounce_count: Option<u32>,
    pub smtp_rejected: bool,
    pub disposable: bool,
    pub catch_all: bool,
    pub role_based: bool,
    pub confidence: u8,
    /// Only suspicious flags count; empty when pattern analysis did not run.
    pub patterns: &'a [PatternFlag],
}

#[derive(Default)]
struct Tally {
    score: u32,
    factors: Vec<String>,
}

impl Tally {
    fn add(&mut self, points: u32, factor: impl Into<String>) {
        self.score += points;
        self.factors.push(factor.into());
    }

    fn add_confidence(&mut self, confidence: u8) {
        if confidence < 50 {
            self.add(30, format!("low confidence ({confidence})"));
        } else if confidence < 70 {
            self.add(15, format!("moderate confidence ({confidence})"));
        }
    }

    fn finish(self, critical: bool) -> Risk {
        let score = self.score.min(100) as u8;
        let level = if critical {
            RiskLevel::Critical
        } else {
            RiskLevel::from_score(score)
        };
        Risk {
            score,
            level,
            factors: self.factors,
        }
    }
}

pub fn assess(input: &RiskInput<'_>) -> Risk {
    let mut tally = Tally::default();

    if !input.valid {
        tally.add(40, "failed validation");
    }
    if input.spamtrap {
        tally.add(60, "spam trap domain");
    }
    if input.blacklisted {
        tally.add(50, "blacklisted domain");
    }
    match input.bounce_count.unwrap_or(0) {
        0 => {}
        1 => tally.add(25, "bounced once"),
        2 => tally.add(40, "bounced 2 times"),
        n => tally.add(60, format!("bounced {n} times")),
    }
    if input.smtp_rejected {
        tally.add(40, "rejected by SMTP server");
    }
    if input.disposable {
        tally.add(30, "disposable domain");
    }
    if input.catch_all {
        tally.add(20, "catch-all domain");
    }
    if input.role_based {
        tally.add(10, "role-based address");
    }
    tally.add_confidence(input.confidence);
    for flag in input.patterns.iter().filter(|flag| flag.is_suspicious()) {
        tally.add(10, format!("suspicious pattern: {flag}"));
    }

    tally.finish(input.spamtrap)
}

/// Cheap classification used by fast batches: validity, disposable domain and
/// confidence only.
pub fn minimal(valid: bool, confidence: u8, disposable: bool) -> Risk {
    let mut tally = Tally::default();
    if !valid {
        tally.add(40, "failed validation");
    }
    if disposable {
        tally.add(30, "disposable domain");
    }
    tally.add_confidence(confidence);
    tally.factors.push("minimal assessment".to_string());
    tally.finish(false)
}
