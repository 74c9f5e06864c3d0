#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::batch::BatchOptions;
use crate::mx::DnsOptions;
use crate::scoring::ConfidenceWeights;
use crate::smtp_verify::SmtpProbeOptions;
use crate::tier::{ThresholdLadder, Tier};

/// Per-call options.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Run the SMTP probe on HIGH-tier addresses.
    pub enable_smtp: bool,
    /// Local-part pattern analysis and its risk contributions.
    pub advanced: bool,
    /// Forces the tier of syntactically valid addresses.
    pub tier: Option<Tier>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            enable_smtp: false,
            advanced: true,
            tier: None,
        }
    }
}

/// How much of the pipeline runs for each address.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Tiered pipeline with enrichment, bounce lookups and pattern analysis.
    Full,
    /// Syntax, DNS/MX and static lists only.
    Fast,
}

/// Static configuration of an [`Engine`](super::Engine).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub dns: DnsOptions,
    pub smtp: SmtpProbeOptions,
    pub weights: ConfidenceWeights,
    pub ladder: ThresholdLadder,
    pub batch: BatchOptions,
}
