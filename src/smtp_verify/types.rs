use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::mx::MxRecord;

/// Verdict of the RCPT probe for the target mailbox.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpStatus {
    /// RCPT TO answered 250/251.
    Deliverable,
    /// RCPT TO answered 550/551/553.
    Undeliverable,
    /// Anything else: temporary failures, policy blocks, network errors.
    #[default]
    Unknown,
}

impl SmtpStatus {
    /// Value stored under the `smtp` check.
    pub fn as_check(self) -> Option<bool> {
        match self {
            Self::Deliverable => Some(true),
            Self::Undeliverable => Some(false),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for SmtpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deliverable => f.write_str("deliverable"),
            Self::Undeliverable => f.write_str("undeliverable"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// What the SMTP dialogue revealed.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SmtpDetails {
    pub status: SmtpStatus,
    /// Reply code of the deciding command, if any host answered.
    pub code: Option<u16>,
    pub message: Option<String>,
    /// Host that produced the verdict.
    pub mx_host: Option<String>,
    pub hosts_tried: Vec<String>,
    pub catch_all: Option<bool>,
    /// Local parts sent in RCPT TO: the target, then the catch-all decoy.
    pub probed_locals: Vec<String>,
    /// Every host tried refused the probe itself (banner, HELO, MAIL FROM or
    /// policy 5xx on RCPT).
    pub blocked: bool,
    pub reason: Option<String>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Vec::is_empty", default))]
    pub transcript: Vec<String>,
}

impl SmtpDetails {
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// The probe was not attempted for the domain.
    pub fn skipped() -> Self {
        Self::unknown("probe skipped")
    }

    pub fn is_conclusive(&self) -> bool {
        self.status != SmtpStatus::Unknown
    }
}

/// Mailbox to probe, with the MX hosts already resolved.
#[derive(Debug, Clone, Copy)]
pub struct ProbeTarget<'a> {
    pub local: &'a str,
    /// ASCII (IDNA) domain.
    pub domain: &'a str,
    /// Ascending preference.
    pub hosts: &'a [MxRecord],
    pub detect_catch_all: bool,
}

impl ProbeTarget<'_> {
    pub fn address(&self) -> String {
        format!("{}@{}", self.local, self.domain)
    }
}
