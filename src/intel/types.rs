use std::time::Instant;

use crate::mx::{MxRecord, Resolution};

/// Tri-state catch-all knowledge for a domain.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatchAll {
    Detected,
    NotDetected,
    #[default]
    Unknown,
}

impl CatchAll {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Detected => Some(true),
            Self::NotDetected => Some(false),
            Self::Unknown => None,
        }
    }
}

impl From<Option<bool>> for CatchAll {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Detected,
            Some(false) => Self::NotDetected,
            None => Self::Unknown,
        }
    }
}

/// Something learned about a domain during a validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainObservation {
    Resolved(Resolution),
    CatchAll(bool),
    /// The domain's mail servers make RCPT probing meaningless or refuse it.
    ProbeBlocking,
}

/// Cached per-domain facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainIntelligence {
    pub domain: String,
    pub resolution: Option<Resolution>,
    pub catch_all: CatchAll,
    pub probe_blocking: bool,
    pub(crate) recorded_at: Instant,
}

impl DomainIntelligence {
    pub(crate) fn new(domain: &str, now: Instant) -> Self {
        Self {
            domain: domain.to_string(),
            resolution: None,
            catch_all: CatchAll::Unknown,
            probe_blocking: false,
            recorded_at: now,
        }
    }

    pub fn dns_valid(&self) -> Option<bool> {
        self.resolution.as_ref().map(|r| r.dns_valid)
    }

    pub fn mx_hosts(&self) -> &[MxRecord] {
        self.resolution
            .as_ref()
            .map(|r| r.mx_hosts.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn apply(&mut self, observation: DomainObservation) {
        match observation {
            DomainObservation::Resolved(resolution) => self.resolution = Some(resolution),
            DomainObservation::CatchAll(flag) => self.catch_all = CatchAll::from(Some(flag)),
            DomainObservation::ProbeBlocking => self.probe_blocking = true,
        }
    }
}
