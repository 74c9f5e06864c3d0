//! Collaborators the engine reports to: bounce history, persisted results and
//! usage metering. In-memory implementations live in [`memory`].

mod error;
pub mod memory;

use std::time::SystemTime;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

pub use error::StoreError;
pub use memory::{MemoryBounceHistory, MemoryResultStore, MemoryUsageMeter};

use crate::enrichment::Enrichment;
use crate::scoring::RiskLevel;
use crate::tier::Tier;

/// Past hard bounces of an address, fed by delivery webhooks.
pub trait BounceHistory: Send + Sync {
    fn bounce_count(&self, email: &str) -> Result<u32, StoreError>;
}

/// Persistence of validation outcomes.
pub trait ResultStore: Send + Sync {
    fn save(&self, record: &ValidationRecord) -> Result<(), StoreError>;
}

/// Called once per validated address.
pub trait UsageMeter: Send + Sync {
    fn record(&self, count: u64);
}

/// Row handed to [`ResultStore::save`].
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRecord {
    pub email: String,
    pub valid: bool,
    pub tier: Tier,
    pub confidence_score: u8,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    pub enrichment: Option<Enrichment>,
    pub bounce_count: Option<u32>,
    pub validated_at: SystemTime,
}
