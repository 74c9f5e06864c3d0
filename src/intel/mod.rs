//! Domain intelligence: what the engine learned about a mail domain (DNS
//! resolution, catch-all behaviour, probe blocking), behind a `get`/`record`
//! interface so it can live in memory or in an external store.

mod memory;
mod types;

pub use memory::MemoryIntelligence;
pub use types::{CatchAll, DomainIntelligence, DomainObservation};

/// Shared, concurrency-safe domain knowledge. Implementations must never
/// return an entry older than their TTL.
pub trait IntelligenceStore: Send + Sync {
    fn get(&self, domain: &str) -> Option<DomainIntelligence>;
    fn record(&self, domain: &str, observation: DomainObservation);
}
