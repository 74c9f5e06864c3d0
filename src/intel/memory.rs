use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use super::{DomainIntelligence, DomainObservation, IntelligenceStore};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Expired entries are swept once every this many writes.
const PURGE_EVERY: usize = 256;

/// In-memory [`IntelligenceStore`]: read-mostly `RwLock<HashMap>`, entries
/// expire `ttl` after they were first recorded. Stale entries are swept from
/// `record`, so a long-lived store stays bounded by the domains seen per TTL.
#[derive(Debug)]
pub struct MemoryIntelligence {
    ttl: Duration,
    entries: RwLock<HashMap<String, DomainIntelligence>>,
    writes: AtomicUsize,
}

impl Default for MemoryIntelligence {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl MemoryIntelligence {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let mut entries = self.entries.write();
        self.retain_fresh(&mut entries, Instant::now());
    }

    fn retain_fresh(&self, entries: &mut HashMap<String, DomainIntelligence>, now: Instant) {
        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now));
        let purged = before - entries.len();
        if purged > 0 {
            debug!("purged {purged} expired intelligence entries");
        }
    }

    fn is_fresh(&self, entry: &DomainIntelligence, now: Instant) -> bool {
        now.duration_since(entry.recorded_at) < self.ttl
    }
}

impl IntelligenceStore for MemoryIntelligence {
    fn get(&self, domain: &str) -> Option<DomainIntelligence> {
        let key = domain.to_ascii_lowercase();
        let entries = self.entries.read();
        let entry = entries.get(&key)?;
        if self.is_fresh(entry, Instant::now()) {
            Some(entry.clone())
        } else {
            None
        }
    }

    fn record(&self, domain: &str, observation: DomainObservation) {
        let key = domain.to_ascii_lowercase();
        let now = Instant::now();
        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        let mut entries = self.entries.write();
        if writes % PURGE_EVERY == 0 {
            self.retain_fresh(&mut entries, now);
        }
        let fresh = entries
            .get(&key)
            .is_some_and(|entry| self.is_fresh(entry, now));
        if !fresh {
            debug!("intelligence entry for {key} (re)started");
            entries.insert(key.clone(), DomainIntelligence::new(&key, now));
        }
        if let Some(entry) = entries.get_mut(&key) {
            entry.apply(observation);
        }
    }
}
