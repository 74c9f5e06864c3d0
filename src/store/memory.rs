use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use super::{BounceHistory, ResultStore, StoreError, UsageMeter, ValidationRecord};

/// Bounce counters keyed by lower-cased address.
#[derive(Debug, Default)]
pub struct MemoryBounceHistory {
    counts: RwLock<HashMap<String, u32>>,
}

impl MemoryBounceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests one hard-bounce event.
    pub fn record_bounce(&self, email: &str) {
        let key = email.trim().to_lowercase();
        *self.counts.write().entry(key).or_insert(0) += 1;
    }
}

impl BounceHistory for MemoryBounceHistory {
    fn bounce_count(&self, email: &str) -> Result<u32, StoreError> {
        let key = email.trim().to_lowercase();
        Ok(self.counts.read().get(&key).copied().unwrap_or(0))
    }
}

/// Keeps every saved record, in save order.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    records: Mutex<Vec<ValidationRecord>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn records(&self) -> Vec<ValidationRecord> {
        self.records.lock().clone()
    }
}

impl ResultStore for MemoryResultStore {
    fn save(&self, record: &ValidationRecord) -> Result<(), StoreError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryUsageMeter {
    total: AtomicU64,
}

impl MemoryUsageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl UsageMeter for MemoryUsageMeter {
    fn record(&self, count: u64) {
        self.total.fetch_add(count, Ordering::Relaxed);
    }
}
