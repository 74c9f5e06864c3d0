use std::time::Duration;

/// Configuration of the DNS side of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsOptions {
    /// Per-query timeout, clamped to 2..=5 seconds.
    pub timeout: Duration,
    /// How long resolved domains stay in the intelligence cache.
    pub cache_ttl: Duration,
}

impl Default for DnsOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

impl DnsOptions {
    pub fn effective_timeout(&self) -> Duration {
        self.timeout
            .clamp(Duration::from_secs(2), Duration::from_secs(5))
    }
}
