use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use trust_dns_resolver::Resolver;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use tracing::{debug, warn};

use super::{DnsOptions, LookupError, MxError, MxRecord, Resolution};
use crate::intel::{DomainObservation, IntelligenceStore};

/// DNS queries the resolver needs. Implemented for the system resolver and by
/// stubs in tests.
pub trait LookupMx: Send + Sync {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, LookupError>;
    /// Whether the name has at least one A/AAAA record.
    fn lookup_host(&self, domain: &str) -> Result<bool, LookupError>;
}

impl LookupMx for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, LookupError> {
        let lookup = Resolver::mx_lookup(self, domain)?;
        let mut records = Vec::new();
        for mx in lookup.iter() {
            let exchange = normalize_exchange(mx.exchange().to_utf8());
            records.push(MxRecord::new(mx.preference(), exchange));
        }
        Ok(records)
    }

    fn lookup_host(&self, domain: &str) -> Result<bool, LookupError> {
        let lookup = Resolver::lookup_ip(self, domain)?;
        Ok(lookup.iter().next().is_some())
    }
}

/// Builds the system resolver with our timeout. Retries are handled by
/// [`DomainResolver`] (one retry, on timeout only), so the resolver itself
/// makes a single attempt.
pub fn system_resolver(options: &DnsOptions) -> Result<Resolver, MxError> {
    let (config, mut opts) = match trust_dns_resolver::system_conf::read_system_conf() {
        Ok(pair) => pair,
        Err(err) => {
            warn!("cannot read system DNS configuration ({err}), using defaults");
            (ResolverConfig::default(), ResolverOpts::default())
        }
    };
    opts.timeout = options.effective_timeout();
    opts.attempts = 1;
    Resolver::new(config, opts).map_err(MxError::resolver_init)
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}

/// Cached DNS/MX resolution of mail domains.
///
/// Concurrent misses on the same domain are serialised: one caller queries,
/// the others wait on the domain's guard and then read the cache.
#[derive(Clone)]
pub struct DomainResolver {
    lookup: Arc<dyn LookupMx>,
    store: Arc<dyn IntelligenceStore>,
    inflight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl DomainResolver {
    pub fn new(lookup: Arc<dyn LookupMx>, store: Arc<dyn IntelligenceStore>) -> Self {
        Self {
            lookup,
            store,
            inflight: Arc::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn IntelligenceStore> {
        &self.store
    }

    /// Resolves `ascii_domain`, serving from the intelligence store while the
    /// entry is fresh. Transient failures are returned but never cached.
    pub fn resolve(&self, ascii_domain: &str) -> Resolution {
        if let Some(resolution) = self.cached(ascii_domain) {
            return resolution;
        }

        let guard = self
            .inflight
            .lock()
            .entry(ascii_domain.to_string())
            .or_default()
            .clone();
        let resolution = {
            let _held = guard.lock();
            // un autre worker a peut-être résolu pendant l'attente
            match self.cached(ascii_domain) {
                Some(resolution) => resolution,
                None => {
                    let (resolution, cacheable) = resolve_with(self.lookup.as_ref(), ascii_domain);
                    if cacheable {
                        self.store.record(
                            ascii_domain,
                            DomainObservation::Resolved(resolution.clone()),
                        );
                    }
                    resolution
                }
            }
        };

        let mut inflight = self.inflight.lock();
        if inflight
            .get(ascii_domain)
            .is_some_and(|current| Arc::ptr_eq(current, &guard))
        {
            inflight.remove(ascii_domain);
        }
        resolution
    }

    fn cached(&self, ascii_domain: &str) -> Option<Resolution> {
        let resolution = self.store.get(ascii_domain)?.resolution?;
        debug!("dns cache hit for {ascii_domain}");
        Some(resolution)
    }
}

/// Uncached resolution. The boolean tells whether the answer is
/// authoritative enough to be cached.
pub(crate) fn resolve_with<R>(resolver: &R, ascii_domain: &str) -> (Resolution, bool)
where
    R: LookupMx + ?Sized,
{
    match with_retry(ascii_domain, || resolver.lookup_mx(ascii_domain)) {
        Ok(mut records) if !records.is_empty() => {
            records.sort();
            records.dedup();
            if records.iter().all(MxRecord::is_null) {
                debug!("{ascii_domain} publishes a null MX");
                return (
                    Resolution {
                        dns_valid: true,
                        mx_valid: false,
                        mx_hosts: Vec::new(),
                        transient: false,
                    },
                    true,
                );
            }
            records.retain(|record| !record.is_null());
            (
                Resolution {
                    dns_valid: true,
                    mx_valid: true,
                    mx_hosts: records,
                    transient: false,
                },
                true,
            )
        }
        Ok(_) | Err(LookupError::NoRecords) => resolve_host_only(resolver, ascii_domain),
        Err(LookupError::NxDomain) => {
            debug!("{ascii_domain}: NXDOMAIN");
            (Resolution::missing(), true)
        }
        Err(LookupError::Timeout) => {
            warn!("{ascii_domain}: DNS timed out twice");
            (Resolution::transient(), false)
        }
        Err(LookupError::Failed(reason)) => {
            warn!("{ascii_domain}: DNS lookup failed: {reason}");
            (Resolution::transient(), false)
        }
    }
}

// pas de MX: le domaine existe-t-il quand même (A/AAAA) ?
fn resolve_host_only<R>(resolver: &R, ascii_domain: &str) -> (Resolution, bool)
where
    R: LookupMx + ?Sized,
{
    match with_retry(ascii_domain, || resolver.lookup_host(ascii_domain)) {
        Ok(has_address) => (
            Resolution {
                dns_valid: has_address,
                ..Resolution::missing()
            },
            true,
        ),
        Err(LookupError::NxDomain | LookupError::NoRecords) => (Resolution::missing(), true),
        Err(LookupError::Timeout) => (Resolution::transient(), false),
        Err(LookupError::Failed(reason)) => {
            warn!("{ascii_domain}: address lookup failed: {reason}");
            (Resolution::transient(), false)
        }
    }
}

fn with_retry<T, F>(ascii_domain: &str, mut query: F) -> Result<T, LookupError>
where
    F: FnMut() -> Result<T, LookupError>,
{
    match query() {
        Err(LookupError::Timeout) => {
            debug!("{ascii_domain}: DNS timeout, retrying once");
            query()
        }
        other => other,
    }
}
