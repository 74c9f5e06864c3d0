use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{DomainResolver, LookupError, LookupMx, MxRecord, resolver};
use crate::intel::{IntelligenceStore, MemoryIntelligence};

type MxFn = dyn Fn(&str, usize) -> Result<Vec<MxRecord>, LookupError> + Send + Sync;
type HostFn = dyn Fn(&str) -> Result<bool, LookupError> + Send + Sync;

pub(crate) struct StubResolver {
    on_mx: Box<MxFn>,
    on_host: Box<HostFn>,
    pub mx_calls: AtomicUsize,
    pub host_calls: AtomicUsize,
}

impl StubResolver {
    /// `f` receives the domain and the 0-based call index.
    fn new<F>(f: F) -> Self
    where
        F: Fn(&str, usize) -> Result<Vec<MxRecord>, LookupError> + Send + Sync + 'static,
    {
        Self {
            on_mx: Box::new(f),
            on_host: Box::new(|_| Ok(false)),
            mx_calls: AtomicUsize::new(0),
            host_calls: AtomicUsize::new(0),
        }
    }

    fn with_host<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<bool, LookupError> + Send + Sync + 'static,
    {
        self.on_host = Box::new(f);
        self
    }
}

impl LookupMx for StubResolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, LookupError> {
        let call = self.mx_calls.fetch_add(1, Ordering::SeqCst);
        (self.on_mx)(domain, call)
    }

    fn lookup_host(&self, domain: &str) -> Result<bool, LookupError> {
        self.host_calls.fetch_add(1, Ordering::SeqCst);
        (self.on_host)(domain)
    }
}

#[test]
fn sorts_and_dedups_records() {
    let stub = StubResolver::new(|domain, _| {
        assert_eq!(domain, "acme.io");
        Ok(vec![
            MxRecord::new(20, "mx2.acme.io"),
            MxRecord::new(10, "mx1.acme.io"),
            MxRecord::new(10, "mx1.acme.io"),
            MxRecord::new(30, "mx3.acme.io"),
        ])
    });

    let (resolution, cacheable) = resolver::resolve_with(&stub, "acme.io");
    assert!(cacheable);
    assert!(resolution.dns_valid && resolution.mx_valid);
    let records = resolution.mx_hosts;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].preference, 10);
    assert_eq!(records[0].exchange, "mx1.acme.io");
    assert_eq!(records[2].preference, 30);
}

#[test]
fn nxdomain_is_invalid_not_an_error() {
    let stub = StubResolver::new(|_, _| Err(LookupError::NxDomain));
    let (resolution, cacheable) = resolver::resolve_with(&stub, "nope.invalid");
    assert!(!resolution.dns_valid);
    assert!(!resolution.mx_valid);
    assert!(cacheable);
    assert_eq!(stub.host_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn no_mx_falls_back_to_address_records() {
    let stub = StubResolver::new(|_, _| Err(LookupError::NoRecords)).with_host(|_| Ok(true));
    let (resolution, _) = resolver::resolve_with(&stub, "web-only.io");
    assert!(resolution.dns_valid);
    assert!(!resolution.mx_valid);
    assert!(resolution.mx_hosts.is_empty());
}

#[test]
fn null_mx_means_no_mail() {
    let stub = StubResolver::new(|_, _| Ok(vec![MxRecord::new(0, "")]));
    let (resolution, _) = resolver::resolve_with(&stub, "nomail.io");
    assert!(resolution.dns_valid);
    assert!(!resolution.mx_valid);
}

#[test]
fn retries_once_on_timeout_only() {
    let stub = StubResolver::new(|_, call| {
        if call == 0 {
            Err(LookupError::Timeout)
        } else {
            Ok(vec![MxRecord::new(5, "mx.acme.io")])
        }
    });
    let (resolution, cacheable) = resolver::resolve_with(&stub, "acme.io");
    assert!(resolution.mx_valid);
    assert!(cacheable);
    assert_eq!(stub.mx_calls.load(Ordering::SeqCst), 2);

    let failing = StubResolver::new(|_, _| Err(LookupError::Failed("SERVFAIL".into())));
    let (resolution, cacheable) = resolver::resolve_with(&failing, "acme.io");
    assert!(resolution.transient);
    assert!(!cacheable);
    assert_eq!(failing.mx_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn repeated_timeout_is_transient_and_uncached() {
    let stub = Arc::new(StubResolver::new(|_, _| Err(LookupError::Timeout)));
    let store = Arc::new(MemoryIntelligence::default());
    let domains = DomainResolver::new(stub.clone(), store.clone());

    let resolution = domains.resolve("slow.io");
    assert!(!resolution.dns_valid);
    assert!(resolution.transient);
    assert_eq!(stub.mx_calls.load(Ordering::SeqCst), 2);
    assert!(store.get("slow.io").is_none());
}

#[test]
fn second_resolution_is_a_cache_hit() {
    let stub = Arc::new(StubResolver::new(|_, _| {
        Ok(vec![MxRecord::new(10, "mx.acme.io")])
    }));
    let store = Arc::new(MemoryIntelligence::default());
    let domains = DomainResolver::new(stub.clone(), store);

    let first = domains.resolve("acme.io");
    let second = domains.resolve("acme.io");
    assert_eq!(first, second);
    assert_eq!(stub.mx_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_misses_share_one_query() {
    let stub = Arc::new(StubResolver::new(|_, _| {
        std::thread::sleep(std::time::Duration::from_millis(50));
        Ok(vec![MxRecord::new(10, "mx.acme.io")])
    }));
    let store = Arc::new(MemoryIntelligence::default());
    let domains = DomainResolver::new(stub.clone(), store);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let domains = domains.clone();
            std::thread::spawn(move || domains.resolve("acme.io"))
        })
        .collect();
    for handle in handles {
        assert!(handle.join().expect("worker").mx_valid);
    }
    assert_eq!(stub.mx_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn transient_failures_are_queried_again() {
    let stub = Arc::new(StubResolver::new(|_, call| {
        if call == 0 {
            Err(LookupError::Failed("SERVFAIL".into()))
        } else {
            Ok(vec![MxRecord::new(10, "mx.acme.io")])
        }
    }));
    let store = Arc::new(MemoryIntelligence::default());
    let domains = DomainResolver::new(stub.clone(), store);

    assert!(domains.resolve("acme.io").transient);
    assert!(domains.resolve("acme.io").mx_valid);
    assert_eq!(stub.mx_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn normalize_exchange_trims_dot_and_lowercases() {
    let out = resolver::normalize_exchange("Mail.ACME.io.".to_string());
    assert_eq!(out, "mail.acme.io");
}
