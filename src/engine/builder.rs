use std::sync::Arc;

use super::{Engine, EngineConfig, EngineError, Inner};
use crate::classifier::{Classifier, Lists};
use crate::intel::{IntelligenceStore, MemoryIntelligence};
use crate::mx::{DomainResolver, LookupMx, system_resolver};
use crate::smtp_verify::{MailboxProber, SmtpProber};
use crate::store::{
    BounceHistory, MemoryBounceHistory, MemoryResultStore, MemoryUsageMeter, ResultStore,
    UsageMeter,
};
use crate::tier::TierStrategy;

/// Assembles an [`Engine`]. Every collaborator left unset gets its default:
/// system DNS resolver, SMTP prober, in-memory stores.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    lists: Option<Lists>,
    lookup: Option<Arc<dyn LookupMx>>,
    intelligence: Option<Arc<dyn IntelligenceStore>>,
    prober: Option<Arc<dyn MailboxProber>>,
    tiers: Option<Arc<dyn TierStrategy>>,
    bounces: Option<Arc<dyn BounceHistory>>,
    results: Option<Arc<dyn ResultStore>>,
    usage: Option<Arc<dyn UsageMeter>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn lists(mut self, lists: Lists) -> Self {
        self.lists = Some(lists);
        self
    }

    pub fn lookup(mut self, lookup: Arc<dyn LookupMx>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn intelligence(mut self, store: Arc<dyn IntelligenceStore>) -> Self {
        self.intelligence = Some(store);
        self
    }

    pub fn prober(mut self, prober: Arc<dyn MailboxProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn tier_strategy(mut self, strategy: Arc<dyn TierStrategy>) -> Self {
        self.tiers = Some(strategy);
        self
    }

    pub fn bounce_history(mut self, history: Arc<dyn BounceHistory>) -> Self {
        self.bounces = Some(history);
        self
    }

    pub fn result_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.results = Some(store);
        self
    }

    pub fn usage_meter(mut self, meter: Arc<dyn UsageMeter>) -> Self {
        self.usage = Some(meter);
        self
    }

    pub fn build(self) -> Result<Engine, EngineError> {
        let config = self.config;

        let lookup: Arc<dyn LookupMx> = match self.lookup {
            Some(lookup) => lookup,
            None => Arc::new(system_resolver(&config.dns)?),
        };
        let intelligence = self
            .intelligence
            .unwrap_or_else(|| Arc::new(MemoryIntelligence::new(config.dns.cache_ttl)));
        let prober: Arc<dyn MailboxProber> = match self.prober {
            Some(prober) => prober,
            None => Arc::new(SmtpProber::new(config.smtp.clone())?),
        };
        let tiers = self.tiers.unwrap_or_else(|| Arc::new(config.ladder));

        Ok(Engine {
            inner: Arc::new(Inner {
                classifier: Classifier::new(self.lists.unwrap_or_else(Lists::builtin)),
                resolver: DomainResolver::new(lookup, intelligence),
                prober,
                tiers,
                bounces: self
                    .bounces
                    .unwrap_or_else(|| Arc::new(MemoryBounceHistory::new())),
                results: self
                    .results
                    .unwrap_or_else(|| Arc::new(MemoryResultStore::new())),
                usage: self
                    .usage
                    .unwrap_or_else(|| Arc::new(MemoryUsageMeter::new())),
                config,
            }),
        })
    }
}
