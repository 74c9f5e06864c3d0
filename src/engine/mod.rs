//! The validation pipeline.
//!
//! [`Engine::validate`] runs, in order: preliminary pass (syntax + static
//! lists), tier selection, DNS/MX resolution, SMTP probe, scoring. Which
//! network steps run depends on the tier; a step that did not run leaves no
//! entry in [`Checks`].

mod builder;
mod error;
mod options;
mod types;

use std::sync::Arc;
use std::time::{Instant, SystemTime};

use tracing::{debug, warn};

pub use builder::EngineBuilder;
pub use error::{EngineError, InputError};
pub use options::{EngineConfig, ValidateOptions, ValidationMode};
pub use types::{Check, Checks, StoredValidation, ValidationResult};

#[cfg(feature = "with-serde")]
pub(crate) use types::duration_ms;

use crate::classifier::Classifier;
use crate::enrichment;
use crate::intel::{CatchAll, DomainObservation, IntelligenceStore};
use crate::mx::{DomainResolver, Resolution};
use crate::scoring::{RiskInput, confidence, risk};
use crate::smtp_verify::{MailboxProber, ProbeTarget, SmtpDetails, SmtpStatus};
use crate::store::{BounceHistory, ResultStore, UsageMeter, ValidationRecord};
use crate::tier::{self, CheckPlan, TierStrategy};
use crate::validator::EmailAddress;

/// Cheap to clone: every clone shares the same caches and collaborators.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

struct Inner {
    config: EngineConfig,
    classifier: Classifier,
    resolver: DomainResolver,
    prober: Arc<dyn MailboxProber>,
    tiers: Arc<dyn TierStrategy>,
    bounces: Arc<dyn BounceHistory>,
    results: Arc<dyn ResultStore>,
    usage: Arc<dyn UsageMeter>,
}

/// Result plus the row to persist.
pub(crate) struct Evaluation {
    pub result: ValidationResult,
    pub record: ValidationRecord,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine with the system resolver and in-memory stores.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        EngineBuilder::new().config(config).build()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.inner.classifier
    }

    pub fn intelligence(&self) -> &Arc<dyn IntelligenceStore> {
        self.inner.resolver.store()
    }

    /// Validates one address. Network failures never surface: they show up
    /// as inconclusive checks.
    pub fn validate(
        &self,
        email: &str,
        options: &ValidateOptions,
    ) -> Result<ValidationResult, InputError> {
        if email.trim().is_empty() {
            return Err(InputError::EmptyEmail);
        }
        Ok(self.evaluate(email, options, ValidationMode::Full).result)
    }

    /// [`validate`](Self::validate), then persists the outcome. A store failure
    /// is logged and reported as `stored = false`.
    pub fn validate_and_store(
        &self,
        email: &str,
        options: &ValidateOptions,
    ) -> Result<StoredValidation, InputError> {
        if email.trim().is_empty() {
            return Err(InputError::EmptyEmail);
        }
        let evaluation = self.evaluate(email, options, ValidationMode::Full);
        let stored = self.persist(&evaluation.record);
        Ok(StoredValidation {
            result: evaluation.result,
            stored,
        })
    }

    pub(crate) fn persist(&self, record: &ValidationRecord) -> bool {
        match self.inner.results.save(record) {
            Ok(()) => true,
            Err(err) => {
                warn!("cannot store result for {}: {err}", record.email);
                false
            }
        }
    }

    pub(crate) fn evaluate(
        &self,
        email: &str,
        options: &ValidateOptions,
        mode: ValidationMode,
    ) -> Evaluation {
        let started = Instant::now();
        let inner = &*self.inner;
        let full = mode == ValidationMode::Full;
        let advanced = full && options.advanced;

        let prelim = tier::preliminary_pass(email, &inner.classifier, advanced);
        let tier = tier::select_tier(inner.tiers.as_ref(), &prelim, options.tier);
        // le mode rapide garde les vérifications du tier, il ne retire que
        // l'enrichissement, les motifs et l'historique de bounces
        let plan = match prelim.address() {
            Some(_) => CheckPlan::for_tier(tier, options.enable_smtp),
            None => CheckPlan::default(),
        };
        debug!("{}: tier {tier}, plan {plan:?}", email.trim());

        let mut checks = Checks::default();
        checks.set(Check::Syntax, Some(prelim.syntax.valid));

        let mut smtp_details = None;
        let mut suggestion = None;
        let mut enrichment = None;
        let mut bounce_count = None;

        if let Some(address) = prelim.address() {
            if plan.disposable {
                checks.set(Check::IsDisposable, Some(prelim.disposable));
            }
            if plan.role {
                checks.set(Check::IsRoleBased, Some(prelim.role_based));
            }

            let resolution = if plan.dns || plan.mx {
                Some(inner.resolver.resolve(address.ascii_domain()))
            } else {
                None
            };
            if let Some(resolution) = &resolution {
                // panne DNS transitoire: inconclusive, jamais invalide
                let known = !resolution.transient;
                if plan.dns {
                    checks.set(Check::Dns, known.then_some(resolution.dns_valid));
                }
                if plan.mx {
                    checks.set(Check::Mx, known.then_some(resolution.mx_valid));
                }
            }

            if plan.smtp {
                let details = self.probe(address, resolution.as_ref(), plan.catch_all);
                checks.set(Check::Smtp, details.status.as_check());
                smtp_details = Some(details);
            }
            if plan.catch_all {
                self.record_catch_all(address, smtp_details.as_ref(), &mut checks);
            }

            if plan.typo {
                suggestion = inner.classifier.suggest(address);
            }
            if full {
                let hosts = resolution.as_ref().map_or(&[][..], |r| &r.mx_hosts[..]);
                enrichment = Some(enrichment::enrich(address, &inner.classifier, hosts));
                bounce_count = self.bounce_count(address);
            }
        }

        let valid = prelim.syntax.valid
            && !checks.is_false(Check::Dns)
            && !checks.is_false(Check::Mx)
            && !checks.is_false(Check::Smtp);
        let confidence_score = confidence::score(&checks, &inner.config.weights);
        let risk = if full {
            risk::assess(&RiskInput {
                valid,
                spamtrap: prelim.spamtrap,
                blacklisted: prelim.blacklisted,
                bounce_count,
                smtp_rejected: checks.is_false(Check::Smtp),
                disposable: prelim.disposable,
                catch_all: checks.is_true(Check::CatchAll),
                role_based: prelim.role_based,
                confidence: confidence_score,
                patterns: &prelim.patterns,
            })
        } else {
            risk::minimal(valid, confidence_score, prelim.disposable)
        };

        inner.usage.record(1);

        let result = ValidationResult {
            email: email.trim().to_string(),
            normalized: prelim.address().map(EmailAddress::normalized),
            valid,
            confidence_score,
            tier,
            checks,
            smtp_details,
            risk,
            suggestion,
            enrichment,
            reasons: prelim.syntax.reasons.clone(),
            processing_time: started.elapsed(),
        };
        let record = record_for(&result, bounce_count);
        Evaluation { result, record }
    }

    fn probe(
        &self,
        address: &EmailAddress,
        resolution: Option<&Resolution>,
        detect_catch_all: bool,
    ) -> SmtpDetails {
        let inner = &*self.inner;
        let domain = address.ascii_domain();

        if resolution.is_some_and(|r| r.transient) {
            return SmtpDetails::unknown("DNS resolution inconclusive");
        }
        let Some(resolution) = resolution.filter(|r| r.mx_valid) else {
            return SmtpDetails::unknown("no mail exchanger to probe");
        };
        let learned_blocking = inner
            .resolver
            .store()
            .get(domain)
            .is_some_and(|entry| entry.probe_blocking);
        if inner.classifier.is_probe_blocking(domain) || learned_blocking {
            debug!("{domain}: probe skipped");
            return SmtpDetails::skipped();
        }

        let details = inner.prober.probe(&ProbeTarget {
            local: address.local(),
            domain,
            hosts: &resolution.mx_hosts,
            detect_catch_all,
        });

        let store = inner.resolver.store();
        if let Some(catch_all) = details.catch_all {
            store.record(domain, DomainObservation::CatchAll(catch_all));
        }
        let behind_blocking_mx = resolution
            .mx_hosts
            .iter()
            .any(|record| inner.classifier.is_probe_blocking_mx(&record.exchange));
        if details.blocked || (details.catch_all == Some(true) && behind_blocking_mx) {
            debug!("{domain}: learned probe blocking");
            store.record(domain, DomainObservation::ProbeBlocking);
        }
        details
    }

    /// Fills the `catch_all` check from the probe, falling back on what the
    /// intelligence store learned earlier.
    fn record_catch_all(
        &self,
        address: &EmailAddress,
        details: Option<&SmtpDetails>,
        checks: &mut Checks,
    ) {
        let probed = details.filter(|d| d.status == SmtpStatus::Deliverable);
        if let Some(details) = probed {
            checks.set(Check::CatchAll, details.catch_all);
            return;
        }
        let known = self
            .inner
            .resolver
            .store()
            .get(address.ascii_domain())
            .map(|entry| entry.catch_all)
            .unwrap_or_default();
        if known != CatchAll::Unknown {
            checks.set(Check::CatchAll, known.as_bool());
        }
    }

    fn bounce_count(&self, address: &EmailAddress) -> Option<u32> {
        match self.inner.bounces.bounce_count(&address.normalized()) {
            Ok(count) => Some(count),
            Err(err) => {
                warn!("bounce history unavailable for {address}: {err}");
                None
            }
        }
    }
}

fn record_for(result: &ValidationResult, bounce_count: Option<u32>) -> ValidationRecord {
    ValidationRecord {
        email: result
            .normalized
            .clone()
            .unwrap_or_else(|| result.email.clone()),
        valid: result.valid,
        tier: result.tier,
        confidence_score: result.confidence_score,
        risk_score: result.risk.score,
        risk_level: result.risk.level,
        risk_factors: result.risk.factors.clone(),
        enrichment: result.enrichment.clone(),
        bounce_count,
        validated_at: SystemTime::now(),
    }
}
