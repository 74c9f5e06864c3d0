use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mailvet::{
    BatchEvent, CatchAll, Check, Engine, InputError, IntelligenceStore, LookupError, LookupMx,
    MailboxProber, MemoryIntelligence, MxRecord, ProbeTarget, SmtpDetails, SmtpStatus, Tier,
    ValidateOptions, ValidationMode,
};

struct OneDomain {
    calls: AtomicUsize,
}

impl LookupMx for OneDomain {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match domain {
            "northwind.dev" => Ok(vec![
                MxRecord::new(20, "mx2.northwind.dev"),
                MxRecord::new(10, "mx1.northwind.dev"),
            ]),
            _ => Err(LookupError::NxDomain),
        }
    }

    fn lookup_host(&self, _domain: &str) -> Result<bool, LookupError> {
        Ok(false)
    }
}

/// `nobody` n'existe pas, tout le reste est accepté; `catch_all` décide du
/// sort de l'adresse leurre.
struct Mailboxes {
    catch_all: bool,
    calls: AtomicUsize,
}

impl MailboxProber for Mailboxes {
    fn probe(&self, target: &ProbeTarget<'_>) -> SmtpDetails {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let host = target.hosts.first().map(|r| r.exchange.clone());
        if target.local == "nobody" {
            return SmtpDetails {
                status: SmtpStatus::Undeliverable,
                code: Some(550),
                mx_host: host,
                ..SmtpDetails::default()
            };
        }
        SmtpDetails {
            status: SmtpStatus::Deliverable,
            code: Some(250),
            mx_host: host,
            catch_all: target.detect_catch_all.then_some(self.catch_all),
            ..SmtpDetails::default()
        }
    }
}

struct Setup {
    engine: Engine,
    lookup: Arc<OneDomain>,
    prober: Arc<Mailboxes>,
    intel: Arc<MemoryIntelligence>,
}

fn setup(catch_all: bool) -> Setup {
    let lookup = Arc::new(OneDomain {
        calls: AtomicUsize::new(0),
    });
    let prober = Arc::new(Mailboxes {
        catch_all,
        calls: AtomicUsize::new(0),
    });
    let intel = Arc::new(MemoryIntelligence::default());
    let engine = Engine::builder()
        .lookup(lookup.clone())
        .prober(prober.clone())
        .intelligence(intel.clone())
        .build()
        .expect("engine");
    Setup {
        engine,
        lookup,
        prober,
        intel,
    }
}

fn with_smtp() -> ValidateOptions {
    ValidateOptions {
        enable_smtp: true,
        ..ValidateOptions::default()
    }
}

#[test]
fn rejected_mailbox_is_invalid() {
    let s = setup(false);
    let result = s
        .engine
        .validate("nobody@northwind.dev", &with_smtp())
        .expect("validated");

    assert!(!result.valid);
    assert_eq!(result.tier, Tier::High);
    assert_eq!(result.checks.get(Check::Smtp), Some(Some(false)));
    // 50 + 25 + 25 - 50
    assert_eq!(result.confidence_score, 50);
    assert!(!result.checks.contains(Check::CatchAll));
    assert!(
        result
            .risk
            .factors
            .iter()
            .any(|f| f == "rejected by SMTP server")
    );
    let smtp = result.smtp_details.expect("probed");
    assert_eq!(smtp.mx_host.as_deref(), Some("mx1.northwind.dev"));
}

#[test]
fn catch_all_domain_is_flagged_and_remembered() {
    let s = setup(true);
    let result = s
        .engine
        .validate("jane@northwind.dev", &with_smtp())
        .expect("validated");

    assert!(result.valid);
    assert_eq!(result.checks.get(Check::CatchAll), Some(Some(true)));
    // 50 + 25 + 25 + 10 - 15
    assert_eq!(result.confidence_score, 95);
    assert!(result.risk.factors.iter().any(|f| f == "catch-all domain"));

    let entry = s.intel.get("northwind.dev").expect("cached");
    assert_eq!(entry.catch_all, CatchAll::Detected);
    assert_eq!(entry.mx_hosts()[0].exchange, "mx1.northwind.dev");
}

#[test]
fn unknown_domain_never_reaches_the_prober() {
    let s = setup(false);
    let result = s
        .engine
        .validate("jane@nothing-here.dev", &with_smtp())
        .expect("validated");

    assert!(!result.valid);
    assert_eq!(result.checks.get(Check::Dns), Some(Some(false)));
    assert_eq!(result.checks.get(Check::Mx), Some(Some(false)));
    assert_eq!(result.checks.get(Check::Smtp), Some(None));
    assert_eq!(result.confidence_score, 0);
    assert_eq!(s.prober.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn blank_input_is_refused() {
    let s = setup(false);
    assert_eq!(
        s.engine.validate("   ", &ValidateOptions::default()),
        Err(InputError::EmptyEmail)
    );
    assert_eq!(s.lookup.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn batch_shares_resolutions_between_workers() {
    let s = setup(false);
    let emails: Vec<String> = (0..30).map(|i| format!("user{i}@northwind.dev")).collect();
    let events: Vec<BatchEvent> = s
        .engine
        .validate_batch(emails, ValidateOptions::default())
        .expect("started")
        .collect();

    assert!(matches!(
        events.first(),
        Some(BatchEvent::Start {
            total: 30,
            mode: ValidationMode::Full
        })
    ));
    let Some(BatchEvent::Complete(summary)) = events.last() else {
        panic!("no summary");
    };
    assert_eq!(summary.processed, 30);
    assert_eq!(summary.valid, 30);
    assert_eq!(s.lookup.calls.load(Ordering::SeqCst), 1);
}

#[cfg(feature = "with-serde")]
#[test]
fn events_serialize_with_an_event_tag() {
    let s = setup(false);
    let mut stream = s
        .engine
        .validate_batch(["jane@northwind.dev"], ValidateOptions::default())
        .expect("started");
    let start = stream.next().expect("start event");
    assert_eq!(
        serde_json::to_value(&start).expect("json"),
        serde_json::json!({"event": "start", "total": 1, "mode": "full"})
    );

    let result = stream.next().expect("result event");
    let json = serde_json::to_value(&result).expect("json");
    assert_eq!(json["event"], "result");
    assert_eq!(json["result"]["checks"]["dns"], true);
    assert_eq!(json["result"]["tier"], "HIGH");
    assert!(json["result"]["checks"].get("smtp").is_none());
}
