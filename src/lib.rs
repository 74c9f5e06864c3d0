#![forbid(unsafe_code)]
//! mailvet — validation et vérification d'adresses e-mail
//!
//! Syntaxe, listes statiques (jetables, rôles, spam traps), résolution DNS/MX
//! avec cache, sonde SMTP sans envoi, scores de confiance et de risque, choix
//! du tier, traitement par lots en flux.
//!
//! ```no_run
//! use mailvet::{Engine, EngineConfig, ValidateOptions};
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! let result = engine.validate("jane@example.com", &ValidateOptions::default())?;
//! println!("{} -> {} ({})", result.email, result.valid, result.tier);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod classifier;
pub mod engine;
pub mod enrichment;
pub mod intel;
pub mod mx;
pub mod scoring;
pub mod smtp_verify;
pub mod store;
pub mod tier;
pub mod validator;

pub use batch::{
    BatchError, BatchEvent, BatchJob, BatchOptions, BatchStream, BatchSummary, CancelToken,
    JobState, Progress,
};
pub use classifier::{Classifier, Lists, PatternFlag};
pub use engine::{
    Check, Checks, Engine, EngineBuilder, EngineConfig, EngineError, InputError,
    StoredValidation, ValidateOptions, ValidationMode, ValidationResult,
};
pub use enrichment::Enrichment;
pub use intel::{CatchAll, DomainIntelligence, IntelligenceStore, MemoryIntelligence};
pub use mx::{DnsOptions, DomainResolver, LookupError, LookupMx, MxError, MxRecord, Resolution};
pub use scoring::{ConfidenceWeights, Risk, RiskLevel};
pub use smtp_verify::{
    MailboxProber, ProbeTarget, SmtpDetails, SmtpProbeOptions, SmtpProber, SmtpStatus,
    SmtpVerifyError,
};
pub use store::{BounceHistory, ResultStore, StoreError, UsageMeter, ValidationRecord};
pub use tier::{CheckPlan, ThresholdLadder, Tier, TierStrategy};
pub use validator::{EmailAddress, SyntaxError, SyntaxReport, check_syntax, parse_email};
