use thiserror::Error;

use crate::mx::MxError;
use crate::smtp_verify::SmtpVerifyError;

/// Rejected input. Raised before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("email address is empty")]
    EmptyEmail,
    #[error("batch contains no address")]
    EmptyBatch,
}

/// The engine could not be assembled.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Resolver(#[from] MxError),
    #[error(transparent)]
    Smtp(#[from] SmtpVerifyError),
}
