//! SMTP mailbox probing.
//!
//! [`SmtpProber`] walks the MX hosts of a domain in preference order, stops
//! the dialogue right after `RCPT TO` and classifies the reply into
//! [`SmtpStatus`]. A second `RCPT TO` on an improbable local part tells
//! whether the server is a catch-all.

mod error;
mod options;
mod probe;
mod session;
mod types;
mod util;

pub use error::SmtpVerifyError;
pub use options::SmtpProbeOptions;
pub use probe::{MailboxProber, SmtpProber};
pub use types::{ProbeTarget, SmtpDetails, SmtpStatus};

#[cfg(test)]
mod tests;
