use std::borrow::Cow;
use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Configuration knobs for [`SmtpProber`](super::SmtpProber).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpProbeOptions {
    pub port: u16,
    /// Name announced in EHLO/HELO. `localhost` when unset.
    pub helo_domain: Option<String>,
    /// Reverse-path of the probe. The null sender (`<>`) when unset.
    pub mail_from: Option<String>,
    pub connect_timeout: Duration,
    /// Read/write deadline applied to every command.
    pub command_timeout: Duration,
    /// Hard limit on a whole conversation with one MX host, however slowly
    /// the server trickles its replies.
    pub host_timeout: Duration,
    pub max_mx: usize,
    /// Upgrade with STARTTLS when the server advertises it.
    pub starttls: bool,
    pub ipv6: bool,
}

impl Default for SmtpProbeOptions {
    fn default() -> Self {
        Self {
            port: 25,
            helo_domain: None,
            mail_from: None,
            connect_timeout: Duration::from_secs(7),
            command_timeout: Duration::from_secs(7),
            host_timeout: Duration::from_secs(21),
            max_mx: 3,
            starttls: true,
            ipv6: false,
        }
    }
}

impl SmtpProbeOptions {
    pub fn helo_name(&self) -> Cow<'_, str> {
        match self.helo_domain.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Cow::Borrowed(name),
            _ => Cow::Borrowed("localhost"),
        }
    }

    /// Full `MAIL FROM` command.
    pub fn envelope(&self) -> String {
        match self.mail_from.as_deref().map(str::trim) {
            Some(sender) if !sender.is_empty() => format!("MAIL FROM:<{sender}>"),
            _ => "MAIL FROM:<>".to_string(),
        }
    }

    /// Every timeout from a single knob, as the CLI exposes: `timeout` per
    /// I/O and three times that for the whole host.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.command_timeout = timeout;
        self.host_timeout = timeout.saturating_mul(3);
        self
    }
}
