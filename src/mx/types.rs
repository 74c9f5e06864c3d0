#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }

    /// RFC 7505 "null MX": the domain explicitly accepts no mail.
    pub fn is_null(&self) -> bool {
        self.exchange.is_empty() || self.exchange == "."
    }
}

/// Outcome of resolving a mail domain. Never an error: definitive failures
/// collapse to `dns_valid = false`, transient ones set `transient`.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub dns_valid: bool,
    pub mx_valid: bool,
    /// Ascending preference.
    pub mx_hosts: Vec<MxRecord>,
    /// Timeout after the retry, or a resolver failure (SERVFAIL, refused...).
    /// `dns_valid`/`mx_valid` are then meaningless and the result is not cached.
    pub transient: bool,
}

impl Resolution {
    pub(crate) fn missing() -> Self {
        Self {
            dns_valid: false,
            mx_valid: false,
            mx_hosts: Vec::new(),
            transient: false,
        }
    }

    pub(crate) fn transient() -> Self {
        Self {
            transient: true,
            ..Self::missing()
        }
    }
}
