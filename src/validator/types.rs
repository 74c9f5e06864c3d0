use std::fmt;

use thiserror::Error;

/// Adresse e-mail validée et normalisée. Immuable une fois construite.
///
/// La désérialisation repasse par [`parse_email`](super::parse_email): une
/// adresse ne peut pas exister sans avoir été validée.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    local: String,
    domain: String,
    ascii_domain: String,
}

impl EmailAddress {
    pub(crate) fn new(local: &str, domain: &str, ascii_domain: String) -> Self {
        Self {
            local: local.to_string(),
            domain: domain.to_lowercase(),
            ascii_domain,
        }
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    /// Domaine tel que saisi, en minuscules (peut contenir de l'Unicode).
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Domaine après conversion IDNA, utilisé pour toutes les requêtes réseau.
    pub fn ascii_domain(&self) -> &str {
        &self.ascii_domain
    }

    /// `local@ascii_domain`, en minuscules.
    pub fn normalized(&self) -> String {
        format!("{}@{}", self.local.to_lowercase(), self.ascii_domain)
    }
}

#[cfg(feature = "with-serde")]
impl<'de> serde::Deserialize<'de> for EmailAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // ascii_domain est recalculé
        #[derive(serde::Deserialize)]
        struct Raw {
            local: String,
            domain: String,
        }

        let raw = Raw::deserialize(deserializer)?;
        super::parse_email(&format!("{}@{}", raw.local, raw.domain))
            .map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.ascii_domain)
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxReport {
    pub valid: bool,
    pub address: Option<EmailAddress>,
    pub reasons: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid email syntax: {}", reasons.join("; "))]
pub struct SyntaxError {
    pub reasons: Vec<String>,
}
