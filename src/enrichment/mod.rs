//! Descriptive facts about an address that do not affect its validity:
//! mailbox provider, free-mail domain, sub-addressing tag.

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::classifier::Classifier;
use crate::mx::MxRecord;
use crate::validator::EmailAddress;

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Enrichment {
    /// Mailbox provider recognised from the MX hosts (`Google`, `Microsoft`…).
    pub provider: Option<String>,
    pub free_provider: bool,
    /// `tag` in `user+tag@domain`.
    pub plus_tag: Option<String>,
    /// Lower-cased address with the tag removed.
    pub canonical: String,
}

pub fn enrich(
    address: &EmailAddress,
    classifier: &Classifier,
    mx_hosts: &[MxRecord],
) -> Enrichment {
    let provider = mx_hosts
        .iter()
        .find_map(|record| classifier.provider_for_mx(&record.exchange))
        .map(str::to_string);

    let local = address.local().to_lowercase();
    let (base, plus_tag) = match local.split_once('+') {
        Some((base, tag)) if !tag.is_empty() => (base.to_string(), Some(tag.to_string())),
        Some((base, _)) => (base.to_string(), None),
        None => (local.clone(), None),
    };

    Enrichment {
        provider,
        free_provider: classifier.is_free_provider(address.ascii_domain()),
        plus_tag,
        canonical: format!("{base}@{}", address.ascii_domain()),
    }
}
