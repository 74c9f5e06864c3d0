use std::collections::{HashMap, HashSet};

use phf::{phf_map, phf_set};

const DISPOSABLE_DOMAINS: phf::Set<&'static str> = phf_set! {
    "10minutemail.com", "20minutemail.com", "33mail.com", "burnermail.io",
    "discard.email", "dispostable.com", "emailondeck.com", "fakeinbox.com",
    "getnada.com", "grr.la", "guerrillamail.com", "guerrillamail.net",
    "guerrillamailblock.com", "mailcatch.com", "maildrop.cc", "mailinator.com",
    "mailnesia.com", "mintemail.com", "moakt.com", "mohmal.com", "mytemp.email",
    "sharklasers.com", "spambox.us", "spamgourmet.com", "tempail.com",
    "temp-mail.org", "tempmail.com", "tempr.email", "throwawaymail.com",
    "trashmail.com", "yopmail.com",
};

const ROLE_PREFIXES: phf::Set<&'static str> = phf_set! {
    "abuse", "accounts", "admin", "administrator", "billing", "careers",
    "contact", "enquiries", "feedback", "hello", "help", "hostmaster", "hr",
    "info", "jobs", "legal", "marketing", "media", "newsletter", "no-reply",
    "noreply", "office", "postmaster", "press", "privacy", "root", "sales",
    "security", "service", "support", "team", "webmaster",
};

const SPAMTRAP_DOMAINS: phf::Set<&'static str> = phf_set! {
    "spamtrap.com", "spamtraps.net", "trapmail.org", "honeypot-mail.net",
};

// domaines réservés (RFC 2606) et bouche-trous courants
const BLACKLISTED_DOMAINS: phf::Set<&'static str> = phf_set! {
    "example.com", "example.net", "example.org", "test.com", "sample.com",
    "fake.com", "invalid.invalid", "localhost.localdomain",
};

const FREE_PROVIDERS: phf::Set<&'static str> = phf_set! {
    "163.com", "aol.com", "email.com", "fastmail.com", "gmail.com", "gmx.com", "gmx.de",
    "googlemail.com", "hotmail.com", "icloud.com", "live.com", "mac.com",
    "mail.com", "me.com", "msn.com", "outlook.com", "proton.me",
    "protonmail.com", "qq.com", "rocketmail.com", "web.de", "yahoo.com",
    "yandex.com", "ymail.com", "zoho.com",
};

// acceptent tout RCPT TO pendant la session: sonde inutile
const PROBE_BLOCKING_PROVIDERS: phf::Set<&'static str> = phf_set! {
    "aol.com", "rocketmail.com", "yahoo.com", "ymail.com",
};

const PROBE_BLOCKING_MX_SUFFIXES: phf::Set<&'static str> = phf_set! {
    "yahoodns.net", "mimecast.com", "pphosted.com", "messagelabs.com",
    "barracudanetworks.com",
};

const PROVIDER_MX_SUFFIXES: phf::Map<&'static str, &'static str> = phf_map! {
    "google.com" => "Google",
    "googlemail.com" => "Google",
    "outlook.com" => "Microsoft",
    "yahoodns.net" => "Yahoo",
    "icloud.com" => "Apple",
    "zoho.com" => "Zoho",
    "protonmail.ch" => "Proton",
    "mimecast.com" => "Mimecast",
    "pphosted.com" => "Proofpoint",
};

const TYPO_TARGETS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "icloud.com",
    "aol.com",
    "live.com",
    "msn.com",
    "protonmail.com",
    "comcast.net",
];

fn owned_set(set: &phf::Set<&'static str>) -> HashSet<String> {
    set.iter().map(|s| s.to_string()).collect()
}

fn lowered<I, S>(items: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Immutable lookup tables used by [`Classifier`](super::Classifier).
///
/// Built once at startup from the compiled-in defaults ([`Lists::builtin`]);
/// every table can be replaced before the lists are handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lists {
    pub(crate) disposable: HashSet<String>,
    pub(crate) role_prefixes: HashSet<String>,
    pub(crate) spamtrap: HashSet<String>,
    pub(crate) blacklisted: HashSet<String>,
    pub(crate) free_providers: HashSet<String>,
    pub(crate) probe_blocking: HashSet<String>,
    pub(crate) probe_blocking_mx: HashSet<String>,
    pub(crate) provider_mx: HashMap<String, String>,
    pub(crate) typo_targets: Vec<String>,
}

impl Default for Lists {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Lists {
    pub fn builtin() -> Self {
        Self {
            disposable: owned_set(&DISPOSABLE_DOMAINS),
            role_prefixes: owned_set(&ROLE_PREFIXES),
            spamtrap: owned_set(&SPAMTRAP_DOMAINS),
            blacklisted: owned_set(&BLACKLISTED_DOMAINS),
            free_providers: owned_set(&FREE_PROVIDERS),
            probe_blocking: owned_set(&PROBE_BLOCKING_PROVIDERS),
            probe_blocking_mx: owned_set(&PROBE_BLOCKING_MX_SUFFIXES),
            provider_mx: PROVIDER_MX_SUFFIXES
                .entries()
                .map(|(suffix, name)| (suffix.to_string(), name.to_string()))
                .collect(),
            typo_targets: TYPO_TARGETS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Lists with every table empty; tests start from here.
    pub fn empty() -> Self {
        Self {
            disposable: HashSet::new(),
            role_prefixes: HashSet::new(),
            spamtrap: HashSet::new(),
            blacklisted: HashSet::new(),
            free_providers: HashSet::new(),
            probe_blocking: HashSet::new(),
            probe_blocking_mx: HashSet::new(),
            provider_mx: HashMap::new(),
            typo_targets: Vec::new(),
        }
    }

    pub fn with_disposable<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.disposable = lowered(domains);
        self
    }

    pub fn with_role_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.role_prefixes = lowered(prefixes);
        self
    }

    pub fn with_spamtraps<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.spamtrap = lowered(domains);
        self
    }

    pub fn with_blacklist<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blacklisted = lowered(domains);
        self
    }

    pub fn with_free_providers<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.free_providers = lowered(domains);
        self
    }

    pub fn with_probe_blocking<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.probe_blocking = lowered(domains);
        self
    }

    pub fn with_probe_blocking_mx<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.probe_blocking_mx = lowered(suffixes);
        self
    }

    pub fn with_typo_targets<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.typo_targets = lowered(domains).into_iter().collect();
        self.typo_targets.sort();
        self
    }

    pub fn disposable_count(&self) -> usize {
        self.disposable.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_are_populated() {
        let lists = Lists::builtin();
        assert!(lists.disposable.contains("mailinator.com"));
        assert!(lists.role_prefixes.contains("admin"));
        assert!(!lists.role_prefixes.contains("test"));
        assert_eq!(lists.provider_mx.get("google.com").map(String::as_str), Some("Google"));
        assert_eq!(lists.typo_targets.len(), TYPO_TARGETS.len());
    }

    #[test]
    fn injected_tables_are_normalised() {
        let lists = Lists::empty().with_disposable([" Burner.TEST ", ""]);
        assert_eq!(lists.disposable_count(), 1);
        assert!(lists.disposable.contains("burner.test"));
    }
}
