//! Static classification of addresses: disposable providers, role accounts,
//! spam traps, blacklists, local-part patterns and provider typos.
//!
//! Everything here is set membership over [`Lists`]; no I/O.

mod lists;
mod patterns;
mod typo;

use std::sync::Arc;

pub use lists::Lists;
pub use patterns::PatternFlag;

use crate::validator::EmailAddress;

#[derive(Debug, Clone)]
pub struct Classifier {
    lists: Arc<Lists>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Lists::builtin())
    }
}

impl Classifier {
    pub fn new(lists: Lists) -> Self {
        Self {
            lists: Arc::new(lists),
        }
    }

    pub fn lists(&self) -> &Lists {
        &self.lists
    }

    /// Exact match, or one of the parent domains is listed
    /// (`eu.mailinator.com` counts as `mailinator.com`).
    pub fn is_disposable(&self, domain: &str) -> bool {
        matches_domain_or_parent(&self.lists.disposable, domain)
    }

    pub fn is_role_based(&self, local: &str) -> bool {
        let lower = local.to_ascii_lowercase();
        let base = lower.split('+').next().unwrap_or_default();
        if self.lists.role_prefixes.contains(base) {
            return true;
        }
        base.split(['.', '-', '_'])
            .next()
            .is_some_and(|token| self.lists.role_prefixes.contains(token))
    }

    pub fn is_spamtrap(&self, domain: &str) -> bool {
        matches_domain_or_parent(&self.lists.spamtrap, domain)
    }

    pub fn is_blacklisted(&self, domain: &str) -> bool {
        matches_domain_or_parent(&self.lists.blacklisted, domain)
    }

    pub fn is_free_provider(&self, domain: &str) -> bool {
        self.lists
            .free_providers
            .contains(&domain.to_ascii_lowercase())
    }

    pub fn is_probe_blocking(&self, domain: &str) -> bool {
        self.lists
            .probe_blocking
            .contains(&domain.to_ascii_lowercase())
    }

    /// True when the MX host belongs to an infrastructure known to accept
    /// every recipient during the SMTP dialogue.
    pub fn is_probe_blocking_mx(&self, exchange: &str) -> bool {
        matches_domain_or_parent(&self.lists.probe_blocking_mx, exchange)
    }

    /// Provider name for an MX host (`alt1.aspmx.l.google.com` → `Google`).
    pub fn provider_for_mx(&self, exchange: &str) -> Option<&str> {
        let exchange = exchange.trim_end_matches('.').to_ascii_lowercase();
        parent_domains(&exchange)
            .find_map(|candidate| self.lists.provider_mx.get(candidate))
            .map(String::as_str)
    }

    pub fn patterns(&self, local: &str) -> Vec<PatternFlag> {
        patterns::analyze_local(local)
    }

    /// Typo correction for the domain of `address`, as a full address.
    pub fn suggest(&self, address: &EmailAddress) -> Option<String> {
        let domain = address.ascii_domain();
        if self.lists.free_providers.contains(domain) || self.is_disposable(domain) {
            return None;
        }
        typo::closest_target(domain, &self.lists.typo_targets)
            .map(|target| format!("{}@{}", address.local(), target))
    }
}

fn matches_domain_or_parent(set: &std::collections::HashSet<String>, domain: &str) -> bool {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    parent_domains(&domain).any(|candidate| set.contains(candidate))
}

/// `a.b.example.com` → `a.b.example.com`, `b.example.com`, `example.com`
/// (never the bare TLD).
fn parent_domains(domain: &str) -> impl Iterator<Item = &str> {
    let labels = domain.split('.').count();
    let mut rest = Some(domain);
    (0..labels.saturating_sub(1)).filter_map(move |_| {
        let current = rest?;
        rest = current.split_once('.').map(|(_, tail)| tail);
        Some(current)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::parse_email;

    #[test]
    fn disposable_matches_parents() {
        let c = Classifier::default();
        assert!(c.is_disposable("mailinator.com"));
        assert!(c.is_disposable("EU.Mailinator.com"));
        assert!(!c.is_disposable("gmail.com"));
        assert!(!c.is_disposable("com"));
    }

    #[test]
    fn role_prefix_checks() {
        let c = Classifier::default();
        assert!(c.is_role_based("admin"));
        assert!(c.is_role_based("Support+tickets"));
        assert!(c.is_role_based("sales.emea"));
        assert!(!c.is_role_based("user"));
        assert!(!c.is_role_based("test"));
        assert!(!c.is_role_based("information"));
    }

    #[test]
    fn injected_lists_replace_builtins() {
        let c = Classifier::new(
            Lists::builtin()
                .with_disposable(["burner.test"])
                .with_role_prefixes(["ops"]),
        );
        assert!(c.is_disposable("burner.test"));
        assert!(!c.is_disposable("mailinator.com"));
        assert!(c.is_role_based("ops"));
        assert!(!c.is_role_based("admin"));
    }

    #[test]
    fn provider_from_mx_host() {
        let c = Classifier::default();
        assert_eq!(c.provider_for_mx("alt1.aspmx.l.google.com."), Some("Google"));
        assert_eq!(c.provider_for_mx("mx.acme.io"), None);
        assert!(c.is_probe_blocking_mx("mta7.am0.yahoodns.net"));
    }

    #[test]
    fn suggestion_is_full_address() {
        let c = Classifier::default();
        let address = parse_email("jane@gmial.com").expect("valid");
        assert_eq!(c.suggest(&address).as_deref(), Some("jane@gmail.com"));

        let exact = parse_email("jane@mail.com").expect("valid");
        assert_eq!(c.suggest(&exact), None);
    }

    #[test]
    fn parents_skip_tld() {
        let parents: Vec<&str> = parent_domains("a.b.example.com").collect();
        assert_eq!(parents, vec!["a.b.example.com", "b.example.com", "example.com"]);
        assert_eq!(parent_domains("localhost").count(), 0);
    }
}
