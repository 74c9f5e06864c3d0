//! DNS existence + MX resolution with a shared, TTL-bounded cache.
//!
//! The entry point is [`DomainResolver::resolve`], which never fails: NXDOMAIN
//! and repeated timeouts both yield `dns_valid = false`.

mod error;
mod options;
mod resolver;
mod types;

pub use error::{LookupError, MxError};
pub use options::DnsOptions;
pub use resolver::{DomainResolver, LookupMx, system_resolver};
pub use types::{MxRecord, Resolution};

#[cfg(test)]
mod tests;
