use thiserror::Error;

#[derive(Debug, Error)]
pub enum MxError {
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: std::io::Error,
    },
}

impl MxError {
    pub(crate) fn resolver_init(source: std::io::Error) -> Self {
        Self::ResolverInit { source }
    }
}

/// Classified failure of a single DNS query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("domain does not exist (NXDOMAIN)")]
    NxDomain,
    #[error("no records of the requested type")]
    NoRecords,
    #[error("DNS query timed out")]
    Timeout,
    #[error("DNS lookup failed: {0}")]
    Failed(String),
}

impl From<trust_dns_resolver::error::ResolveError> for LookupError {
    fn from(err: trust_dns_resolver::error::ResolveError) -> Self {
        use trust_dns_resolver::error::ResolveErrorKind;
        use trust_dns_resolver::proto::op::ResponseCode;

        match err.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. }
                if *response_code == ResponseCode::NXDomain =>
            {
                Self::NxDomain
            }
            ResolveErrorKind::NoRecordsFound { .. } => Self::NoRecords,
            ResolveErrorKind::Timeout => Self::Timeout,
            _ => Self::Failed(err.to_string()),
        }
    }
}
