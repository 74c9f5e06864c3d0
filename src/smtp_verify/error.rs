use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmtpVerifyError {
    #[error("TLS connector initialization failed: {source}")]
    TlsInit {
        #[source]
        source: native_tls::Error,
    },
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable address for {host}")]
    NoAddress { host: String },
    #[error("connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
    #[error("TLS handshake failed: {source}")]
    Tls {
        #[source]
        source: native_tls::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("per-host deadline exceeded")]
    DeadlineExceeded,
}

impl SmtpVerifyError {
    pub(crate) fn io(source: std::io::Error) -> Self {
        Self::Io { source }
    }

    /// Connection-level failures leave the stream unusable: no point in
    /// sending `QUIT` afterwards.
    pub(crate) fn breaks_session(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Tls { .. } | Self::Protocol(_) | Self::DeadlineExceeded
        )
    }
}
