use thiserror::Error;

/// Top-level error type for the `cobridge-api` crate.
///
/// HTTP-level failures never show up here: they reach callers as a non-OK
/// [`ApiCallResult`](crate::ApiCallResult). These variants cover host
/// configuration, the transport itself, and body decoding.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Host spec could not be split into an address and a port.
    #[error("Invalid host '{spec}': {reason}")]
    InvalidHost { spec: String, reason: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL built from the session could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The task driving an exchange panicked or was aborted.
    #[error("Exchange task failed: {0}")]
    ExchangeFailed(String),

    /// The exchange was asked for its response before it finished.
    #[error("Exchange polled before completion")]
    NotReady,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for failures raised while talking to the server,
    /// as opposed to local configuration or decoding problems.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::InvalidUrl(_) | Self::ExchangeFailed(_) | Self::NotReady
        )
    }
}
