use thiserror::Error;

/// Top-level error type for the `melodex-api` crate.
///
/// Idempotent failures (the relationship already holds, or is already
/// absent) get their own variants so callers never inspect message text.
/// `melodex-core` maps these into controller-level outcomes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// No bearer token, or the backend rejected it.
    #[error("Authentication required: {message}")]
    AuthRequired { message: String },

    // ── Idempotent outcomes ─────────────────────────────────────────
    /// `add` failed because the relationship already exists.
    #[error("Already in desired state: {message}")]
    AlreadyInDesiredState { message: String },

    /// `remove` failed because the relationship is already absent.
    #[error("Not in desired state: {message}")]
    NotInDesiredState { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The configured base URL cannot carry path segments (e.g. `mailto:`).
    #[error("Base URL cannot be used for API paths: {url}")]
    InvalidBaseUrl { url: String },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Any failure the backend reported that is not one of the above.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the backend says the requested end state already holds.
    pub fn is_idempotent(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInDesiredState { .. } | Self::NotInDesiredState { .. }
        )
    }

    /// Returns `true` if signing in again might resolve this error.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Extract the structured backend error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
