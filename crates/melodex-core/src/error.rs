// ── Core error types ──
//
// Controller-facing errors from melodex-core. Consumers never see HTTP
// status codes or JSON parse failures directly; the `From<melodex_api::Error>`
// impl translates transport-layer errors into this taxonomy.
//
// `CoreError` is `Clone`: one deduplicated status fetch hands the same
// result to every controller awaiting it.

use thiserror::Error;

use melodex_api::Direction;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Session ──────────────────────────────────────────────────────
    #[error("Sign-in required: {message}")]
    AuthRequired { message: String },

    // ── Idempotent outcomes ──────────────────────────────────────────
    #[error("Already in desired state: {message}")]
    AlreadyInDesiredState { message: String },

    #[error("Not in desired state: {message}")]
    NotInDesiredState { message: String },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Server error: {message}")]
    Server {
        message: String,
        status: Option<u16>,
        code: Option<String>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn signed_out() -> Self {
        Self::AuthRequired {
            message: "no session token".into(),
        }
    }

    /// Returns `true` if this failure means a mutation in `direction`
    /// already reached its end state.
    pub fn settles(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Self::AlreadyInDesiredState { .. }, Direction::Add)
                | (Self::NotInDesiredState { .. }, Direction::Remove)
        )
    }

    /// Returns `true` if retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout => true,
            Self::Server { status, .. } => status.is_some_and(|s| s >= 500),
            _ => false,
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<melodex_api::Error> for CoreError {
    fn from(err: melodex_api::Error) -> Self {
        match err {
            melodex_api::Error::AuthRequired { message } => CoreError::AuthRequired { message },
            melodex_api::Error::AlreadyInDesiredState { message } => {
                CoreError::AlreadyInDesiredState { message }
            }
            melodex_api::Error::NotInDesiredState { message } => {
                CoreError::NotInDesiredState { message }
            }
            melodex_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if let Some(status) = e.status() {
                    CoreError::Server {
                        message: e.to_string(),
                        status: Some(status.as_u16()),
                        code: None,
                    }
                } else {
                    CoreError::Network {
                        message: e.to_string(),
                    }
                }
            }
            melodex_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            melodex_api::Error::InvalidBaseUrl { url } => CoreError::Config {
                message: format!("Base URL cannot carry API paths: {url}"),
            },
            melodex_api::Error::Tls(msg) => CoreError::Network {
                message: format!("TLS error: {msg}"),
            },
            melodex_api::Error::Api {
                status,
                message,
                code,
            } => CoreError::Server {
                message,
                status: Some(status),
                code,
            },
            melodex_api::Error::Deserialization { message, body: _ } => CoreError::Server {
                message: format!("Unexpected response: {message}"),
                status: None,
                code: None,
            },
        }
    }
}
