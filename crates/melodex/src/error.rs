//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use melodex_config::ConfigError;
use melodex_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Session ──────────────────────────────────────────────────────
    #[error("Not signed in")]
    #[diagnostic(
        code(melodex::signed_out),
        help(
            "Sign in with: melodex login --token <TOKEN>\n\
             Or set the MELODEX_TOKEN environment variable."
        )
    )]
    SignedOut,

    #[error("Session rejected: {message}")]
    #[diagnostic(
        code(melodex::auth_failed),
        help("Your token may have expired. Run: melodex login --token <TOKEN>")
    )]
    AuthFailed { message: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the catalog server: {message}")]
    #[diagnostic(
        code(melodex::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Override the address with --server or server.base_url in the config."
        )
    )]
    ConnectionFailed { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(melodex::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Server error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(melodex::api_error))]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Status of {key} is unknown: {message}")]
    #[diagnostic(code(melodex::check_failed))]
    CheckFailed { key: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(melodex::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(melodex::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(melodex::config))]
    Config(ConfigError),

    #[error("Internal error: {0}")]
    #[diagnostic(code(melodex::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(melodex::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SignedOut | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::ConfigExists { .. } => exit_code::CONFLICT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthRequired { message } => CliError::AuthFailed { message },
            CoreError::Network { message } => CliError::ConnectionFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::Server {
                message, status, ..
            } => CliError::Api { message, status },
            CoreError::AlreadyInDesiredState { message }
            | CoreError::NotInDesiredState { message } => CliError::Api {
                message,
                status: None,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "server".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_get_exit_codes() {
        let auth = CliError::from(CoreError::AuthRequired {
            message: "expired".into(),
        });
        assert_eq!(auth.exit_code(), exit_code::AUTH);
        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);
        assert_eq!(
            CliError::from(CoreError::Network {
                message: "refused".into()
            })
            .exit_code(),
            exit_code::CONNECTION
        );
    }

    #[test]
    fn api_error_shows_status() {
        let err = CliError::Api {
            message: "maintenance".into(),
            status: Some(503),
        };
        assert_eq!(err.to_string(), "Server error (503): maintenance");
    }
}
