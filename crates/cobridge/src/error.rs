//! CLI error types with miette diagnostics.
//!
//! Maps call outcomes, config and api errors into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use cobridge_api::ApiCallResult;
use cobridge_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const RATE_LIMITED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {host}")]
    #[diagnostic(
        code(cobridge::connection_failed),
        help(
            "{message}\n\
             Check the host with: cobridge config show"
        )
    )]
    ConnectionFailed { host: String, message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("No API key configured")]
    #[diagnostic(
        code(cobridge::no_credentials),
        help(
            "Pass --api-key, set COBRIDGE_API_KEY, or configure api_key_env with:\n\
             cobridge config init --api-key-env <VAR>"
        )
    )]
    NoCredentials,

    // ── Call outcomes ────────────────────────────────────────────────
    #[error("{operation} failed: {outcome}")]
    #[diagnostic(code(cobridge::call_failed))]
    CallFailed {
        operation: &'static str,
        outcome: ApiCallResult,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(cobridge::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(cobridge::config))]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(cobridge::api))]
    Api(#[from] cobridge_api::Error),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(cobridge::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NoCredentials => exit_code::AUTH,
            Self::CallFailed { outcome, .. } => outcome_exit_code(*outcome),
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config(ConfigError::NoCredentials) => exit_code::AUTH,
            Self::Config(ConfigError::Validation { .. }) => exit_code::USAGE,
            Self::Api(e) if e.is_transport() => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}

fn outcome_exit_code(outcome: ApiCallResult) -> i32 {
    match outcome {
        ApiCallResult::Unauthorized => exit_code::AUTH,
        ApiCallResult::NotFound => exit_code::NOT_FOUND,
        ApiCallResult::Forbidden => exit_code::PERMISSION,
        ApiCallResult::Conflict => exit_code::CONFLICT,
        ApiCallResult::TooManyRequests => exit_code::RATE_LIMITED,
        _ => exit_code::GENERAL,
    }
}
