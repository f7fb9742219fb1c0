//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`/`ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use netwarden_config::ConfigError;
use netwarden_core::CoreError;

/// Exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Gateway ──────────────────────────────────────────────────────
    #[error("Could not reach the gateway")]
    #[diagnostic(
        code(netwarden::connection_failed),
        help(
            "Check that the gateway is up and the URL in your config is right.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Gateway authentication failed")]
    #[diagnostic(
        code(netwarden::auth_failed),
        help(
            "Verify router.username and the password in your config.\n\
             Run: netwarden config init\n\
             Detail: {message}"
        )
    )]
    AuthFailed { message: String },

    #[error("Gateway request timed out")]
    #[diagnostic(
        code(netwarden::timeout),
        help("The gateway may be busy applying a change; try again.")
    )]
    Timeout,

    #[error("Gateway answered outside its expected format: {message}")]
    #[diagnostic(
        code(netwarden::protocol),
        help(
            "This usually means a firmware change or a half-dead session.\n\
             Re-run with -vv to see the raw exchange."
        )
    )]
    Protocol { message: String },

    // ── State conflicts ──────────────────────────────────────────────
    #[error("Lockdown is already active")]
    #[diagnostic(
        code(netwarden::lockdown_active),
        help("Run: netwarden lockdown status\nStop it first: netwarden lockdown stop")
    )]
    LockdownAlreadyActive,

    #[error("Lockdown is not active")]
    #[diagnostic(code(netwarden::lockdown_inactive), help("Nothing to stop."))]
    LockdownNotActive,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(netwarden::not_found),
        help("Run: netwarden {list_command} to see what's available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation / interactive ─────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netwarden::validation))]
    Validation { field: String, reason: String },

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(netwarden::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    ConfirmationRequired { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error")]
    #[diagnostic(
        code(netwarden::config),
        help("Create or fix the config with: netwarden config init")
    )]
    Config(#[source] Box<ConfigError>),

    // ── Catch-all ────────────────────────────────────────────────────
    #[error("Operation failed: {message}")]
    #[diagnostic(code(netwarden::operation_failed))]
    OperationFailed { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(netwarden::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Protocol { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::LockdownAlreadyActive | Self::LockdownNotActive => exit_code::CONFLICT,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ConfirmationRequired { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthFailure { message } => CliError::AuthFailed { message },

            CoreError::SessionExpired => CliError::AuthFailed {
                message: "session expired and re-login did not recover it".into(),
            },

            CoreError::Transport { message } => CliError::ConnectionFailed { reason: message },

            CoreError::Timeout { .. } => CliError::Timeout,

            CoreError::Protocol { message } => CliError::Protocol { message },

            CoreError::LockdownAlreadyActive => CliError::LockdownAlreadyActive,

            CoreError::LockdownNotActive => CliError::LockdownNotActive,

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices list".into(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Io(e) => CliError::Io(e),

            CoreError::Serialization(e) => CliError::Json(e),

            CoreError::Csv(e) => CliError::OperationFailed {
                message: format!("presence log error: {e}"),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(Box::new(err))
    }
}
