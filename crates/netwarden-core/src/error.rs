// ── Core error types ──
//
// User-facing errors from netwarden-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<netwarden_api::Error>`
// impl translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Gateway errors ───────────────────────────────────────────────
    /// Credentials rejected. No retry helps until the operator fixes them.
    #[error("Authentication failed: {message}")]
    AuthFailure { message: String },

    /// Session invalidated (usually by a competing web-UI login).
    /// Transparent re-login normally hides this from callers.
    #[error("Gateway session expired")]
    SessionExpired,

    /// Network-level failure talking to the gateway. The current cycle is
    /// aborted; the next poll retries from scratch.
    #[error("Gateway unreachable: {message}")]
    Transport { message: String },

    #[error("Gateway request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The gateway answered outside its documented wire format.
    #[error("Gateway protocol error: {message}")]
    Protocol { message: String },

    // ── State conflicts ──────────────────────────────────────────────
    /// `start` called while a lockdown is already active. The persisted
    /// state is left untouched.
    #[error("Lockdown is already active")]
    LockdownAlreadyActive,

    /// `stop` called while no lockdown is active.
    #[error("Lockdown is not active")]
    LockdownNotActive,

    // ── Lookup ───────────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Presence log error: {0}")]
    Csv(#[from] csv::Error),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Whether this failure class is worth retrying on the next poll cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::SessionExpired
        )
    }
}

// ── Conversion from transport-layer errors ──────────────────────────

impl From<netwarden_api::Error> for CoreError {
    fn from(err: netwarden_api::Error) -> Self {
        match err {
            netwarden_api::Error::Authentication { message } => CoreError::AuthFailure { message },
            netwarden_api::Error::SessionExpired => CoreError::SessionExpired,
            netwarden_api::Error::Transport(ref e) if e.is_timeout() => {
                CoreError::Timeout { timeout_secs: 0 }
            }
            netwarden_api::Error::Transport(e) => CoreError::Transport {
                message: e.to_string(),
            },
            netwarden_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            netwarden_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid gateway URL: {e}"),
            },
            netwarden_api::Error::Protocol { message, body: _ } => CoreError::Protocol { message },
        }
    }
}
