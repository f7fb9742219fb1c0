use thiserror::Error;

/// Top-level error type for the `netwarden-api` crate.
///
/// Mirrors the gateway's observable failure modes: credential rejection,
/// silent session invalidation, plain transport trouble, and responses that
/// don't match the vendor's wire format. `netwarden-core` maps these into
/// domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, credentials missing, login rejected).
    /// Unrecoverable without operator action.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The session cookie is no longer accepted. The gateway allows one
    /// authenticated session at a time, so a competing login elsewhere
    /// produces this without warning. Recoverable by re-login.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Wire format ─────────────────────────────────────────────────
    /// The gateway answered with something outside its documented shape:
    /// a non-"ok" business code, unparseable JSON, or a missing payload.
    /// Not retryable; surfaced as a logged anomaly.
    #[error("Protocol error: {message}")]
    Protocol { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the session is dead and
    /// re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Returns `true` if this is a transient error worth retrying on the
    /// next poll cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
