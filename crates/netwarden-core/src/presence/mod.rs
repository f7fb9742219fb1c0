// ── Presence subsystem ──

mod log;
mod tracker;

pub use log::{PresenceLog, PresenceStats};
pub use tracker::{PresenceState, PresenceTracker, TrackedDevice};
