// netwarden-core: domain model and state machines between netwarden-api
// and the CLI. Presence tracking, allowlist, lockdown orchestration.

pub mod allowlist;
pub mod error;
pub mod lockdown;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod presence;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
// Wire types consumers see through RouterSession's API surface.
pub use netwarden_api::{FilterAction, MacFilterEntry, SiteFilterEntry};

pub use allowlist::{AllowlistEntry, AllowlistStore};
pub use error::CoreError;
pub use lockdown::{
    BlockedDevice, LockdownController, LockdownMode, LockdownReport, LockdownStatus,
};
pub use model::{ConnectionMedium, Device, EventKind, MacAddress, NotifyEvent, Transition, TransitionKind};
pub use monitor::Monitor;
pub use notify::{EventSink, NullSink};
pub use presence::{PresenceLog, PresenceStats, PresenceTracker};
pub use session::{BlockOutcome, RouterControl, RouterSession, UnblockOutcome};
