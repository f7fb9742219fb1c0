// ── Presence and lockdown events ──

use serde::{Deserialize, Serialize};

use super::device::Device;

/// A device's observed online/offline state changed relative to what was
/// previously recorded. The string forms ("arrived"/"left") are what lands
/// in the presence log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum TransitionKind {
    #[strum(serialize = "arrived")]
    Arrived,
    #[strum(serialize = "left")]
    Departed,
}

/// One state-change observation produced by the presence tracker.
#[derive(Debug, Clone)]
pub struct Transition {
    pub kind: TransitionKind,
    /// Snapshot of the device at transition time.
    pub device: Device,
    /// Whether this device's transitions should reach the notification
    /// sink. Logging happens regardless.
    pub notify_eligible: bool,
}

/// Event classes delivered to an [`EventSink`](crate::notify::EventSink).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum EventKind {
    Arrived,
    Departed,
    LockdownStarted,
    LockdownStopped,
}

impl From<TransitionKind> for EventKind {
    fn from(kind: TransitionKind) -> Self {
        match kind {
            TransitionKind::Arrived => Self::Arrived,
            TransitionKind::Departed => Self::Departed,
        }
    }
}

/// Payload handed to the notification sink.
#[derive(Debug, Clone)]
pub struct NotifyEvent {
    pub kind: EventKind,
    pub name: String,
    pub address: String,
}

impl NotifyEvent {
    pub fn from_transition(t: &Transition) -> Self {
        Self {
            kind: t.kind.into(),
            name: t.device.name.clone(),
            address: t.device.ip.clone(),
        }
    }
}
