// ── Notification sink seam ──
//
// The sink is an external collaborator: presence transitions and lockdown
// state changes are pushed at it, and a delivery failure is the caller's
// problem to log, never to propagate. The Telegram implementation lives in
// the binary crate.

use async_trait::async_trait;

use crate::model::NotifyEvent;

/// Receives transition and lockdown events for notification.
///
/// Implementations return `false` on delivery failure; callers log that and
/// move on -- the poll loop must never die because a notification bounced.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn notify(&self, event: &NotifyEvent) -> bool;
}

/// Sink that discards everything. Used when no notification channel is
/// configured and in tests.
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn notify(&self, _event: &NotifyEvent) -> bool {
        true
    }
}
