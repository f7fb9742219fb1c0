// ── Poll loop ──
//
// Single cooperative cycle: fetch devices, compute transitions, log every
// one, notify the eligible ones, sleep. Nothing here runs in parallel with
// anything else against the router -- the session is shared and serialized.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::model::NotifyEvent;
use crate::notify::EventSink;
use crate::presence::{PresenceLog, PresenceTracker};
use crate::session::RouterControl;

/// Log an online/total summary every this many cycles.
const SUMMARY_EVERY: u64 = 10;

/// The presence monitor's poll/act loop.
pub struct Monitor {
    router: Arc<dyn RouterControl>,
    tracker: PresenceTracker,
    log: PresenceLog,
    sink: Arc<dyn EventSink>,
    interval: Duration,
    stale_after_secs: i64,
    cancel: CancellationToken,
    cycles: u64,
}

impl Monitor {
    pub fn new(
        router: Arc<dyn RouterControl>,
        tracker: PresenceTracker,
        log: PresenceLog,
        sink: Arc<dyn EventSink>,
        interval: Duration,
    ) -> Self {
        Self {
            router,
            tracker,
            log,
            sink,
            interval,
            stale_after_secs: 86_400,
            cancel: CancellationToken::new(),
            cycles: 0,
        }
    }

    /// Horizon after which an offline device counts as stale in the
    /// periodic summary. Stale devices are never dropped.
    pub fn with_stale_horizon(mut self, secs: i64) -> Self {
        self.stale_after_secs = secs;
        self
    }

    /// Token the embedder cancels to stop the loop after the current
    /// iteration. In-flight HTTP is bounded by its timeout, not aborted.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn tracker(&self) -> &PresenceTracker {
        &self.tracker
    }

    /// Run until cancelled. The first poll happens immediately, matching
    /// the startup behavior operators expect (state seeded before the
    /// first sleep).
    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "presence monitor starting");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => self.poll_once().await,
            }
        }

        info!("presence monitor stopped");
    }

    /// One poll cycle. Failures are logged and the cycle abandoned; the
    /// next tick retries from scratch.
    pub async fn poll_once(&mut self) {
        self.cycles += 1;

        let snapshot = self.router.devices().await;
        if snapshot.is_empty() {
            // Either the network is empty (implausible) or the session went
            // stale; the router layer has already scheduled a re-login.
            warn!("empty device snapshot, skipping cycle");
            return;
        }

        let transitions = self.tracker.observe(&snapshot);

        for transition in &transitions {
            info!(
                device = %transition.device.name,
                ip = %transition.device.ip,
                event = %transition.kind,
                "presence transition"
            );

            if let Err(e) = self.log.append(
                transition.kind,
                &transition.device.name,
                &transition.device.ip,
            ) {
                warn!(error = %e, "presence log append failed");
            }

            if transition.notify_eligible {
                let event = NotifyEvent::from_transition(transition);
                if !self.sink.notify(&event).await {
                    warn!(device = %transition.device.name, "notification delivery failed");
                }
            }
        }

        if self.cycles % SUMMARY_EVERY == 0 {
            let stale = self
                .tracker
                .devices()
                .filter(|d| d.is_stale(self.stale_after_secs))
                .count();
            info!(
                online = self.tracker.online_count(),
                total = self.tracker.len(),
                stale,
                "presence summary"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::error::CoreError;
    use crate::model::{ConnectionMedium, Device, MacAddress};
    use crate::session::{BlockOutcome, UnblockOutcome};
    use netwarden_api::MacFilterEntry;

    /// Router double that serves a scripted sequence of snapshots.
    struct ScriptedRouter {
        snapshots: Mutex<Vec<Vec<Device>>>,
    }

    impl ScriptedRouter {
        fn new(snapshots: Vec<Vec<Device>>) -> Self {
            let mut snapshots = snapshots;
            snapshots.reverse();
            Self {
                snapshots: Mutex::new(snapshots),
            }
        }
    }

    #[async_trait]
    impl RouterControl for ScriptedRouter {
        async fn devices(&self) -> Vec<Device> {
            self.snapshots.lock().unwrap().pop().unwrap_or_default()
        }

        async fn blocked_entries(&self) -> Result<Vec<MacFilterEntry>, CoreError> {
            Ok(Vec::new())
        }

        async fn block_device(
            &self,
            _mac: &MacAddress,
            _name: &str,
        ) -> Result<BlockOutcome, CoreError> {
            Ok(BlockOutcome::Blocked)
        }

        async fn unblock_device(&self, _mac: &MacAddress) -> Result<UnblockOutcome, CoreError> {
            Ok(UnblockOutcome::Unblocked)
        }

        async fn replace_mac_filter(
            &self,
            _entries: Vec<MacFilterEntry>,
            _enable: bool,
            _allow_all: bool,
        ) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<NotifyEvent>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn notify(&self, event: &NotifyEvent) -> bool {
            self.events.lock().unwrap().push(event.clone());
            true
        }
    }

    fn device(mac: &str, name: &str, online: bool) -> Device {
        Device {
            mac: MacAddress::new(mac),
            name: name.into(),
            ip: "192.168.0.42".into(),
            medium: ConnectionMedium::Wired,
            online,
            last_seen: None,
        }
    }

    #[tokio::test]
    async fn transitions_are_logged_but_only_eligible_ones_notified() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("presence_history.csv");

        let router = Arc::new(ScriptedRouter::new(vec![
            // Cycle 1: both offline (seeds state, no events).
            vec![
                device("AA:AA:AA:AA:AA:01", "Redmi Note", false),
                device("AA:AA:AA:AA:AA:02", "smart-tv", false),
            ],
            // Cycle 2: both arrive.
            vec![
                device("AA:AA:AA:AA:AA:01", "Redmi Note", true),
                device("AA:AA:AA:AA:AA:02", "smart-tv", true),
            ],
        ]));
        let sink = Arc::new(RecordingSink::default());

        let mut monitor = Monitor::new(
            Arc::clone(&router) as Arc<dyn RouterControl>,
            PresenceTracker::new(&["redmi".into()]),
            PresenceLog::new(&log_path),
            Arc::clone(&sink) as Arc<dyn EventSink>,
            Duration::from_secs(30),
        );

        monitor.poll_once().await;
        monitor.poll_once().await;

        // Both transitions are in the CSV log...
        let raw = std::fs::read_to_string(&log_path).unwrap();
        assert!(raw.contains("Redmi Note"));
        assert!(raw.contains("smart-tv"));

        // ...but only the pattern match reached the sink.
        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Redmi Note");
    }

    #[tokio::test]
    async fn empty_snapshot_skips_the_cycle() {
        let dir = TempDir::new().unwrap();
        let router = Arc::new(ScriptedRouter::new(vec![
            vec![device("AA:AA:AA:AA:AA:01", "phone", true)],
            vec![], // stale-session cycle
            vec![device("AA:AA:AA:AA:AA:01", "phone", true)],
        ]));
        let sink = Arc::new(RecordingSink::default());

        let mut monitor = Monitor::new(
            Arc::clone(&router) as Arc<dyn RouterControl>,
            PresenceTracker::new(&["phone".into()]),
            PresenceLog::new(dir.path().join("log.csv")),
            Arc::clone(&sink) as Arc<dyn EventSink>,
            Duration::from_secs(30),
        );

        monitor.poll_once().await;
        monitor.poll_once().await;
        monitor.poll_once().await;

        // The empty snapshot neither marked the device offline nor produced
        // a spurious departure/arrival pair.
        assert!(sink.events.lock().unwrap().is_empty());
        assert_eq!(monitor.tracker().online_count(), 1);
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let router = Arc::new(ScriptedRouter::new(vec![]));
        let monitor = Monitor::new(
            router as Arc<dyn RouterControl>,
            PresenceTracker::new(&[]),
            PresenceLog::new("/tmp/netwarden-test-unused.csv"),
            Arc::new(crate::notify::NullSink) as Arc<dyn EventSink>,
            Duration::from_secs(3600),
        );

        let cancel = monitor.cancellation_token();
        let handle = tokio::spawn(monitor.run());
        cancel.cancel();
        handle.await.unwrap();
    }
}
