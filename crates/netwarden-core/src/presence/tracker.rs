// ── Presence state machine ──
//
// Each poll cycle is a full replace of presence knowledge, not a diff feed:
// the tracker recomputes transitions by comparing every snapshot against
// the state it stored last cycle. Devices absent from a snapshot keep
// their previous state.

use std::collections::HashMap;

use chrono::{TimeDelta, Utc};
use tracing::debug;

use crate::model::{Device, MacAddress, Transition, TransitionKind};

/// Per-device presence state. A device the tracker has never seen is
/// `Unknown`; the first observation seeds `Online`/`Offline` without
/// emitting a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Unknown,
    Online,
    Offline,
}

/// One tracked device with its stored presence state.
#[derive(Debug, Clone)]
pub struct TrackedDevice {
    pub device: Device,
    state: PresenceState,
}

impl TrackedDevice {
    pub fn is_online(&self) -> bool {
        self.state == PresenceState::Online
    }

    /// Offline and unseen for longer than the horizon. Display-only:
    /// stale devices are never dropped from the tracker.
    pub fn is_stale(&self, horizon_secs: i64) -> bool {
        if self.is_online() {
            return false;
        }
        match self.device.last_seen {
            Some(seen) => Utc::now() - seen > TimeDelta::seconds(horizon_secs),
            None => true,
        }
    }
}

/// Ingests device snapshots and emits arrival/departure transitions.
pub struct PresenceTracker {
    devices: HashMap<MacAddress, TrackedDevice>,
    /// Lowercased name substrings; a matching device is notify-eligible.
    notify_patterns: Vec<String>,
}

impl PresenceTracker {
    pub fn new(notify_patterns: &[String]) -> Self {
        Self {
            devices: HashMap::new(),
            notify_patterns: notify_patterns.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Whether transitions of a device with this name propagate to the
    /// notification sink. Everything is logged regardless.
    pub fn is_notify_eligible(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.notify_patterns.iter().any(|p| name.contains(p))
    }

    /// Feed one snapshot and collect the transitions it implies.
    ///
    /// First observations seed state silently; later observations emit
    /// exactly one transition per actual state change. A hostname that
    /// resolves late replaces a MAC-placeholder name without a transition.
    pub fn observe(&mut self, snapshot: &[Device]) -> Vec<Transition> {
        let mut transitions = Vec::new();

        for seen in snapshot {
            let patterns = &self.notify_patterns;
            let tracked = self
                .devices
                .entry(seen.mac.clone())
                .or_insert_with(|| {
                    debug!(mac = %seen.mac, name = %seen.name, online = seen.online, "discovered device");
                    TrackedDevice {
                        device: seen.clone(),
                        state: PresenceState::Unknown,
                    }
                });

            // Attributes refresh on every snapshot.
            tracked.device.ip = seen.ip.clone();
            tracked.device.medium = seen.medium;
            tracked.device.online = seen.online;
            if seen.online {
                tracked.device.last_seen = Some(Utc::now());
            }

            // Late hostname resolution: upgrade a MAC-placeholder name.
            if tracked.device.name_is_mac() && !seen.name_is_mac() {
                debug!(mac = %seen.mac, name = %seen.name, "resolved device name");
                tracked.device.name = seen.name.clone();
            }

            let observed = if seen.online {
                PresenceState::Online
            } else {
                PresenceState::Offline
            };

            match tracked.state {
                // First sighting: seed without an event.
                PresenceState::Unknown => tracked.state = observed,
                prev if prev == observed => {}
                _ => {
                    tracked.state = observed;
                    let kind = if seen.online {
                        TransitionKind::Arrived
                    } else {
                        TransitionKind::Departed
                    };
                    let name = tracked.device.name.to_lowercase();
                    transitions.push(Transition {
                        kind,
                        device: tracked.device.clone(),
                        notify_eligible: patterns.iter().any(|p| name.contains(p)),
                    });
                }
            }
        }

        transitions
    }

    pub fn device(&self, mac: &MacAddress) -> Option<&TrackedDevice> {
        self.devices.get(mac)
    }

    pub fn devices(&self) -> impl Iterator<Item = &TrackedDevice> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn online_count(&self) -> usize {
        self.devices.values().filter(|d| d.is_online()).count()
    }
}
