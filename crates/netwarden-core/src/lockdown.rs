// ── Lockdown controller ──
//
// Blocks everything except allowlisted devices, in one of two modes:
//
//  - strict: the router itself switches to allowlist mode (allowall=false),
//    so devices connecting after activation are blocked too;
//  - soft: one Block entry per currently visible non-allowlisted device.
//    Devices arriving later are NOT blocked. That asymmetry is the
//    documented trade-off of soft mode, not a bug to fix.
//
// State persists to a single JSON document so a restart can still stop a
// lockdown it didn't start.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use netwarden_api::{FilterAction, MacFilterEntry};

use crate::allowlist::AllowlistStore;
use crate::error::CoreError;
use crate::model::{Device, EventKind, NotifyEvent};
use crate::notify::{EventSink, NullSink};
use crate::session::{BlockOutcome, RouterControl, UnblockOutcome};

/// Lockdown flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum LockdownMode {
    #[strum(serialize = "strict")]
    Strict,
    #[strum(serialize = "soft")]
    Soft,
}

/// A device recorded in persisted lockdown state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDevice {
    pub name: String,
    pub mac: String,
}

impl BlockedDevice {
    fn from_device(d: &Device) -> Self {
        Self {
            name: d.name.clone(),
            mac: d.mac.to_string(),
        }
    }
}

/// A device whose block/unblock write failed, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedDevice {
    pub name: String,
    pub mac: String,
    pub error: String,
}

/// The persisted document. Exactly one of these exists at a time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LockdownState {
    #[serde(default)]
    active: bool,
    #[serde(default)]
    mode: Option<LockdownMode>,
    #[serde(default)]
    blocked_devices: Vec<BlockedDevice>,
    #[serde(default)]
    allowlisted_devices: Vec<BlockedDevice>,
    #[serde(default)]
    failed_devices: Vec<FailedDevice>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    stopped_at: Option<DateTime<Utc>>,
}

/// Pure read of the persisted state, for `status` surfaces.
#[derive(Debug, Clone)]
pub struct LockdownStatus {
    pub active: bool,
    pub mode: Option<LockdownMode>,
    pub blocked_devices: Vec<BlockedDevice>,
    pub started_at: Option<DateTime<Utc>>,
}

/// What a start/stop accomplished, for the operator.
#[derive(Debug, Clone)]
pub struct LockdownReport {
    pub message: String,
    pub devices: Vec<BlockedDevice>,
    pub failed: Vec<FailedDevice>,
}

/// Orchestrates lockdown over the shared router session and the allowlist.
pub struct LockdownController {
    router: Arc<dyn RouterControl>,
    allowlist: Arc<AllowlistStore>,
    state_path: PathBuf,
    sink: Arc<dyn EventSink>,
}

impl LockdownController {
    pub fn new(
        router: Arc<dyn RouterControl>,
        allowlist: Arc<AllowlistStore>,
        state_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            router,
            allowlist,
            state_path: state_path.into(),
            sink: Arc::new(NullSink),
        }
    }

    /// Attach a sink for LockdownStarted/LockdownStopped events.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    // ── Persistence ──────────────────────────────────────────────────

    fn load_state(&self) -> LockdownState {
        match fs::read_to_string(&self.state_path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %self.state_path.display(), error = %e, "lockdown state unreadable, assuming inactive");
                LockdownState::default()
            }),
            Err(_) => LockdownState::default(),
        }
    }

    fn save_state(&self, state: &LockdownState) -> Result<(), CoreError> {
        if let Some(parent) = self.state_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.state_path, serde_json::to_string_pretty(state)?)?;
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Pure read of persisted state. Never touches the router.
    pub fn status(&self) -> LockdownStatus {
        let state = self.load_state();
        LockdownStatus {
            active: state.active,
            mode: state.mode,
            blocked_devices: state.blocked_devices,
            started_at: state.started_at,
        }
    }

    /// Visible devices that are not allowlisted -- what a start would block.
    pub async fn devices_to_block(&self) -> Result<Vec<Device>, CoreError> {
        let allowed = self.allowlist.macs()?;
        Ok(self
            .router
            .devices()
            .await
            .into_iter()
            .filter(|d| !allowed.contains(&d.mac))
            .collect())
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Start a lockdown. Fails with [`CoreError::LockdownAlreadyActive`]
    /// when one is already running; dry-run computes the block set without
    /// touching the router or the persisted state.
    pub async fn start(
        &self,
        mode: LockdownMode,
        dry_run: bool,
    ) -> Result<LockdownReport, CoreError> {
        if self.load_state().active {
            return Err(CoreError::LockdownAlreadyActive);
        }

        let to_block = self.devices_to_block().await?;

        if dry_run {
            let scope = match mode {
                LockdownMode::Strict => "blocks all unknown",
                LockdownMode::Soft => "blocks visible only",
            };
            return Ok(LockdownReport {
                message: format!(
                    "[{mode} - {scope}] would block {} devices",
                    to_block.len()
                ),
                devices: to_block.iter().map(BlockedDevice::from_device).collect(),
                failed: Vec::new(),
            });
        }

        let report = match mode {
            LockdownMode::Strict => self.start_strict(&to_block).await?,
            LockdownMode::Soft => self.start_soft(&to_block).await?,
        };

        self.emit(EventKind::LockdownStarted, mode).await;
        Ok(report)
    }

    /// Strict: replace the MAC filter table with Allow entries for the
    /// allowlist and flip the router into allowlist mode. Everything else,
    /// present or future, is blocked by the router itself.
    async fn start_strict(&self, to_block: &[Device]) -> Result<LockdownReport, CoreError> {
        let allowlisted = self.allowlist.load()?;

        let entries: Vec<MacFilterEntry> = allowlisted
            .iter()
            .map(|a| MacFilterEntry {
                id: None,
                macaddress: a.mac_address().to_string(),
                description: a.name.clone(),
                action: FilterAction::Allow,
                alwaysblock: "false".into(),
                starttime: String::new(),
                endtime: String::new(),
                blockdays: String::new(),
            })
            .collect();

        self.router.replace_mac_filter(entries, true, false).await?;

        let blocked: Vec<BlockedDevice> =
            to_block.iter().map(BlockedDevice::from_device).collect();
        self.save_state(&LockdownState {
            active: true,
            mode: Some(LockdownMode::Strict),
            blocked_devices: blocked.clone(),
            allowlisted_devices: allowlisted
                .iter()
                .map(|a| BlockedDevice {
                    name: a.name.clone(),
                    mac: a.mac.clone(),
                })
                .collect(),
            failed_devices: Vec::new(),
            started_at: Some(Utc::now()),
            stopped_at: None,
        })?;

        info!(allowed = allowlisted.len(), blocked = blocked.len(), "strict lockdown active");
        Ok(LockdownReport {
            message: format!(
                "STRICT lockdown active: only {} devices allowed, {} visible devices blocked (+ all unknown)",
                allowlisted.len(),
                blocked.len()
            ),
            devices: blocked,
            failed: Vec::new(),
        })
    }

    /// Soft: one Block write per visible non-allowlisted device. Already
    /// blocked devices count as success; failures are collected, persisted,
    /// and reported -- never silently swallowed.
    async fn start_soft(&self, to_block: &[Device]) -> Result<LockdownReport, CoreError> {
        if to_block.is_empty() {
            // Nothing visible to block: matches the original behavior of
            // not activating at all.
            return Ok(LockdownReport {
                message: "No devices to block (all are allowlisted)".into(),
                devices: Vec::new(),
                failed: Vec::new(),
            });
        }

        let mut blocked = Vec::new();
        let mut already = 0usize;
        let mut failed = Vec::new();

        for device in to_block {
            match self.router.block_device(&device.mac, &device.name).await {
                Ok(BlockOutcome::Blocked) => blocked.push(BlockedDevice::from_device(device)),
                Ok(BlockOutcome::AlreadyBlocked) => {
                    already += 1;
                    blocked.push(BlockedDevice::from_device(device));
                }
                Err(e) => {
                    warn!(mac = %device.mac, error = %e, "block write failed");
                    failed.push(FailedDevice {
                        name: device.name.clone(),
                        mac: device.mac.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.save_state(&LockdownState {
            active: true,
            mode: Some(LockdownMode::Soft),
            blocked_devices: blocked.clone(),
            allowlisted_devices: Vec::new(),
            failed_devices: failed.clone(),
            started_at: Some(Utc::now()),
            stopped_at: None,
        })?;

        let mut message = format!("SOFT lockdown active: blocked {} devices", blocked.len());
        if already > 0 {
            message.push_str(&format!(" ({already} were already blocked)"));
        }
        if !failed.is_empty() {
            message.push_str(&format!(", {} failed", failed.len()));
        }
        message.push_str("; new devices can still connect");

        info!(blocked = blocked.len(), failed = failed.len(), "soft lockdown active");
        Ok(LockdownReport {
            message,
            devices: blocked,
            failed,
        })
    }

    /// Stop the active lockdown. Fails with [`CoreError::LockdownNotActive`]
    /// when none is running.
    pub async fn stop(&self) -> Result<LockdownReport, CoreError> {
        let state = self.load_state();
        if !state.active {
            return Err(CoreError::LockdownNotActive);
        }

        let mode = state.mode.unwrap_or(LockdownMode::Soft);
        let report = match mode {
            LockdownMode::Strict => self.stop_strict(state).await?,
            LockdownMode::Soft => self.stop_soft(state).await?,
        };

        self.emit(EventKind::LockdownStopped, mode).await;
        Ok(report)
    }

    /// Strict stop: restore allow-all and clear the table.
    async fn stop_strict(&self, state: LockdownState) -> Result<LockdownReport, CoreError> {
        self.router.replace_mac_filter(Vec::new(), false, true).await?;

        self.save_state(&LockdownState {
            stopped_at: Some(Utc::now()),
            ..LockdownState::default()
        })?;

        info!("strict lockdown ended");
        Ok(LockdownReport {
            message: "Lockdown ended: all devices can now connect".into(),
            devices: state.blocked_devices,
            failed: Vec::new(),
        })
    }

    /// Soft stop: unblock every recorded device. "Not currently blocked"
    /// counts as success (the table may have drifted underneath us); the
    /// state goes inactive regardless of individual failures.
    async fn stop_soft(&self, state: LockdownState) -> Result<LockdownReport, CoreError> {
        let mut unblocked = Vec::new();
        let mut failed = Vec::new();

        for device in &state.blocked_devices {
            let mac = crate::model::MacAddress::new(&device.mac);
            match self.router.unblock_device(&mac).await {
                Ok(UnblockOutcome::Unblocked | UnblockOutcome::NotBlocked) => {
                    unblocked.push(device.clone());
                }
                Err(e) => {
                    warn!(mac = %device.mac, error = %e, "unblock write failed");
                    failed.push(FailedDevice {
                        name: device.name.clone(),
                        mac: device.mac.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.save_state(&LockdownState {
            stopped_at: Some(Utc::now()),
            ..LockdownState::default()
        })?;

        let mut message = format!("Lockdown ended: unblocked {} devices", unblocked.len());
        if !failed.is_empty() {
            message.push_str(&format!(" ({} failed)", failed.len()));
        }

        info!(unblocked = unblocked.len(), failed = failed.len(), "soft lockdown ended");
        Ok(LockdownReport {
            message,
            devices: unblocked,
            failed,
        })
    }

    async fn emit(&self, kind: EventKind, mode: LockdownMode) {
        let event = NotifyEvent {
            kind,
            name: mode.to_string(),
            address: String::new(),
        };
        if !self.sink.notify(&event).await {
            warn!(?kind, "lockdown notification delivery failed");
        }
    }
}
