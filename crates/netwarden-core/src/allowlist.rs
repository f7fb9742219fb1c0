// ── Allowlist store ──
//
// Persisted set of never-block device identities. The file always contains
// the controller host's own MAC (blocking ourselves would cut the only
// management path) and the configured infrastructure devices. Every
// mutation reloads from disk first and saves synchronously after, so two
// process generations sharing the file never act on stale reads.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::MacAddress;

/// One allowlisted device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowlistEntry {
    pub name: String,
    pub mac: String,
    pub reason: String,
}

impl AllowlistEntry {
    pub fn mac_address(&self) -> MacAddress {
        MacAddress::new(&self.mac)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AllowlistFile {
    #[serde(default)]
    devices: Vec<AllowlistEntry>,
}

/// Persisted allowlist with a reload-on-mutation cache.
pub struct AllowlistStore {
    path: PathBuf,
    /// Infrastructure devices seeded into a fresh store (access points and
    /// the like), from configuration.
    infrastructure: Vec<AllowlistEntry>,
    cache: RwLock<Option<Vec<AllowlistEntry>>>,
}

impl AllowlistStore {
    pub fn new(path: impl Into<PathBuf>, infrastructure: Vec<AllowlistEntry>) -> Self {
        Self {
            path: path.into(),
            infrastructure,
            cache: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted set, creating and persisting the default set on
    /// first use (or when the file is unreadable).
    pub fn load(&self) -> Result<Vec<AllowlistEntry>, CoreError> {
        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            return Ok(cached.clone());
        }

        let entries = match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<AllowlistFile>(&raw) {
                Ok(file) => file.devices,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "allowlist unreadable, recreating defaults");
                    let defaults = self.default_entries();
                    self.save(&defaults)?;
                    defaults
                }
            },
            Err(_) => {
                debug!(path = %self.path.display(), "no allowlist yet, creating defaults");
                let defaults = self.default_entries();
                self.save(&defaults)?;
                defaults
            }
        };

        *self.cache.write().unwrap_or_else(|e| e.into_inner()) = Some(entries.clone());
        Ok(entries)
    }

    /// Allowlisted hardware addresses, normalized.
    pub fn macs(&self) -> Result<Vec<MacAddress>, CoreError> {
        Ok(self.load()?.iter().map(AllowlistEntry::mac_address).collect())
    }

    pub fn is_allowed(&self, mac: &MacAddress) -> Result<bool, CoreError> {
        Ok(self.macs()?.contains(mac))
    }

    /// Add a device. Returns `false` (and writes nothing) when the address
    /// is already present.
    pub fn add(&self, name: &str, mac: &MacAddress, reason: &str) -> Result<bool, CoreError> {
        self.invalidate();
        let mut entries = self.load()?;

        if entries.iter().any(|e| e.mac_address() == *mac) {
            return Ok(false);
        }

        entries.push(AllowlistEntry {
            name: name.to_owned(),
            mac: mac.to_string(),
            reason: reason.to_owned(),
        });
        self.save(&entries)?;
        *self.cache.write().unwrap_or_else(|e| e.into_inner()) = Some(entries);
        Ok(true)
    }

    /// Remove a device by address. Returns `false` when it wasn't present.
    pub fn remove(&self, mac: &MacAddress) -> Result<bool, CoreError> {
        self.invalidate();
        let mut entries = self.load()?;

        let before = entries.len();
        entries.retain(|e| e.mac_address() != *mac);
        if entries.len() == before {
            return Ok(false);
        }

        self.save(&entries)?;
        *self.cache.write().unwrap_or_else(|e| e.into_inner()) = Some(entries);
        Ok(true)
    }

    fn invalidate(&self) {
        *self.cache.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn save(&self, entries: &[AllowlistEntry]) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = AllowlistFile {
            devices: entries.to_vec(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    fn default_entries(&self) -> Vec<AllowlistEntry> {
        let mut entries = Vec::new();
        if let Some(own) = detect_own_mac() {
            entries.push(AllowlistEntry {
                name: "This host".into(),
                mac: own.to_string(),
                reason: "Control device - never block".into(),
            });
        }
        entries.extend(self.infrastructure.iter().cloned());
        entries
    }
}

/// Auto-detect this host's MAC: the address of the first non-loopback
/// interface in state "up", read from sysfs. Returns `None` off Linux or
/// when nothing is up.
pub fn detect_own_mac() -> Option<MacAddress> {
    let entries = fs::read_dir("/sys/class/net").ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy() == "lo" {
            continue;
        }
        let operstate = fs::read_to_string(entry.path().join("operstate")).unwrap_or_default();
        if operstate.trim() != "up" {
            continue;
        }
        let address = fs::read_to_string(entry.path().join("address")).unwrap_or_default();
        let address = address.trim();
        if !address.is_empty() && address != "00:00:00:00:00:00" {
            return Some(MacAddress::new(address));
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn infra() -> Vec<AllowlistEntry> {
        vec![AllowlistEntry {
            name: "AP1".into(),
            mac: "60:83:E7:B5:66:22".into(),
            reason: "WiFi AP".into(),
        }]
    }

    fn store_in(dir: &TempDir) -> AllowlistStore {
        AllowlistStore::new(dir.path().join("allowlist.json"), infra())
    }

    #[test]
    fn first_load_creates_defaults_with_infrastructure() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let entries = store.load().unwrap();
        assert!(entries.iter().any(|e| e.mac == "60:83:E7:B5:66:22"));
        assert!(dir.path().join("allowlist.json").exists());
    }

    #[test]
    fn add_persists_and_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mac = MacAddress::new("aa:bb:cc:dd:ee:ff");

        assert!(store.add("phone", &mac, "user added").unwrap());
        assert!(!store.add("phone again", &mac, "duplicate").unwrap());
        assert!(store.is_allowed(&mac).unwrap());

        // A second store over the same file sees the mutation.
        let other = store_in(&dir);
        assert!(other.is_allowed(&mac).unwrap());
    }

    #[test]
    fn remove_is_noop_when_absent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mac = MacAddress::new("aa:bb:cc:dd:ee:ff");

        assert!(!store.remove(&mac).unwrap());
        store.add("phone", &mac, "x").unwrap();
        assert!(store.remove(&mac).unwrap());
        assert!(!store.is_allowed(&mac).unwrap());
    }

    #[test]
    fn corrupt_file_is_recreated_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("allowlist.json");
        fs::write(&path, "not json {").unwrap();

        let store = AllowlistStore::new(&path, infra());
        let entries = store.load().unwrap();
        assert!(entries.iter().any(|e| e.mac == "60:83:E7:B5:66:22"));
    }

    #[test]
    fn lookup_normalizes_mac_format() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        // Stored uppercase-colon, queried lowercase-dashed.
        assert!(store.is_allowed(&MacAddress::new("60-83-e7-b5-66-22")).unwrap());
    }
}
