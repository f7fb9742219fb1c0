// ── Router session ──
//
// The gateway refuses more than one authenticated session system-wide, so
// exactly one RouterSession exists per process, shared (via Arc) by the
// presence poller and the command path. Every mutating write re-validates
// the session immediately before use; a competing login elsewhere
// invalidates ours without any notification.

use async_trait::async_trait;
use tracing::{debug, warn};

use netwarden_api::{
    FilterAction, GatewayClient, GatewayConfig, MacFilterEntry, SiteFilterEntry, TableWrite,
    next_free_index,
};

use crate::error::CoreError;
use crate::model::{Device, MacAddress};

/// Result of a single block write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Blocked,
    /// The address was already present as a Block entry. Reported, not an
    /// error.
    AlreadyBlocked,
}

/// Result of a single unblock write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnblockOutcome {
    Unblocked,
    /// The address was not in the filter table. Counts as success so that
    /// unblocking is idempotent against drift between persisted state and
    /// the real table.
    NotBlocked,
}

/// The seam the lockdown controller and the monitor are written against.
/// Production uses [`RouterSession`]; tests substitute an in-memory fake.
#[async_trait]
pub trait RouterControl: Send + Sync {
    /// Current device snapshot. NEVER fails: transport or parse trouble
    /// logs a warning and yields an empty snapshot, which callers treat the
    /// same as an empty network.
    async fn devices(&self) -> Vec<Device>;

    /// Current MAC filter table (non-empty rows only).
    async fn blocked_entries(&self) -> Result<Vec<MacFilterEntry>, CoreError>;

    /// Add a single Block entry for `mac` using the indexed encoding.
    async fn block_device(&self, mac: &MacAddress, name: &str) -> Result<BlockOutcome, CoreError>;

    /// Remove any entry for `mac` by rewriting the table without it.
    async fn unblock_device(&self, mac: &MacAddress) -> Result<UnblockOutcome, CoreError>;

    /// Replace the whole MAC filter table in one bulk write.
    async fn replace_mac_filter(
        &self,
        entries: Vec<MacFilterEntry>,
        enable: bool,
        allow_all: bool,
    ) -> Result<(), CoreError>;
}

/// Owns the single gateway session and layers domain semantics over the raw
/// client: device mapping, duplicate detection, index allocation, and the
/// verify-before-every-write discipline.
pub struct RouterSession {
    client: GatewayClient,
}

impl RouterSession {
    pub fn new(config: GatewayConfig) -> Result<Self, CoreError> {
        Ok(Self {
            client: GatewayClient::new(config)?,
        })
    }

    /// Access the raw client (the CLI uses this for login diagnostics).
    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    pub async fn logout(&self) {
        self.client.logout().await;
    }

    /// Resolve a device by name substring or MAC. Matching mirrors the
    /// gateway UI: case-insensitive containment in either direction.
    pub async fn find_device(&self, query: &str) -> Option<Device> {
        let snapshot = self.devices().await;
        let needle = query.to_lowercase();
        let as_mac = MacAddress::new(query);

        snapshot.into_iter().find(|d| {
            d.mac == as_mac || {
                let name = d.name.to_lowercase();
                name.contains(&needle) || needle.contains(&name)
            }
        })
    }

    // ── Site filter ──────────────────────────────────────────────────

    /// Currently blocked sites.
    pub async fn blocked_sites(&self) -> Result<Vec<SiteFilterEntry>, CoreError> {
        self.client.ensure_logged_in().await?;
        Ok(self.client.site_filter().await?.sites)
    }

    /// Block a site by hostname. Already-blocked sites are reported, not
    /// re-added.
    pub async fn block_site(&self, site: &str) -> Result<BlockOutcome, CoreError> {
        self.client.ensure_logged_in().await?;
        let site = site.trim().to_lowercase();

        let tables = self.client.site_filter().await?;
        if tables.sites.iter().any(|s| s.site.to_lowercase() == site) {
            return Ok(BlockOutcome::AlreadyBlocked);
        }

        let index = next_free_index(tables.sites.iter().filter_map(SiteFilterEntry::index));
        let write = TableWrite::Indexed {
            index,
            entry: SiteFilterEntry {
                id: None,
                site,
                blockmethod: "URL".into(),
                alwaysblock: "true".into(),
            },
            enable: true,
            allow_all: None,
        };
        self.client.write_site_filter(&write, &[]).await?;
        Ok(BlockOutcome::Blocked)
    }

    /// Unblock a site by rewriting the table without it. Absent sites count
    /// as already unblocked.
    pub async fn unblock_site(&self, site: &str) -> Result<UnblockOutcome, CoreError> {
        self.client.ensure_logged_in().await?;
        let site = site.trim().to_lowercase();

        let tables = self.client.site_filter().await?;
        if !tables.sites.iter().any(|s| s.site.to_lowercase() == site) {
            return Ok(UnblockOutcome::NotBlocked);
        }

        let keep: Vec<SiteFilterEntry> = tables
            .sites
            .into_iter()
            .filter(|s| s.site.to_lowercase() != site)
            .collect();
        let write = TableWrite::Bulk {
            enable: !keep.is_empty(),
            entries: keep,
            allow_all: None,
        };
        self.client.write_site_filter(&write, &tables.trusted).await?;
        Ok(UnblockOutcome::Unblocked)
    }
}

#[async_trait]
impl RouterControl for RouterSession {
    async fn devices(&self) -> Vec<Device> {
        if let Err(e) = self.client.ensure_logged_in().await {
            warn!(error = %e, "gateway login failed, returning empty snapshot");
            return Vec::new();
        }

        match self.client.fetch_hosts().await {
            Ok(hosts) if hosts.is_empty() => {
                // A live home network never has zero hosts; an empty table
                // almost always means the session went stale underneath us.
                warn!("gateway returned zero hosts, forcing re-login next cycle");
                self.client.invalidate_session();
                Vec::new()
            }
            Ok(hosts) => hosts.iter().map(Device::from_host).collect(),
            Err(e) => {
                warn!(error = %e, "host table fetch failed");
                if e.is_auth_expired() {
                    self.client.invalidate_session();
                }
                Vec::new()
            }
        }
    }

    async fn blocked_entries(&self) -> Result<Vec<MacFilterEntry>, CoreError> {
        self.client.ensure_logged_in().await?;
        Ok(self.client.mac_filter().await?)
    }

    async fn block_device(&self, mac: &MacAddress, name: &str) -> Result<BlockOutcome, CoreError> {
        self.client.ensure_logged_in().await?;

        let entries = self.client.mac_filter().await?;
        if entries
            .iter()
            .any(|e| MacAddress::new(&e.macaddress) == *mac)
        {
            debug!(%mac, "already present as filter entry");
            return Ok(BlockOutcome::AlreadyBlocked);
        }

        let index = next_free_index(entries.iter().filter_map(MacFilterEntry::index));
        let write = TableWrite::Indexed {
            index,
            entry: MacFilterEntry {
                id: None,
                macaddress: mac.to_string(),
                description: if name.is_empty() { "Blocked".into() } else { name.to_owned() },
                action: FilterAction::Block,
                alwaysblock: "true".into(),
                starttime: String::new(),
                endtime: String::new(),
                blockdays: String::new(),
            },
            enable: true,
            allow_all: Some(true),
        };
        self.client.write_mac_filter(&write).await?;
        Ok(BlockOutcome::Blocked)
    }

    async fn unblock_device(&self, mac: &MacAddress) -> Result<UnblockOutcome, CoreError> {
        self.client.ensure_logged_in().await?;

        let entries = self.client.mac_filter().await?;
        let had_mac = entries
            .iter()
            .any(|e| MacAddress::new(&e.macaddress) == *mac);
        if !had_mac {
            return Ok(UnblockOutcome::NotBlocked);
        }

        let keep: Vec<MacFilterEntry> = entries
            .into_iter()
            .filter(|e| MacAddress::new(&e.macaddress) != *mac)
            .collect();
        let write = TableWrite::Bulk {
            enable: !keep.is_empty(),
            entries: keep,
            allow_all: Some(true),
        };
        self.client.write_mac_filter(&write).await?;
        Ok(UnblockOutcome::Unblocked)
    }

    async fn replace_mac_filter(
        &self,
        entries: Vec<MacFilterEntry>,
        enable: bool,
        allow_all: bool,
    ) -> Result<(), CoreError> {
        self.client.ensure_logged_in().await?;

        let write = TableWrite::Bulk {
            entries,
            enable,
            allow_all: Some(allow_all),
        };
        self.client.write_mac_filter(&write).await?;
        Ok(())
    }
}
