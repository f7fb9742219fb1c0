// Host table endpoint
//
// `GET /api/v1/host` returns every device the gateway has ever seen under
// `data.hostTbl`. Booleans arrive as the strings "true"/"false"; every
// field defaults to empty because firmware revisions disagree on which
// fields exist.

use serde::Deserialize;

use crate::client::GatewayClient;
use crate::error::Error;

const HOST_PATH: &str = "api/v1/host";

/// One raw row of the gateway's host table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostEntry {
    #[serde(default)]
    pub physaddress: String,
    #[serde(default)]
    pub ipaddress: String,
    #[serde(default)]
    pub hostname: String,
    /// "true" when the device is currently connected.
    #[serde(default)]
    pub active: String,
    /// Interface name, e.g. "WIFI.SSID.1" or "ETHERNET.2".
    #[serde(default, rename = "layer1interface")]
    pub layer1_interface: String,
}

impl HostEntry {
    pub fn is_active(&self) -> bool {
        self.active == "true"
    }
}

#[derive(Deserialize)]
struct HostData {
    #[serde(default, rename = "hostTbl")]
    host_tbl: Vec<HostEntry>,
}

impl GatewayClient {
    /// Fetch the raw host table.
    ///
    /// Rows without a hardware address are dropped -- the gateway pads the
    /// table with empty placeholder rows.
    pub async fn fetch_hosts(&self) -> Result<Vec<HostEntry>, Error> {
        let data: HostData = self.get_data(HOST_PATH).await?;
        Ok(data
            .host_tbl
            .into_iter()
            .filter(|h| !h.physaddress.trim().is_empty())
            .collect())
    }
}
