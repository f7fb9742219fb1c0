// ── Device domain type ──
//
// One row of presence knowledge. Created on first sighting in a gateway
// snapshot, mutated on every later one, never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use netwarden_api::HostEntry;

use super::mac::MacAddress;

/// How a device is attached to the network, derived from the gateway's
/// `layer1interface` naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum ConnectionMedium {
    #[strum(serialize = "Ethernet")]
    Wired,
    #[strum(serialize = "WiFi 2.4G")]
    Wifi2g,
    #[strum(serialize = "WiFi 5G")]
    Wifi5g,
    #[strum(serialize = "WiFi")]
    Wifi,
    #[strum(serialize = "Unknown")]
    Unknown,
}

impl ConnectionMedium {
    /// Map an interface name to a medium. The gateway encodes the band in
    /// the SSID index: `WIFI.SSID.1` is the 2.4 GHz network, `WIFI.SSID.2`
    /// the 5 GHz one.
    pub fn from_interface(interface: &str) -> Self {
        let iface = interface.to_lowercase();
        if iface.contains("wifi") {
            if iface.contains("ssid.1") {
                Self::Wifi2g
            } else if iface.contains("ssid.2") {
                Self::Wifi5g
            } else {
                Self::Wifi
            }
        } else if iface.contains("ethernet") {
            Self::Wired
        } else {
            Self::Unknown
        }
    }
}

/// The canonical device type, keyed by hardware address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub mac: MacAddress,
    /// Display name: the reported hostname, or the MAC when the gateway
    /// has no better idea.
    pub name: String,
    /// Last-known IP address; empty when the gateway doesn't report one.
    pub ip: String,
    pub medium: ConnectionMedium,
    pub online: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

impl Device {
    /// Build a Device from a raw host-table row.
    ///
    /// The gateway reports unnamed devices with a hostname equal to the
    /// bare MAC; those fall back to the canonical MAC form as the name.
    pub fn from_host(entry: &HostEntry) -> Self {
        let mac = MacAddress::new(&entry.physaddress);
        let hostname = entry.hostname.trim();
        let name = if hostname.is_empty() || hostname.to_uppercase() == mac.bare() {
            mac.to_string()
        } else {
            hostname.to_owned()
        };

        Self {
            mac,
            name,
            ip: entry.ipaddress.clone(),
            medium: ConnectionMedium::from_interface(&entry.layer1_interface),
            online: entry.is_active(),
            last_seen: None,
        }
    }

    /// True when the name is still just the MAC, i.e. the hostname never
    /// resolved.
    pub fn name_is_mac(&self) -> bool {
        self.name == self.mac.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(mac: &str, hostname: &str, iface: &str, active: &str) -> HostEntry {
        HostEntry {
            physaddress: mac.into(),
            ipaddress: "192.168.0.50".into(),
            hostname: hostname.into(),
            active: active.into(),
            layer1_interface: iface.into(),
        }
    }

    #[test]
    fn medium_from_interface_names() {
        assert_eq!(ConnectionMedium::from_interface("WIFI.SSID.1"), ConnectionMedium::Wifi2g);
        assert_eq!(ConnectionMedium::from_interface("WIFI.SSID.2"), ConnectionMedium::Wifi5g);
        assert_eq!(ConnectionMedium::from_interface("WIFI.SSID.9"), ConnectionMedium::Wifi);
        assert_eq!(ConnectionMedium::from_interface("ETHERNET.3"), ConnectionMedium::Wired);
        assert_eq!(ConnectionMedium::from_interface("MOCA.1"), ConnectionMedium::Unknown);
    }

    #[test]
    fn hostname_becomes_name() {
        let dev = Device::from_host(&host("aa:bb:cc:dd:ee:ff", "my-phone", "WIFI.SSID.1", "true"));
        assert_eq!(dev.name, "my-phone");
        assert_eq!(dev.mac.as_str(), "AA:BB:CC:DD:EE:FF");
        assert!(dev.online);
    }

    #[test]
    fn empty_hostname_falls_back_to_mac() {
        let dev = Device::from_host(&host("aa:bb:cc:dd:ee:ff", "", "ETHERNET.1", "false"));
        assert_eq!(dev.name, "AA:BB:CC:DD:EE:FF");
        assert!(dev.name_is_mac());
        assert!(!dev.online);
    }

    #[test]
    fn bare_mac_hostname_falls_back_to_mac() {
        let dev = Device::from_host(&host("aa:bb:cc:dd:ee:ff", "aabbccddeeff", "ETHERNET.1", "true"));
        assert_eq!(dev.name, "AA:BB:CC:DD:EE:FF");
        assert!(dev.name_is_mac());
    }
}
