// ── Hardware address ──
//
// MacAddress is the identity key for everything in the system: host-table
// rows, allowlist entries, filter rules, and presence state all join on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MAC address, normalized to uppercase colon-separated form
/// (`AA:BB:CC:DD:EE:FF`) -- the canonical shape the gateway uses in its
/// filter tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Create a normalized MAC address from any common format.
    /// Accepts colon-separated, dash-separated, or bare hex.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let upper = raw.as_ref().trim().to_uppercase().replace('-', ":");
        if upper.len() == 12 && !upper.contains(':') && upper.chars().all(|c| c.is_ascii_hexdigit())
        {
            let mut out = String::with_capacity(17);
            for (i, c) in upper.chars().enumerate() {
                if i > 0 && i % 2 == 0 {
                    out.push(':');
                }
                out.push(c);
            }
            return Self(out);
        }
        Self(upper)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex digits only, separators stripped. The gateway reports some
    /// hostnames as the bare MAC, so this is what name-fallback compares
    /// against.
    pub fn bare(&self) -> String {
        self.0.replace(':', "")
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case() {
        let mac = MacAddress::new("aa:bb:cc:dd:ee:ff");
        assert_eq!(mac.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn normalizes_dashes() {
        let mac = MacAddress::new("aa-bb-cc-dd-ee-ff");
        assert_eq!(mac.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn inserts_separators_into_bare_hex() {
        let mac = MacAddress::new("aabbccddeeff");
        assert_eq!(mac.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn bare_strips_separators() {
        let mac = MacAddress::new("AA:BB:CC:DD:EE:FF");
        assert_eq!(mac.bare(), "AABBCCDDEEFF");
    }

    #[test]
    fn equal_after_normalization() {
        assert_eq!(MacAddress::new("aa:bb:cc:dd:ee:ff"), MacAddress::new("AA-BB-CC-DD-EE-FF"));
    }

    #[test]
    fn from_str_normalizes() {
        let mac: MacAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        assert_eq!(mac.to_string(), "AA:BB:CC:DD:EE:FF");
    }
}
