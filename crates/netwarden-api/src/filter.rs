// MAC and site filter tables
//
// Both tables accept the same two write encodings:
//
//  - bulk: the whole table as a JSON array in a single form field, used
//    for wholesale replacement (allowlist-mode switches, removals);
//  - indexed: one entry spread across `tbl[idx][field]=value` form fields,
//    used for single additions (cheaper, leaves concurrent entries alone).
//
// The gateway assigns each row a numeric `__id`; new rows must use one past
// the maximum existing id and never reuse a live index.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

use crate::client::GatewayClient;
use crate::error::Error;

const MACFILTER_PATH: &str = "api/v1/macfilter";
const SITEFILTER_PATH: &str = "api/v1/sitefilter";

// ── Wire entries ────────────────────────────────────────────────────

/// Filter rule action. The wire values are capitalized words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterAction {
    Allow,
    #[default]
    Block,
}

impl FilterAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Block => "Block",
        }
    }
}

/// One row of `macfilterTbl`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacFilterEntry {
    /// Router-assigned table index. Arrives as a number or a string
    /// depending on firmware; normalized to a string here.
    #[serde(
        rename = "__id",
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub macaddress: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub action: FilterAction,
    #[serde(default)]
    pub alwaysblock: String,
    #[serde(default)]
    pub starttime: String,
    #[serde(default)]
    pub endtime: String,
    #[serde(default)]
    pub blockdays: String,
}

impl MacFilterEntry {
    /// Numeric table index, when present and parseable.
    pub fn index(&self) -> Option<u32> {
        self.id.as_deref().and_then(|s| s.parse().ok())
    }
}

/// One row of `sitefilterTbl` (or `sitetrustedTbl`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteFilterEntry {
    #[serde(
        rename = "__id",
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub blockmethod: String,
    #[serde(default)]
    pub alwaysblock: String,
}

impl SiteFilterEntry {
    pub fn index(&self) -> Option<u32> {
        self.id.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Both site tables as the gateway returns them.
#[derive(Debug, Clone, Default)]
pub struct SiteFilterTables {
    pub sites: Vec<SiteFilterEntry>,
    pub trusted: Vec<SiteFilterEntry>,
}

/// `__id` arrives as `3`, `"3"`, or not at all.
fn lenient_id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }
    Ok(Option::<Raw>::deserialize(de)?.map(|raw| match raw {
        Raw::Num(n) => n.to_string(),
        Raw::Str(s) => s,
    }))
}

/// Compute the next free table index: one past the maximum existing id.
pub fn next_free_index(indices: impl Iterator<Item = u32>) -> u32 {
    indices.max().map_or(0, |max| max + 1)
}

// ── Write encodings ─────────────────────────────────────────────────

/// An entry type that knows how to spread itself across indexed form fields.
pub trait FormEntry: Serialize {
    fn form_fields(&self) -> Vec<(&'static str, String)>;
}

impl FormEntry for MacFilterEntry {
    fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("macaddress", self.macaddress.clone()),
            ("description", self.description.clone()),
            ("type", self.action.as_str().to_owned()),
            ("alwaysblock", self.alwaysblock.clone()),
            ("starttime", self.starttime.clone()),
            ("endtime", self.endtime.clone()),
            ("blockdays", self.blockdays.clone()),
        ]
    }
}

impl FormEntry for SiteFilterEntry {
    fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("site", self.site.clone()),
            ("blockmethod", self.blockmethod.clone()),
            ("alwaysblock", self.alwaysblock.clone()),
        ]
    }
}

/// A full filter-table write in either encoding.
///
/// Call sites pick the encoding: `Bulk` for wholesale replacement, `Indexed`
/// for a single addition at a freshly computed index. Both are equivalent to
/// the gateway.
#[derive(Debug, Clone)]
pub enum TableWrite<E> {
    Bulk {
        entries: Vec<E>,
        enable: bool,
        /// `false` flips the router into allowlist mode: everything not in
        /// the table is blocked. `None` omits the field (site table).
        allow_all: Option<bool>,
    },
    Indexed {
        index: u32,
        entry: E,
        enable: bool,
        allow_all: Option<bool>,
    },
}

impl<E: FormEntry> TableWrite<E> {
    /// Serialize into form fields for the given table name.
    pub(crate) fn to_form(&self, table: &str) -> Result<Vec<(String, String)>, Error> {
        let mut form: Vec<(String, String)> = Vec::new();
        match self {
            Self::Bulk {
                entries,
                enable,
                allow_all,
            } => {
                form.push(("enable".into(), bool_str(*enable)));
                if let Some(allow) = allow_all {
                    form.push(("allowall".into(), bool_str(*allow)));
                }
                let json = serde_json::to_string(entries).map_err(|e| Error::Protocol {
                    message: format!("failed to encode {table}: {e}"),
                    body: String::new(),
                })?;
                form.push((table.into(), json));
            }
            Self::Indexed {
                index,
                entry,
                enable,
                allow_all,
            } => {
                form.push(("enable".into(), bool_str(*enable)));
                if let Some(allow) = allow_all {
                    form.push(("allowall".into(), bool_str(*allow)));
                }
                for (field, value) in entry.form_fields() {
                    form.push((format!("{table}[{index}][{field}]"), value));
                }
            }
        }
        Ok(form)
    }
}

fn bool_str(v: bool) -> String {
    if v { "true".into() } else { "false".into() }
}

// ── Endpoints ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct MacFilterData {
    #[serde(default, rename = "macfilterTbl")]
    macfilter_tbl: Vec<MacFilterEntry>,
}

#[derive(Deserialize)]
struct SiteFilterData {
    #[serde(default, rename = "sitefilterTbl")]
    sitefilter_tbl: Vec<SiteFilterEntry>,
    #[serde(default, rename = "sitetrustedTbl")]
    sitetrusted_tbl: Vec<SiteFilterEntry>,
}

impl GatewayClient {
    /// Fetch the MAC filter table, dropping the empty padding rows the
    /// gateway keeps around.
    pub async fn mac_filter(&self) -> Result<Vec<MacFilterEntry>, Error> {
        let data: MacFilterData = self.get_data(MACFILTER_PATH).await?;
        Ok(data
            .macfilter_tbl
            .into_iter()
            .filter(|e| !e.macaddress.trim().is_empty())
            .collect())
    }

    /// Write the MAC filter table in the encoding chosen by the caller.
    pub async fn write_mac_filter(&self, write: &TableWrite<MacFilterEntry>) -> Result<(), Error> {
        let form = write.to_form("macfilterTbl")?;
        self.post_form(MACFILTER_PATH, &form).await
    }

    /// Fetch both site tables (block list and trusted list).
    pub async fn site_filter(&self) -> Result<SiteFilterTables, Error> {
        let data: SiteFilterData = self.get_data(SITEFILTER_PATH).await?;
        Ok(SiteFilterTables {
            sites: data
                .sitefilter_tbl
                .into_iter()
                .filter(|e| !e.site.trim().is_empty())
                .collect(),
            trusted: data.sitetrusted_tbl,
        })
    }

    /// Write the site filter table.
    ///
    /// Bulk replacements must echo the trusted table back or the gateway
    /// clears it; indexed additions leave it alone.
    pub async fn write_site_filter(
        &self,
        write: &TableWrite<SiteFilterEntry>,
        trusted: &[SiteFilterEntry],
    ) -> Result<(), Error> {
        let mut form = write.to_form("sitefilterTbl")?;
        if matches!(write, TableWrite::Bulk { .. }) {
            let json = serde_json::to_string(trusted).map_err(|e| Error::Protocol {
                message: format!("failed to encode sitetrustedTbl: {e}"),
                body: String::new(),
            })?;
            form.push(("sitetrustedTbl".into(), json));
        }
        self.post_form(SITEFILTER_PATH, &form).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn block_entry(mac: &str, idx: Option<&str>) -> MacFilterEntry {
        MacFilterEntry {
            id: idx.map(str::to_owned),
            macaddress: mac.into(),
            description: "test".into(),
            action: FilterAction::Block,
            alwaysblock: "true".into(),
            ..MacFilterEntry::default()
        }
    }

    #[test]
    fn next_index_is_one_past_max() {
        let entries = vec![
            block_entry("AA:AA:AA:AA:AA:01", Some("0")),
            block_entry("AA:AA:AA:AA:AA:02", Some("4")),
            block_entry("AA:AA:AA:AA:AA:03", None),
        ];
        let next = next_free_index(entries.iter().filter_map(MacFilterEntry::index));
        assert_eq!(next, 5);
    }

    #[test]
    fn next_index_starts_at_zero_for_empty_table() {
        assert_eq!(next_free_index(std::iter::empty()), 0);
    }

    #[test]
    fn indexed_form_spreads_fields() {
        let write = TableWrite::Indexed {
            index: 3,
            entry: block_entry("AA:BB:CC:DD:EE:FF", None),
            enable: true,
            allow_all: Some(true),
        };
        let form = write.to_form("macfilterTbl").unwrap();
        assert!(form.contains(&("enable".into(), "true".into())));
        assert!(form.contains(&("allowall".into(), "true".into())));
        assert!(form.contains(&("macfilterTbl[3][macaddress]".into(), "AA:BB:CC:DD:EE:FF".into())));
        assert!(form.contains(&("macfilterTbl[3][type]".into(), "Block".into())));
    }

    #[test]
    fn bulk_form_carries_json_array() {
        let write = TableWrite::Bulk {
            entries: vec![block_entry("AA:BB:CC:DD:EE:FF", None)],
            enable: true,
            allow_all: Some(false),
        };
        let form = write.to_form("macfilterTbl").unwrap();
        let table = form
            .iter()
            .find(|(k, _)| k == "macfilterTbl")
            .map(|(_, v)| v.as_str())
            .unwrap();
        assert!(table.starts_with('['));
        assert!(table.contains("\"macaddress\":\"AA:BB:CC:DD:EE:FF\""));
        assert!(form.contains(&("allowall".into(), "false".into())));
    }

    #[test]
    fn bulk_form_empty_table_is_json_empty_array() {
        let write: TableWrite<MacFilterEntry> = TableWrite::Bulk {
            entries: Vec::new(),
            enable: false,
            allow_all: Some(true),
        };
        let form = write.to_form("macfilterTbl").unwrap();
        assert!(form.contains(&("macfilterTbl".into(), "[]".into())));
    }

    #[test]
    fn lenient_id_accepts_number_and_string() {
        let from_num: MacFilterEntry =
            serde_json::from_str(r#"{"__id": 7, "macaddress": "AA:AA:AA:AA:AA:AA"}"#).unwrap();
        let from_str: MacFilterEntry =
            serde_json::from_str(r#"{"__id": "7", "macaddress": "AA:AA:AA:AA:AA:AA"}"#).unwrap();
        assert_eq!(from_num.index(), Some(7));
        assert_eq!(from_str.index(), Some(7));
    }
}
