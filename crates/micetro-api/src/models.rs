// Typed subset of the Micetro object schema.
//
// Only the fields the gateway helpers and the inventory engine interpret
// are modelled; everything else in a response is ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Record state the inventory cares about.
pub const STATE_ASSIGNED: &str = "Assigned";

// ── References ───────────────────────────────────────────────────────

/// A `{ "ref": ..., "name": ... }` pointer to another object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeRef {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub name: String,
}

/// Bare object reference (DHCP scopes, groups, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjRef {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub obj_type: Option<String>,
}

// ── Ranges ───────────────────────────────────────────────────────────

/// An IP range as returned by `GET Ranges`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    #[serde(rename = "ref")]
    pub reference: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub child_ranges: Vec<RangeRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dhcp_scopes: Vec<ObjRef>,
}

/// `result` member of `GET Ranges`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ranges: Vec<Range>,
    #[serde(default)]
    pub total_results: Option<usize>,
}

// ── IPAM records ─────────────────────────────────────────────────────

/// How to pick one hostname when an address has several DNS bindings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostnamePolicy {
    /// Take the first binding in server order; the rest are ignored.
    #[default]
    PickFirst,
}

/// Per-address assignment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpamRecord {
    #[serde(default)]
    pub addr_ref: Option<String>,
    pub address: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dns_hosts: Vec<DnsHost>,
    #[serde(default, deserialize_with = "string_properties")]
    pub custom_properties: IndexMap<String, String>,
}

impl IpamRecord {
    /// `true` unless the suite reported a state other than "Assigned".
    pub fn is_assigned(&self) -> bool {
        self.state.as_deref().is_none_or(|s| s == STATE_ASSIGNED)
    }

    /// The hostname this address is known by, if any DNS binding exists.
    pub fn primary_hostname(&self, policy: HostnamePolicy) -> Option<&str> {
        match policy {
            HostnamePolicy::PickFirst => self
                .dns_hosts
                .first()
                .map(|host| host.dns_record.name.as_str())
                .filter(|name| !name.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsHost {
    pub dns_record: DnsRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

/// `result` member of `GET command/GetIPAMRecords`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpamRecordPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ipam_records: Vec<IpamRecord>,
    #[serde(default)]
    pub total_results: Option<usize>,
}

/// `result` member of `GET IPAMRecords/<address>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SingleIpamRecord {
    pub ipam_record: IpamRecord,
}

/// `result` member of `GET <range>/NextFreeAddress`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FreeAddress {
    #[serde(default)]
    pub address: Option<String>,
}

// ── Serde helpers ────────────────────────────────────────────────────

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Custom property values arrive as strings, numbers, or booleans;
/// normalize to strings and drop nulls.
fn string_properties<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}
