/// Storage records for chrome.storage.local

use crate::tab_data::TabId;
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const EXCLUDED_DOMAINS: &str = "excludedDomains";
pub const INCLUDED_DOMAINS: &str = "includedDomains";
pub const MUTE_SPECIFIC_ONLY: &str = "muteSpecificOnly";
pub const STICKY_MODE: &str = "stickyMode";
pub const EXCLUDED_TABS_ARRAY: &str = "excludedTabsArray";
pub const INCLUDED_TABS_ARRAY: &str = "includedTabsArray";

/// Every key the background process reads on startup
pub const ALL_KEYS: [&str; 6] = [
    EXCLUDED_DOMAINS,
    INCLUDED_DOMAINS,
    MUTE_SPECIFIC_ONLY,
    STICKY_MODE,
    EXCLUDED_TABS_ARRAY,
    INCLUDED_TABS_ARRAY,
];

/// Full persisted record.
///
/// Missing, null and wrong-typed keys fall back to empty/false one key at a
/// time, so a single bad value never makes the record unreadable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredState {
    #[serde(deserialize_with = "lenient")]
    pub excluded_domains: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub included_domains: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub mute_specific_only: bool,
    #[serde(deserialize_with = "lenient")]
    pub sticky_mode: bool,
    #[serde(deserialize_with = "lenient")]
    pub excluded_tabs_array: Vec<TabId>,
    #[serde(deserialize_with = "lenient")]
    pub included_tabs_array: Vec<TabId>,
}

/// Serialized override sets, written after every override mutation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredOverrides {
    pub excluded_tabs_array: Vec<TabId>,
    pub included_tabs_array: Vec<TabId>,
}

/// Rules and mode flags, written by the options page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    #[serde(deserialize_with = "lenient")]
    pub excluded_domains: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub included_domains: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub mute_specific_only: bool,
    #[serde(deserialize_with = "lenient")]
    pub sticky_mode: bool,
}

/// Null decodes to the default; a wrong-typed value is logged and decodes to the default
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("ignoring malformed stored value: {}", e);
        T::default()
    }))
}

/// Before/after values of one key in a storage change notification
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageChange {
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

#[cfg(test)]
impl StorageChange {
    pub fn set(value: Value) -> Self {
        StorageChange {
            old_value: None,
            new_value: Some(value),
        }
    }

    pub fn removed() -> Self {
        StorageChange::default()
    }
}

pub type StorageChanges = HashMap<String, StorageChange>;
