/// Data structures for Tab Muter
use serde::{Deserialize, Serialize};

pub type TabId = i32;
pub type WindowId = i32;

/// Snapshot of a browser tab as reported by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    #[serde(default)]
    pub id: Option<TabId>,
    pub window_id: WindowId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub active: bool,
}

impl TabInfo {
    #[cfg(test)]
    pub fn new(id: TabId, window_id: WindowId, url: &str, active: bool) -> TabInfo {
        TabInfo {
            id: Some(id),
            window_id,
            url: Some(url.to_string()),
            active,
        }
    }

    /// Id and url of a tab the synchronizer may act on. Tabs without either are skipped.
    pub fn addressable(&self) -> Option<(TabId, &str)> {
        match (self.id, self.url.as_deref()) {
            (Some(id), Some(url)) if !url.is_empty() => Some((id, url)),
            _ => None,
        }
    }

    pub fn url_or_empty(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }
}

/// Filter passed to the host's tab enumeration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_window: Option<bool>,
}

impl TabQuery {
    pub fn all() -> TabQuery {
        TabQuery::default()
    }

    pub fn in_window(window_id: WindowId) -> TabQuery {
        TabQuery {
            window_id: Some(window_id),
            ..TabQuery::default()
        }
    }

    pub fn active_in_window(window_id: WindowId) -> TabQuery {
        TabQuery {
            active: Some(true),
            window_id: Some(window_id),
            ..TabQuery::default()
        }
    }

    pub fn active_in_current_window() -> TabQuery {
        TabQuery {
            active: Some(true),
            current_window: Some(true),
            ..TabQuery::default()
        }
    }
}
