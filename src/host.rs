//! Host capabilities consumed by the background process.
//!
//! Everything the extension needs from the browser (tabs, storage, toolbar
//! icon, context menu) goes through [`BrowserHost`], and everything the
//! browser tells us arrives as a [`HostEvent`].

use crate::storage::{StorageChanges, StoredOverrides, StoredState};
use crate::tab_data::{TabId, TabInfo, TabQuery, WindowId};
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Failure of a host API call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// The browser API rejected or threw.
    #[error("Browser API error: {0}")]
    Js(String),

    /// A value could not be converted between JS and Rust.
    #[error("Serialization error: {0}")]
    Serde(String),

    /// The tab no longer exists.
    #[error("Tab not found: {0}")]
    TabNotFound(TabId),
}

impl From<serde_wasm_bindgen::Error> for HostError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        HostError::Serde(err.to_string())
    }
}

// ============================================================================
// Toolbar icon & context menu
// ============================================================================

/// Toolbar icon variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconState {
    On,
    Off,
}

impl IconState {
    pub fn for_managed(managed: bool) -> Self {
        if managed { IconState::On } else { IconState::Off }
    }

    /// (16px, 32px) asset paths
    pub fn paths(self) -> (&'static str, &'static str) {
        match self {
            IconState::On => ("icons/icon_on16.png", "icons/icon_on32.png"),
            IconState::Off => ("icons/icon_off16.png", "icons/icon_off32.png"),
        }
    }
}

/// Context-menu entries created on install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuItem {
    OpenOptions,
    ToggleManaged,
    KeepMuted,
    KeepUnmuted,
}

impl MenuItem {
    pub const ALL: [MenuItem; 4] = [
        MenuItem::OpenOptions,
        MenuItem::ToggleManaged,
        MenuItem::KeepMuted,
        MenuItem::KeepUnmuted,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MenuItem::OpenOptions => "open-options",
            MenuItem::ToggleManaged => "toggle-managed",
            MenuItem::KeepMuted => "keep-muted",
            MenuItem::KeepUnmuted => "keep-unmuted",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MenuItem::OpenOptions => "Options",
            MenuItem::ToggleManaged => "Tab is managed",
            MenuItem::KeepMuted => "Keep muted",
            MenuItem::KeepUnmuted => "Keep unmuted",
        }
    }

    pub fn is_checkbox(self) -> bool {
        self == MenuItem::ToggleManaged
    }
}

/// Checkbox and enabled state of the context menu for the current tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    pub managed_checked: bool,
    pub keep_mute_enabled: bool,
}

impl MenuState {
    /// Manual mute entries only make sense on unmanaged tabs
    pub fn for_managed(managed: bool) -> Self {
        MenuState {
            managed_checked: managed,
            keep_mute_enabled: !managed,
        }
    }
}

// ============================================================================
// Host trait
// ============================================================================

/// Browser capabilities.
///
/// Every call is an asynchronous round trip into the host; a handler may be
/// suspended at each one.
#[allow(async_fn_in_trait)]
pub trait BrowserHost {
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<TabInfo>, HostError>;

    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError>;

    async fn set_muted(&self, tab_id: TabId, muted: bool) -> Result<(), HostError>;

    async fn load_stored(&self) -> Result<StoredState, HostError>;

    async fn save_overrides(&self, overrides: &StoredOverrides) -> Result<(), HostError>;

    async fn set_icon(&self, tab_id: TabId, icon: IconState) -> Result<(), HostError>;

    async fn update_menu(&self, menu: MenuState) -> Result<(), HostError>;

    async fn create_menu(&self, item: MenuItem) -> Result<(), HostError>;

    async fn open_options_page(&self) -> Result<(), HostError>;
}

// ============================================================================
// Events
// ============================================================================

/// A browser notification, as forwarded by the listener bridge
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostEvent {
    /// Extension installed or updated
    Installed,
    /// Browser started
    Startup,
    /// Background process (re)created
    Wake,
    MenuClicked {
        menu_item_id: MenuItem,
        #[serde(default)]
        tab: Option<TabInfo>,
    },
    ToolbarClicked {
        tab: TabInfo,
    },
    StorageChanged {
        area: String,
        changes: StorageChanges,
    },
    TabActivated {
        tab_id: TabId,
        window_id: WindowId,
    },
    TabCreated {
        tab: TabInfo,
    },
    TabUpdated {
        tab_id: TabId,
        #[serde(default)]
        url_changed: bool,
    },
    TabRemoved {
        tab_id: TabId,
    },
}

impl HostEvent {
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, HostEvent::Installed | HostEvent::Startup | HostEvent::Wake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_menu_item_ids_round_trip() {
        for item in MenuItem::ALL {
            let parsed: MenuItem = serde_json::from_value(json!(item.id())).unwrap();
            assert_eq!(parsed, item);
        }
        assert!(MenuItem::ToggleManaged.is_checkbox());
        assert!(!MenuItem::KeepMuted.is_checkbox());
    }

    #[test]
    fn test_feedback_states() {
        assert_eq!(IconState::for_managed(true), IconState::On);
        assert_eq!(IconState::Off.paths().1, "icons/icon_off32.png");

        let menu = MenuState::for_managed(true);
        assert!(menu.managed_checked);
        assert!(!menu.keep_mute_enabled);
    }

    #[test]
    fn test_parse_tab_events() {
        let event: HostEvent =
            serde_json::from_value(json!({"kind": "tabActivated", "tabId": 4, "windowId": 2}))
                .unwrap();
        assert_eq!(event, HostEvent::TabActivated { tab_id: 4, window_id: 2 });

        let event: HostEvent =
            serde_json::from_value(json!({"kind": "tabUpdated", "tabId": 4})).unwrap();
        assert_eq!(event, HostEvent::TabUpdated { tab_id: 4, url_changed: false });

        let event: HostEvent = serde_json::from_value(json!({"kind": "wake"})).unwrap();
        assert!(event.is_lifecycle());
    }

    #[test]
    fn test_parse_menu_and_storage_events() {
        let event: HostEvent = serde_json::from_value(json!({
            "kind": "menuClicked",
            "menuItemId": "keep-muted",
            "tab": {"id": 3, "windowId": 1, "url": "https://a.com", "active": true},
        }))
        .unwrap();
        match event {
            HostEvent::MenuClicked { menu_item_id, tab } => {
                assert_eq!(menu_item_id, MenuItem::KeepMuted);
                assert_eq!(tab.and_then(|t| t.id), Some(3));
            }
            other => panic!("unexpected event {:?}", other),
        }

        let event: HostEvent = serde_json::from_value(json!({
            "kind": "storageChanged",
            "area": "local",
            "changes": {"stickyMode": {"newValue": true}},
        }))
        .unwrap();
        assert!(!event.is_lifecycle());
        assert!(matches!(event, HostEvent::StorageChanged { ref area, .. } if area == "local"));
    }

    #[test]
    fn test_unknown_event_kind_is_rejected() {
        let parsed = serde_json::from_value::<HostEvent>(json!({"kind": "bookmarkAdded"}));
        assert!(parsed.is_err());
    }
}
