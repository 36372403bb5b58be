/// `BrowserHost` backed by the chrome.* extension APIs

use crate::host::{BrowserHost, HostError, HostEvent, IconState, MenuItem, MenuState};
use crate::router::EventQueue;
use crate::storage::{StoredOverrides, StoredState, ALL_KEYS};
use crate::tab_data::{TabId, TabInfo, TabQuery};
use log::warn;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/background.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn queryTabs(query: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getTab(tab_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setMuted(tab_id: i32, muted: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(items: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn setIcon(tab_id: i32, path16: &str, path32: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateMenu(id: &str, properties: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn createMenu(id: &str, title: &str, checkbox: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn openOptionsPage() -> Result<(), JsValue>;

    fn installListeners(callback: &js_sys::Function);
}

#[derive(Serialize)]
struct MenuUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
}

fn js_error(err: JsValue) -> HostError {
    HostError::Js(
        err.as_string()
            .unwrap_or_else(|| format!("{:?}", err)),
    )
}

pub struct ChromeHost;

impl BrowserHost for ChromeHost {
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<TabInfo>, HostError> {
        let query_js = serde_wasm_bindgen::to_value(query)?;
        let tabs_js = queryTabs(query_js).await.map_err(js_error)?;
        Ok(serde_wasm_bindgen::from_value(tabs_js)?)
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError> {
        let tab_js = getTab(tab_id)
            .await
            .map_err(|_| HostError::TabNotFound(tab_id))?;
        Ok(serde_wasm_bindgen::from_value(tab_js)?)
    }

    async fn set_muted(&self, tab_id: TabId, muted: bool) -> Result<(), HostError> {
        setMuted(tab_id, muted).await.map_err(js_error)
    }

    async fn load_stored(&self) -> Result<StoredState, HostError> {
        let keys = serde_wasm_bindgen::to_value(&ALL_KEYS)?;
        let stored_js = getStorage(keys).await.map_err(js_error)?;
        if stored_js.is_null() || stored_js.is_undefined() {
            return Ok(StoredState::default());
        }
        Ok(serde_wasm_bindgen::from_value(stored_js)?)
    }

    async fn save_overrides(&self, overrides: &StoredOverrides) -> Result<(), HostError> {
        let items = serde_wasm_bindgen::to_value(overrides)?;
        setStorage(items).await.map_err(js_error)
    }

    async fn set_icon(&self, tab_id: TabId, icon: IconState) -> Result<(), HostError> {
        let (path16, path32) = icon.paths();
        setIcon(tab_id, path16, path32).await.map_err(js_error)
    }

    async fn update_menu(&self, menu: MenuState) -> Result<(), HostError> {
        let checked = MenuUpdate {
            checked: Some(menu.managed_checked),
            enabled: None,
        };
        updateMenu(
            MenuItem::ToggleManaged.id(),
            serde_wasm_bindgen::to_value(&checked)?,
        )
        .await
        .map_err(js_error)?;

        let enabled = MenuUpdate {
            checked: None,
            enabled: Some(menu.keep_mute_enabled),
        };
        for item in [MenuItem::KeepMuted, MenuItem::KeepUnmuted] {
            updateMenu(item.id(), serde_wasm_bindgen::to_value(&enabled)?)
                .await
                .map_err(js_error)?;
        }
        Ok(())
    }

    async fn create_menu(&self, item: MenuItem) -> Result<(), HostError> {
        createMenu(item.id(), item.title(), item.is_checkbox())
            .await
            .map_err(js_error)
    }

    async fn open_options_page(&self) -> Result<(), HostError> {
        openOptionsPage().await.map_err(js_error)
    }
}

/// Forward every browser notification onto `queue`.
///
/// The bridge registers its chrome listeners only once per process.
pub fn forward_events(queue: EventQueue) {
    let callback = Closure::<dyn Fn(JsValue)>::new(move |event_js: JsValue| {
        match serde_wasm_bindgen::from_value::<HostEvent>(event_js) {
            Ok(event) => {
                if queue.unbounded_send(event).is_err() {
                    warn!("event queue closed, dropping event");
                }
            }
            Err(e) => warn!("unrecognized host event: {}", e),
        }
    });
    installListeners(callback.as_ref().unchecked_ref());
    // Listeners live as long as the background process
    callback.forget();
}
