/// In-memory browser host for router tests

use crate::host::{BrowserHost, HostError, IconState, MenuItem, MenuState};
use crate::operations::MuteUpdate;
use crate::storage::{StoredOverrides, StoredState};
use crate::tab_data::{TabId, TabInfo, TabQuery, WindowId};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub struct FakeHost {
    tabs: RefCell<Vec<TabInfo>>,
    current_window: WindowId,
    muted: RefCell<HashMap<TabId, bool>>,
    mute_calls: RefCell<Vec<MuteUpdate>>,
    stored: RefCell<StoredState>,
    raw_stored: RefCell<Option<Value>>,
    saved: RefCell<Vec<StoredOverrides>>,
    icons: RefCell<HashMap<TabId, IconState>>,
    menu: Cell<Option<MenuState>>,
    menus_created: RefCell<Vec<MenuItem>>,
    failing_menu: Cell<Option<MenuItem>>,
    options_opened: Cell<usize>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl FakeHost {
    pub fn with_tabs(tabs: Vec<TabInfo>) -> Self {
        let current_window = tabs.first().map(|tab| tab.window_id).unwrap_or(1);
        FakeHost {
            tabs: RefCell::new(tabs),
            current_window,
            muted: RefCell::new(HashMap::new()),
            mute_calls: RefCell::new(Vec::new()),
            stored: RefCell::new(StoredState::default()),
            raw_stored: RefCell::new(None),
            saved: RefCell::new(Vec::new()),
            icons: RefCell::new(HashMap::new()),
            menu: Cell::new(None),
            menus_created: RefCell::new(Vec::new()),
            failing_menu: Cell::new(None),
            options_opened: Cell::new(0),
            fail_reads: Cell::new(false),
            fail_writes: Cell::new(false),
        }
    }

    pub fn set_stored(&self, stored: StoredState) {
        *self.stored.borrow_mut() = stored;
    }

    /// Storage record as the browser hands it over, decoded on the next load
    pub fn set_stored_json(&self, value: Value) {
        *self.raw_stored.borrow_mut() = Some(value);
    }

    pub fn stored(&self) -> StoredState {
        self.stored.borrow().clone()
    }

    pub fn add_tab(&self, tab: TabInfo) {
        self.tabs.borrow_mut().push(tab);
    }

    pub fn remove_tab(&self, tab_id: TabId) {
        self.tabs.borrow_mut().retain(|tab| tab.id != Some(tab_id));
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn fail_menu(&self, item: MenuItem) {
        self.failing_menu.set(Some(item));
    }

    /// Last muted flag the router set on a tab, if any
    pub fn is_muted(&self, tab_id: TabId) -> Option<bool> {
        self.muted.borrow().get(&tab_id).copied()
    }

    pub fn mute_calls(&self) -> Vec<MuteUpdate> {
        self.mute_calls.borrow().clone()
    }

    pub fn saved_overrides(&self) -> Vec<StoredOverrides> {
        self.saved.borrow().clone()
    }

    pub fn icon(&self, tab_id: TabId) -> Option<IconState> {
        self.icons.borrow().get(&tab_id).copied()
    }

    pub fn menu(&self) -> Option<MenuState> {
        self.menu.get()
    }

    pub fn menus_created(&self) -> Vec<MenuItem> {
        self.menus_created.borrow().clone()
    }

    pub fn options_opened(&self) -> usize {
        self.options_opened.get()
    }

    fn tab_exists(&self, tab_id: TabId) -> bool {
        self.tabs.borrow().iter().any(|tab| tab.id == Some(tab_id))
    }
}

impl BrowserHost for FakeHost {
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<TabInfo>, HostError> {
        let tabs = self
            .tabs
            .borrow()
            .iter()
            .filter(|tab| query.active.is_none_or(|active| tab.active == active))
            .filter(|tab| query.window_id.is_none_or(|window_id| tab.window_id == window_id))
            .filter(|tab| query.current_window != Some(true) || tab.window_id == self.current_window)
            .cloned()
            .collect();
        Ok(tabs)
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError> {
        self.tabs
            .borrow()
            .iter()
            .find(|tab| tab.id == Some(tab_id))
            .cloned()
            .ok_or(HostError::TabNotFound(tab_id))
    }

    async fn set_muted(&self, tab_id: TabId, muted: bool) -> Result<(), HostError> {
        if !self.tab_exists(tab_id) {
            return Err(HostError::TabNotFound(tab_id));
        }
        self.muted.borrow_mut().insert(tab_id, muted);
        self.mute_calls.borrow_mut().push(MuteUpdate::new(tab_id, muted));
        Ok(())
    }

    async fn load_stored(&self) -> Result<StoredState, HostError> {
        if self.fail_reads.get() {
            return Err(HostError::Js("storage unavailable".to_string()));
        }
        if let Some(raw) = self.raw_stored.borrow_mut().take() {
            let stored: StoredState =
                serde_json::from_value(raw).map_err(|e| HostError::Serde(e.to_string()))?;
            self.set_stored(stored);
        }
        Ok(self.stored())
    }

    async fn save_overrides(&self, overrides: &StoredOverrides) -> Result<(), HostError> {
        if self.fail_writes.get() {
            return Err(HostError::Js("quota exceeded".to_string()));
        }
        let mut stored = self.stored.borrow_mut();
        stored.excluded_tabs_array = overrides.excluded_tabs_array.clone();
        stored.included_tabs_array = overrides.included_tabs_array.clone();
        self.saved.borrow_mut().push(overrides.clone());
        Ok(())
    }

    async fn set_icon(&self, tab_id: TabId, icon: IconState) -> Result<(), HostError> {
        if !self.tab_exists(tab_id) {
            return Err(HostError::TabNotFound(tab_id));
        }
        self.icons.borrow_mut().insert(tab_id, icon);
        Ok(())
    }

    async fn update_menu(&self, menu: MenuState) -> Result<(), HostError> {
        self.menu.set(Some(menu));
        Ok(())
    }

    async fn create_menu(&self, item: MenuItem) -> Result<(), HostError> {
        if self.failing_menu.get() == Some(item) {
            return Err(HostError::Js(format!("duplicate menu id {}", item.id())));
        }
        self.menus_created.borrow_mut().push(item);
        Ok(())
    }

    async fn open_options_page(&self) -> Result<(), HostError> {
        self.options_opened.set(self.options_opened.get() + 1);
        Ok(())
    }
}
