//! Event routing for the background process.
//!
//! Host notifications are pushed onto an unbounded queue and consumed by a
//! single task ([`run`]), so handlers never interleave: each one runs to
//! completion, including its awaits on the host, before the next event is
//! taken. The [`Router`] owns the [`MembershipState`] and is the only writer.
//!
//! # Readiness
//!
//! | State | Entered on | Non-lifecycle events |
//! |-------|------------|----------------------|
//! | `Loading` | construction, start of every `init` | dropped |
//! | `Ready` | successful `load_state` | dispatched |

use crate::domain::extract_hostname;
use crate::host::{BrowserHost, HostError, HostEvent, IconState, MenuItem, MenuState};
use crate::membership::{MembershipState, Toggled};
use crate::operations::{plan_created_tab, plan_mutes};
use crate::storage::StorageChanges;
use crate::tab_data::{TabId, TabInfo, TabQuery, WindowId};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, HashSet};

const LOCAL_AREA: &str = "local";

/// Whether persisted state has been loaded in this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Loading,
    Ready,
}

/// Producer side of the event queue
pub type EventQueue = UnboundedSender<HostEvent>;

pub fn event_queue() -> (EventQueue, UnboundedReceiver<HostEvent>) {
    mpsc::unbounded()
}

/// Consume events one at a time until every producer is gone
pub async fn run<H: BrowserHost>(
    mut router: Router<H>,
    mut events: UnboundedReceiver<HostEvent>,
) -> Router<H> {
    while let Some(event) = events.next().await {
        router.handle(event).await;
    }
    info!("event queue closed");
    router
}

pub struct Router<H: BrowserHost> {
    host: H,
    state: MembershipState,
    readiness: Readiness,
}

impl<H: BrowserHost> Router<H> {
    pub fn new(host: H) -> Self {
        Router {
            host,
            state: MembershipState::new(),
            readiness: Readiness::Loading,
        }
    }

    #[cfg(test)]
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    #[cfg(test)]
    pub fn state(&self) -> &MembershipState {
        &self.state
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub async fn handle(&mut self, event: HostEvent) {
        if !event.is_lifecycle() && self.readiness == Readiness::Loading {
            debug!("state not loaded, dropping {:?}", event);
            return;
        }

        match event {
            HostEvent::Installed => {
                info!("extension installed");
                for item in MenuItem::ALL {
                    if let Err(e) = self.host.create_menu(item).await {
                        warn!("failed to create context menu {}: {}", item.id(), e);
                    }
                }
                self.init().await;
            }
            HostEvent::Startup | HostEvent::Wake => self.init().await,
            HostEvent::MenuClicked { menu_item_id, tab } => {
                self.on_menu_clicked(menu_item_id, tab).await
            }
            HostEvent::ToolbarClicked { tab } => self.toggle_managed(&tab).await,
            HostEvent::StorageChanged { area, changes } => {
                self.on_storage_changed(&area, &changes).await
            }
            HostEvent::TabActivated { tab_id, window_id } => {
                self.apply_mute_state(tab_id, window_id).await;
                self.refresh_feedback(tab_id).await;
            }
            HostEvent::TabCreated { tab } => self.on_tab_created(&tab).await,
            HostEvent::TabUpdated {
                tab_id,
                url_changed,
            } => {
                if url_changed {
                    self.refresh_feedback(tab_id).await;
                }
            }
            HostEvent::TabRemoved { tab_id } => {
                self.state.forget_tab(tab_id);
                self.persist_overrides().await;
            }
        }
    }

    /// Reload persisted state. Events are dropped until this succeeds.
    pub async fn init(&mut self) {
        self.readiness = Readiness::Loading;
        match self.load_state().await {
            Ok(()) => {
                self.readiness = Readiness::Ready;
                info!("state loaded, router ready");
            }
            Err(e) => error!("failed to load state, staying in Loading: {}", e),
        }
    }

    async fn load_state(&mut self) -> Result<(), HostError> {
        let stored = self.host.load_stored().await?;
        let tabs = self.host.query_tabs(&TabQuery::all()).await?;

        self.state.apply_stored(stored);

        let open_tabs: HashSet<TabId> = tabs.iter().filter_map(|tab| tab.id).collect();
        if self.state.prune_closed_tabs(&open_tabs) {
            debug!("pruned override ids of closed tabs");
        }
        self.persist_overrides().await;

        let active_by_window: BTreeMap<WindowId, TabId> = tabs
            .iter()
            .filter(|tab| tab.active)
            .filter_map(|tab| tab.id.map(|id| (tab.window_id, id)))
            .collect();

        for (window_id, tab_id) in active_by_window {
            self.apply_mute_state(tab_id, window_id).await;
            self.refresh_feedback(tab_id).await;
        }
        Ok(())
    }

    /// Mute every managed tab in the window except the audible one
    pub async fn apply_mute_state(&mut self, active_tab_id: TabId, window_id: WindowId) {
        let tabs = match self.host.query_tabs(&TabQuery::in_window(window_id)).await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!("failed to query tabs of window {}: {}", window_id, e);
                return;
            }
        };

        let updates = plan_mutes(&mut self.state, &tabs, active_tab_id);
        debug!("mute plan for active tab #{}: {:?}", active_tab_id, updates);
        for update in updates {
            self.set_muted(update.tab_id, update.muted).await;
        }
    }

    /// Flip a tab between managed and forced-unmanaged, persist, refresh feedback
    pub async fn toggle_managed(&mut self, tab: &TabInfo) {
        let Some(tab_id) = tab.id else {
            debug!("toggle on a tab without id ignored");
            return;
        };

        let hostname = extract_hostname(tab.url_or_empty());
        let toggled = self.state.toggle(&hostname, tab_id);
        self.persist_overrides().await;

        match toggled {
            Toggled::NowUnmanaged => self.set_muted(tab_id, false).await,
            Toggled::NowManaged => {
                self.apply_mute_state(tab_id, tab.window_id).await
            }
        }
        self.refresh_feedback(tab_id).await;
    }

    async fn on_menu_clicked(&mut self, item: MenuItem, tab: Option<TabInfo>) {
        if item == MenuItem::OpenOptions {
            if let Err(e) = self.host.open_options_page().await {
                warn!("failed to open options page: {}", e);
            }
            return;
        }

        let Some(tab) = tab else {
            debug!("{} clicked without a tab", item.id());
            return;
        };

        match item {
            MenuItem::ToggleManaged => self.toggle_managed(&tab).await,
            MenuItem::KeepMuted | MenuItem::KeepUnmuted => {
                let Some(tab_id) = tab.id else { return };
                if self.state.is_url_managed(tab.url_or_empty(), tab_id) {
                    debug!("tab #{} is managed, ignoring {}", tab_id, item.id());
                    return;
                }
                self.set_muted(tab_id, item == MenuItem::KeepMuted).await;
            }
            MenuItem::OpenOptions => {}
        }
    }

    async fn on_storage_changed(&mut self, area: &str, changes: &StorageChanges) {
        if area != LOCAL_AREA {
            return;
        }
        self.state.apply_changes(changes);

        match self
            .host
            .query_tabs(&TabQuery::active_in_current_window())
            .await
        {
            Ok(tabs) => {
                if let Some((tab_id, window_id)) = tabs
                    .first()
                    .and_then(|tab| tab.id.map(|id| (id, tab.window_id)))
                {
                    self.apply_mute_state(tab_id, window_id).await;
                }
            }
            Err(e) => warn!("failed to query active tab after storage change: {}", e),
        }
    }

    async fn on_tab_created(&mut self, tab: &TabInfo) {
        let active_tab_id = match self
            .host
            .query_tabs(&TabQuery::active_in_window(tab.window_id))
            .await
        {
            Ok(tabs) => tabs.first().and_then(|active| active.id),
            Err(e) => {
                warn!("failed to query active tab of window {}: {}", tab.window_id, e);
                None
            }
        };

        if let Some(update) = plan_created_tab(&self.state, tab, active_tab_id) {
            self.set_muted(update.tab_id, update.muted).await;
        }
    }

    /// Toolbar icon and context menu for one tab
    pub async fn refresh_feedback(&mut self, tab_id: TabId) {
        let tab = match self.host.get_tab(tab_id).await {
            Ok(tab) => tab,
            Err(e) => {
                debug!("no feedback for tab #{}: {}", tab_id, e);
                return;
            }
        };

        let managed = self.state.is_url_managed(tab.url_or_empty(), tab_id);
        if let Err(e) = self
            .host
            .set_icon(tab_id, IconState::for_managed(managed))
            .await
        {
            warn!("failed to set icon for tab #{}: {}", tab_id, e);
        }
        if let Err(e) = self.host.update_menu(MenuState::for_managed(managed)).await {
            warn!("failed to update context menu: {}", e);
        }
    }

    async fn set_muted(&self, tab_id: TabId, muted: bool) {
        if let Err(e) = self.host.set_muted(tab_id, muted).await {
            warn!("failed to set muted={} on tab #{}: {}", muted, tab_id, e);
        }
    }

    async fn persist_overrides(&self) {
        let overrides = self.state.overrides();
        if let Err(e) = self.host.save_overrides(&overrides).await {
            warn!("failed to persist tab overrides, keeping in-memory state: {}", e);
        }
    }
}
