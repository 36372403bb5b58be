/// Membership state and the managed/unmanaged decision for Tab Muter

use crate::domain::{extract_hostname, matches_any};
use crate::storage::{
    StorageChange, StorageChanges, StoredOverrides, StoredState, EXCLUDED_DOMAINS,
    EXCLUDED_TABS_ARRAY, INCLUDED_DOMAINS, INCLUDED_TABS_ARRAY, MUTE_SPECIFIC_ONLY, STICKY_MODE,
};
use crate::tab_data::{TabId, WindowId};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Outcome of toggling a tab's managed status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    /// The tab is now forced unmanaged and should be unmuted
    NowUnmanaged,
    /// The tab is now forced managed and its window should be re-synchronized
    NowManaged,
}

/// Domain rules, mode flags and per-tab overrides
///
/// One instance per background process. `excluded_tabs` and `included_tabs`
/// never share an id; every mutation below goes through `exclude_tab` /
/// `include_tab` / `forget_tab` to keep it that way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MembershipState {
    pub excluded_domains: Vec<String>,
    pub included_domains: Vec<String>,
    pub mute_specific_only: bool,
    pub sticky_mode: bool,
    excluded_tabs: BTreeSet<TabId>,
    included_tabs: BTreeSet<TabId>,
    last_managed_by_window: HashMap<WindowId, TabId>,
}

impl MembershipState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace rules, flags and overrides with a freshly read storage record.
    /// Sticky designees are process-local and survive.
    pub fn apply_stored(&mut self, stored: StoredState) {
        self.excluded_domains = stored.excluded_domains;
        self.included_domains = stored.included_domains;
        self.mute_specific_only = stored.mute_specific_only;
        self.sticky_mode = stored.sticky_mode;
        self.excluded_tabs = stored.excluded_tabs_array.into_iter().collect();
        self.included_tabs = stored
            .included_tabs_array
            .into_iter()
            .filter(|id| !self.excluded_tabs.contains(id))
            .collect();
    }

    /// Drop override ids that do not belong to an open tab.
    /// Returns true if anything was removed.
    pub fn prune_closed_tabs(&mut self, open_tabs: &HashSet<TabId>) -> bool {
        let before = self.excluded_tabs.len() + self.included_tabs.len();
        self.excluded_tabs.retain(|id| open_tabs.contains(id));
        self.included_tabs.retain(|id| open_tabs.contains(id));
        self.last_managed_by_window
            .retain(|_, tab_id| open_tabs.contains(&*tab_id));
        before != self.excluded_tabs.len() + self.included_tabs.len()
    }

    /// Single source of truth for managed status.
    ///
    /// Manual overrides win over domain rules in either mode.
    pub fn is_tab_managed(&self, hostname: &str, tab_id: TabId) -> bool {
        if self.excluded_tabs.contains(&tab_id) {
            debug!("tab #{} is in excludedTabs => not managed", tab_id);
            return false;
        }
        if self.included_tabs.contains(&tab_id) {
            debug!("tab #{} is in includedTabs => managed", tab_id);
            return true;
        }

        let managed = if self.mute_specific_only {
            matches_any(hostname, &self.included_domains)
        } else {
            !matches_any(hostname, &self.excluded_domains)
        };
        debug!(
            "tab #{} ({:?}) muteSpecificOnly={} => managed? {}",
            tab_id, hostname, self.mute_specific_only, managed
        );
        managed
    }

    pub fn is_url_managed(&self, url: &str, tab_id: TabId) -> bool {
        self.is_tab_managed(&extract_hostname(url), tab_id)
    }

    /// Force a tab unmanaged
    pub fn exclude_tab(&mut self, tab_id: TabId) {
        self.included_tabs.remove(&tab_id);
        self.excluded_tabs.insert(tab_id);
    }

    /// Force a tab managed
    pub fn include_tab(&mut self, tab_id: TabId) {
        self.excluded_tabs.remove(&tab_id);
        self.included_tabs.insert(tab_id);
    }

    /// Flip a tab between forced-unmanaged and managed.
    ///
    /// Leaving the forced-unmanaged state only records an explicit include when
    /// in inclusion mode or when domain rules alone would still leave the tab
    /// unmanaged, so toggling twice restores the original status.
    pub fn toggle(&mut self, hostname: &str, tab_id: TabId) -> Toggled {
        if self.is_tab_managed(hostname, tab_id) {
            self.exclude_tab(tab_id);
            Toggled::NowUnmanaged
        } else {
            self.excluded_tabs.remove(&tab_id);
            if self.mute_specific_only || !self.is_tab_managed(hostname, tab_id) {
                self.include_tab(tab_id);
            }
            Toggled::NowManaged
        }
    }

    /// Forget everything recorded about a closed tab
    pub fn forget_tab(&mut self, tab_id: TabId) {
        self.excluded_tabs.remove(&tab_id);
        self.included_tabs.remove(&tab_id);
        self.last_managed_by_window
            .retain(|_, designee| *designee != tab_id);
    }

    #[cfg(test)]
    pub fn is_excluded_tab(&self, tab_id: TabId) -> bool {
        self.excluded_tabs.contains(&tab_id)
    }

    #[cfg(test)]
    pub fn is_included_tab(&self, tab_id: TabId) -> bool {
        self.included_tabs.contains(&tab_id)
    }

    /// Override sets in their persisted form
    pub fn overrides(&self) -> StoredOverrides {
        StoredOverrides {
            excluded_tabs_array: self.excluded_tabs.iter().copied().collect(),
            included_tabs_array: self.included_tabs.iter().copied().collect(),
        }
    }

    /// Sticky-mode designee of a window
    pub fn designee(&self, window_id: WindowId) -> Option<TabId> {
        self.last_managed_by_window.get(&window_id).copied()
    }

    pub fn set_designee(&mut self, window_id: WindowId, tab_id: TabId) {
        self.last_managed_by_window.insert(window_id, tab_id);
    }

    /// Merge a local-area storage change notification.
    ///
    /// Override arrays are skipped: only this process writes them and the
    /// in-memory sets are authoritative. Keys with a malformed value are logged
    /// and left as they were.
    pub fn apply_changes(&mut self, changes: &StorageChanges) {
        for (key, change) in changes {
            let merged = match key.as_str() {
                EXCLUDED_DOMAINS => merge_value(change, &mut self.excluded_domains),
                INCLUDED_DOMAINS => merge_value(change, &mut self.included_domains),
                MUTE_SPECIFIC_ONLY => merge_value(change, &mut self.mute_specific_only),
                STICKY_MODE => merge_value(change, &mut self.sticky_mode),
                EXCLUDED_TABS_ARRAY | INCLUDED_TABS_ARRAY => Ok(()),
                other => {
                    debug!("ignoring change to unknown storage key {:?}", other);
                    Ok(())
                }
            };
            if let Err(e) = merged {
                warn!("ignoring malformed value for {:?}: {}", key, e);
            }
        }
    }
}

/// A removed key resets to its default
fn merge_value<T: DeserializeOwned + Default>(
    change: &StorageChange,
    target: &mut T,
) -> Result<(), serde_json::Error> {
    *target = match &change.new_value {
        Some(value) => serde_json::from_value(value.clone())?,
        None => T::default(),
    };
    Ok(())
}
