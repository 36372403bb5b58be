/// Mute planning: which managed tabs to mute or unmute

use crate::membership::MembershipState;
use crate::tab_data::{TabId, TabInfo};
use log::debug;

/// One `muted` flag to apply to one tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuteUpdate {
    pub tab_id: TabId,
    pub muted: bool,
}

impl MuteUpdate {
    pub fn new(tab_id: TabId, muted: bool) -> Self {
        MuteUpdate { tab_id, muted }
    }
}

/// Plan mute states for `tabs` with `active_tab_id` as the audible tab.
///
/// Unmanaged tabs are never touched. Outside sticky mode every managed tab
/// except the active one is muted. In sticky mode nothing happens unless the
/// active tab is itself managed; it then becomes its window's designee and
/// only that window is re-derived.
pub fn plan_mutes(
    state: &mut MembershipState,
    tabs: &[TabInfo],
    active_tab_id: TabId,
) -> Vec<MuteUpdate> {
    if !state.sticky_mode {
        return managed_tabs(state, tabs.iter())
            .map(|tab_id| MuteUpdate::new(tab_id, tab_id != active_tab_id))
            .collect();
    }

    let Some((active, url)) = tabs
        .iter()
        .filter_map(|tab| tab.addressable().map(|(id, url)| (tab, id, url)))
        .find(|(_, id, _)| *id == active_tab_id)
        .map(|(tab, _, url)| (tab, url))
    else {
        debug!("sticky: active tab #{} not in scope, nothing to do", active_tab_id);
        return Vec::new();
    };

    if !state.is_url_managed(url, active_tab_id) {
        debug!("sticky: active tab #{} is unmanaged, keeping designee", active_tab_id);
        return Vec::new();
    }

    let window_id = active.window_id;
    state.set_designee(window_id, active_tab_id);

    let in_window = tabs.iter().filter(|tab| tab.window_id == window_id);
    managed_tabs(state, in_window)
        .map(|tab_id| MuteUpdate::new(tab_id, tab_id != active_tab_id))
        .collect()
}

/// Plan the mute state of a freshly created tab.
///
/// Only managed tabs are touched. A tab counts as active if the host flags it
/// so or it is the window's active tab.
pub fn plan_created_tab(
    state: &MembershipState,
    tab: &TabInfo,
    active_tab_id: Option<TabId>,
) -> Option<MuteUpdate> {
    let tab_id = tab.id?;
    if !state.is_url_managed(tab.url_or_empty(), tab_id) {
        return None;
    }

    let is_active = tab.active || active_tab_id == Some(tab_id);
    let muted = if state.sticky_mode {
        match state.designee(tab.window_id) {
            Some(designee) => designee != tab_id,
            None => !is_active,
        }
    } else {
        !is_active
    };

    Some(MuteUpdate::new(tab_id, muted))
}

fn managed_tabs<'a>(
    state: &'a MembershipState,
    tabs: impl Iterator<Item = &'a TabInfo> + 'a,
) -> impl Iterator<Item = TabId> + 'a {
    tabs.filter_map(|tab| tab.addressable())
        .filter(move |(tab_id, url)| state.is_url_managed(url, *tab_id))
        .map(|(tab_id, _)| tab_id)
}
