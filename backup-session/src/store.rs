//! The ordered tab list and its active-tab invariant.
//!
//! After every method returns, the list holds at least one tab and exactly
//! one of them is active. Each tab also carries a reconciliation token that
//! is bumped whenever something that feeds its history view changes; a
//! history pass started under an older token is stale.

use std::collections::HashMap;

use crate::config::TabDefaults;
use crate::reorder::reorder_tabs;
use crate::tab::{BackupMode, Tab, TabId};

pub struct SessionStore {
    tabs: Vec<Tab>,
    tokens: HashMap<TabId, u64>,
    defaults: TabDefaults,
    last_id: i64,
}

impl SessionStore {
    /// A store holding one fresh, active tab.
    pub fn new(defaults: TabDefaults) -> Self {
        let mut store = Self {
            tabs: Vec::new(),
            tokens: HashMap::new(),
            defaults,
            last_id: 0,
        };
        let mut tab = Tab::new(store.next_id(), &store.defaults);
        tab.active = true;
        store.tabs.push(tab);
        store
    }

    /// Wall-clock milliseconds, nudged forward when two tabs are created in
    /// the same millisecond or the clock steps back.
    fn next_id(&mut self) -> TabId {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_id = now.max(self.last_id + 1);
        TabId(self.last_id)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    fn tab_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.active)
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active_tab().map(|t| t.id)
    }

    /// The active tab. The list is never empty, so there always is one; the
    /// first tab stands in should the flag ever be missing.
    pub fn current_tab(&self) -> &Tab {
        self.active_tab().unwrap_or(&self.tabs[0])
    }

    pub fn current_id(&self) -> TabId {
        self.current_tab().id
    }

    /// Current reconciliation token of a tab (0 until first bumped).
    pub fn token(&self, id: TabId) -> u64 {
        self.tokens.get(&id).copied().unwrap_or(0)
    }

    fn bump(&mut self, id: TabId) {
        *self.tokens.entry(id).or_insert(0) += 1;
    }

    /// Deactivate everything and append a fresh active tab.
    pub fn add_tab(&mut self) -> TabId {
        for tab in &mut self.tabs {
            tab.active = false;
        }
        let id = self.next_id();
        let mut tab = Tab::new(id, &self.defaults);
        tab.active = true;
        self.tabs.push(tab);
        id
    }

    /// Remove a tab. Unknown ids and the last remaining tab are left alone.
    /// When the removed tab was active its left neighbour (or the first tab)
    /// takes over.
    pub fn remove_tab(&mut self, id: TabId) -> bool {
        if self.tabs.len() <= 1 {
            return false;
        }
        let Some(index) = self.tabs.iter().position(|t| t.id == id) else {
            return false;
        };

        let removed = self.tabs.remove(index);
        self.tokens.remove(&id);
        if removed.active {
            let next = index.saturating_sub(1);
            self.tabs[next].active = true;
        }
        true
    }

    /// Make `id` the only active tab. Unknown ids change nothing.
    pub fn switch_tab(&mut self, id: TabId) -> bool {
        if self.tab(id).is_none() {
            return false;
        }
        let previous = self.active_id();
        for tab in &mut self.tabs {
            tab.active = tab.id == id;
        }
        // A pass running for the tab we left must not land on the new view.
        if let Some(previous) = previous.filter(|p| *p != id) {
            self.bump(previous);
        }
        true
    }

    pub fn reorder(&mut self, dragged: TabId, target: TabId) -> bool {
        reorder_tabs(&mut self.tabs, dragged, target)
    }

    /// Point the tab at a new work file. The remembered backup root and
    /// pinned generation belong to the old file and are cleared.
    pub fn set_work_file(&mut self, id: TabId, path: &str, size: u64) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };
        tab.work_file = path.to_string();
        tab.work_file_size = size;
        tab.backup_dir.clear();
        tab.selected_target_dir.clear();
        self.bump(id);
        true
    }

    pub fn set_work_file_size(&mut self, id: TabId, size: u64) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };
        tab.work_file_size = size;
        true
    }

    /// Choose a backup root. Any pinned generation is relative to the old
    /// root, so it is dropped.
    pub fn set_backup_dir(&mut self, id: TabId, dir: &str) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };
        tab.backup_dir = dir.to_string();
        tab.selected_target_dir.clear();
        self.bump(id);
        true
    }

    /// Pin (or with "" unpin) the generation directory used as write target.
    pub fn select_target_dir(&mut self, id: TabId, dir: &str) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };
        if tab.selected_target_dir == dir {
            return false;
        }
        tab.selected_target_dir = dir.to_string();
        self.bump(id);
        true
    }

    pub fn set_search_query(&mut self, id: TabId, query: &str) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };
        if tab.search_query == query {
            return false;
        }
        tab.search_query = query.to_string();
        self.bump(id);
        true
    }

    pub fn set_backup_mode(&mut self, id: TabId, mode: BackupMode) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };
        tab.backup_mode = mode;
        true
    }

    pub fn set_compress_mode(&mut self, id: TabId, compress: &str) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };
        tab.compress_mode = compress.to_string();
        true
    }

    pub fn set_diff_algo(&mut self, id: TabId, algo: &str) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };
        tab.diff_algo = algo.to_string();
        true
    }

    pub fn set_archive_format(&mut self, id: TabId, format: &str) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };
        tab.archive_format = format.to_string();
        true
    }

    /// Swap in a restored tab list without replacing the container. An empty
    /// list is ignored. The active flag is normalized: the first tab marked
    /// active wins, otherwise the first tab.
    pub fn replace_all(&mut self, tabs: Vec<Tab>) -> bool {
        if tabs.is_empty() {
            return false;
        }
        // Every pass in flight was computed against the old list.
        let mut stale: Vec<TabId> = self.tabs.iter().map(|t| t.id).collect();
        stale.extend(self.tokens.keys().copied());
        for id in stale {
            self.bump(id);
        }

        self.tabs.clear();
        self.tabs.extend(tabs);

        let active = self.tabs.iter().position(|t| t.active).unwrap_or(0);
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            tab.active = i == active;
        }

        self.last_id = self.tabs.iter().map(|t| t.id.0).fold(self.last_id, i64::max);
        true
    }

    #[cfg(test)]
    fn active_count(&self) -> usize {
        self.tabs.iter().filter(|t| t.active).count()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(TabDefaults::default())
    }
}
