//! The session facade.
//!
//! [`Session`] owns the tab store, the recent-file list and the history view
//! behind one shared handle, and is the only place they are mutated. Each
//! mutation emits a [`SessionEvent`] and schedules a fire-and-forget save of
//! the full snapshot; concurrent saves are not ordered, the last one to
//! finish wins. Locks are never held across a backend call.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::backend::Backend;
use crate::config::Config;
use crate::events::{EventBus, SessionEvent};
use crate::history::{self, HistoryPanel};
use crate::persistence::{SaveTracker, SessionPersistence, SessionSnapshot};
use crate::plan::{BackupPlan, RestorePlan};
use crate::recent::RecentFiles;
use crate::store::SessionStore;
use crate::tab::{BackupMode, Tab, TabId};
use crate::{Result, SessionError};

/// Everything a view may read. Shared by handle, never copied, so a restore
/// that swaps the contents is visible to every holder.
pub struct SessionState {
    pub store: SessionStore,
    pub recent: RecentFiles,
    pub history: HistoryPanel,
}

pub type SharedState = Arc<RwLock<SessionState>>;

/// Result of a history refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// The new view replaced the old one
    Applied,
    /// Listing failed; the error is shown and the old list kept
    Failed,
    /// The tab changed while the pass ran; the result was dropped
    Discarded,
}

#[derive(Clone)]
pub struct Session {
    backend: Arc<dyn Backend>,
    state: SharedState,
    persistence: Arc<SessionPersistence>,
    saves: SaveTracker,
    events: EventBus,
}

impl Session {
    pub fn new(backend: Arc<dyn Backend>, config: &Config) -> Self {
        let state = SessionState {
            store: SessionStore::new(config.tab_defaults.clone()),
            recent: RecentFiles::with_limit(config.session.max_recent_files),
            history: HistoryPanel::default(),
        };
        Self {
            persistence: Arc::new(SessionPersistence::new(
                backend.clone(),
                config.session.file_name.clone(),
            )),
            backend,
            state: Arc::new(RwLock::new(state)),
            saves: SaveTracker::new(),
            events: EventBus::new(),
        }
    }

    pub fn handle(&self) -> SharedState {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.state.read().store.tabs().to_vec()
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.state.read().store.active_tab().cloned()
    }

    pub fn recent_files(&self) -> Vec<String> {
        self.state.read().recent.to_vec()
    }

    pub fn history(&self) -> HistoryPanel {
        self.state.read().history.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        SessionSnapshot {
            tabs: state.store.tabs().to_vec(),
            recent_files: Some(state.recent.to_vec()),
        }
    }

    // --- tabs ---

    pub fn add_tab(&self) -> TabId {
        let id = self.state.write().store.add_tab();
        tracing::debug!("Added tab {}", id);
        self.changed(SessionEvent::TabAdded { id });
        id
    }

    pub fn remove_tab(&self, id: TabId) -> bool {
        let removed = self.state.write().store.remove_tab(id);
        if removed {
            tracing::debug!("Removed tab {}", id);
            self.changed(SessionEvent::TabRemoved { id });
        }
        removed
    }

    pub fn switch_tab(&self, id: TabId) -> bool {
        let switched = self.state.write().store.switch_tab(id);
        if switched {
            self.changed(SessionEvent::TabSwitched { id });
        } else {
            tracing::warn!("Switch to unknown tab {} ignored", id);
        }
        switched
    }

    pub fn reorder(&self, dragged: TabId, target: TabId) -> bool {
        let moved = self.state.write().store.reorder(dragged, target);
        if moved {
            self.changed(SessionEvent::TabsReordered);
        }
        moved
    }

    /// Apply `f` to the active tab's id inside the store. Emits and saves
    /// only when `f` reports a change.
    fn update_active(&self, f: impl FnOnce(&mut SessionStore, TabId) -> bool) -> bool {
        let updated = {
            let mut state = self.state.write();
            match state.store.active_id() {
                Some(id) => f(&mut state.store, id).then_some(id),
                None => None,
            }
        };
        match updated {
            Some(id) => {
                self.changed(SessionEvent::TabUpdated { id });
                true
            }
            None => false,
        }
    }

    pub fn set_search_query(&self, query: &str) -> bool {
        self.update_active(|store, id| store.set_search_query(id, query))
    }

    pub fn set_backup_dir(&self, dir: &str) -> bool {
        self.update_active(|store, id| store.set_backup_dir(id, dir))
    }

    pub fn set_backup_mode(&self, mode: BackupMode) -> bool {
        self.update_active(|store, id| store.set_backup_mode(id, mode))
    }

    pub fn set_compress_mode(&self, compress: &str) -> bool {
        self.update_active(|store, id| store.set_compress_mode(id, compress))
    }

    pub fn set_diff_algo(&self, algo: &str) -> bool {
        self.update_active(|store, id| store.set_diff_algo(id, algo))
    }

    pub fn set_archive_format(&self, format: &str) -> bool {
        self.update_active(|store, id| store.set_archive_format(id, format))
    }

    // --- recent files ---

    /// Put `path` at the front of the recent list and store the list right
    /// away, independent of the session document.
    pub fn add_to_recent_files(&self, path: &str) -> bool {
        let added = self.state.write().recent.add(path);
        if added {
            self.recent_changed();
        }
        added
    }

    /// Drop a recent path that no longer resolves.
    pub fn remove_if_stale(&self, path: &str) -> bool {
        let removed = self.state.write().recent.remove(path);
        if removed {
            tracing::info!("Pruned stale recent file {}", path);
            self.recent_changed();
        }
        removed
    }

    /// Explicit removal from the recent list by the user.
    pub fn remove_recent_file(&self, path: &str) -> bool {
        let removed = self.state.write().recent.remove(path);
        if removed {
            self.recent_changed();
            self.request_save();
        }
        removed
    }

    /// Load the recent list from its own store, e.g. at startup.
    pub async fn load_recent_files(&self) {
        match self.backend.load_recent_files().await {
            Ok(paths) => {
                self.state.write().recent.replace_all(paths);
                self.events.emit(SessionEvent::RecentFilesChanged);
            }
            Err(e) => tracing::warn!("Failed to load recent files: {}", e),
        }
    }

    fn recent_changed(&self) {
        self.events.emit(SessionEvent::RecentFilesChanged);
        self.request_recent_store();
    }

    // --- work file and target ---

    /// Make `path` the active tab's work file. A path that no longer resolves
    /// is pruned from the recent list and the error returned; nothing else
    /// changes.
    pub async fn open_work_file(&self, path: &str) -> Result<u64> {
        let size = match self.backend.file_size(path).await {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!("Cannot open work file {}: {}", path, e);
                self.remove_if_stale(path);
                return Err(e);
            }
        };

        let id = {
            let mut state = self.state.write();
            let id = state.store.current_id();
            state.store.set_work_file(id, path, size);
            state.recent.add(path);
            id
        };
        tracing::info!("Work file of tab {} is now {}", id, path);
        self.recent_changed();
        self.changed(SessionEvent::TabUpdated { id });
        Ok(size)
    }

    /// Re-read the active work file's size. A file that has gone away is
    /// pruned from the recent list like on open; the tab keeps its path.
    pub async fn refresh_work_file_size(&self) -> Result<u64> {
        let tab = self.state.read().store.current_tab().clone();
        if !tab.has_work_file() {
            return Err(SessionError::NoFileSelected);
        }
        let size = match self.backend.file_size(&tab.work_file).await {
            Ok(size) => size,
            Err(e) => {
                if e.is_stale_reference() {
                    self.remove_if_stale(&tab.work_file);
                }
                return Err(e);
            }
        };
        let changed = {
            let mut state = self.state.write();
            let before = state.store.tab(tab.id).map(|t| t.work_file_size);
            state.store.set_work_file_size(tab.id, size) && before != Some(size)
        };
        if changed {
            self.changed(SessionEvent::TabUpdated { id: tab.id });
        }
        Ok(size)
    }

    /// Pin `dir` as the active tab's write target and show the result.
    /// Passing "" returns to the inferred target.
    pub async fn select_target_dir(&self, dir: &str) -> Refresh {
        if self.update_active(|store, id| store.select_target_dir(id, dir)) {
            tracing::info!("Write target set to {:?}", dir);
        }
        self.refresh_history().await
    }

    /// Pin the generation of the shown entry at `file_path`. Archives and the
    /// current target are not selectable.
    pub async fn select_generation(&self, file_path: &str) -> Option<Refresh> {
        let dir = {
            let state = self.state.read();
            let entry = state.history.entry(file_path)?;
            if !entry.can_become_target() {
                return None;
            }
            entry.directory.clone()
        };
        Some(self.select_target_dir(&dir).await)
    }

    // --- history ---

    fn active_with_token(&self) -> Option<(Tab, u64)> {
        let state = self.state.read();
        let tab = state.store.active_tab()?.clone();
        let token = state.store.token(tab.id);
        Some((tab, token))
    }

    /// Reconcile the active tab's history and show it, unless the tab was
    /// switched away from or changed while the pass ran.
    pub async fn refresh_history(&self) -> Refresh {
        let Some((tab, token)) = self.active_with_token() else {
            return Refresh::Discarded;
        };

        let outcome = history::reconcile(self.backend.as_ref(), &tab).await;

        let refresh = {
            let mut state = self.state.write();
            let current = state.store.active_id() == Some(tab.id)
                && state.store.token(tab.id) == token;
            if !current {
                tracing::debug!("Discarding stale history pass for tab {}", tab.id);
                return Refresh::Discarded;
            }
            match outcome {
                Ok(view) => {
                    state.history.show(tab.id, view);
                    Refresh::Applied
                }
                Err(e) => {
                    tracing::warn!("Failed to list backups for {}: {}", tab.work_file, e);
                    state.history.fail(tab.id, e.to_string());
                    Refresh::Failed
                }
            }
        };
        self.events.emit(SessionEvent::HistoryUpdated { id: tab.id });
        refresh
    }

    /// Write the sidecar note of a backup file and refresh the view. A write
    /// failure is shown inline and returned.
    pub async fn write_note(&self, file_path: &str, text: &str) -> Result<Refresh> {
        let path = history::note_path(file_path);
        if let Err(e) = self.backend.write_text(&path, text).await {
            tracing::warn!("Failed to save note {}: {}", path, e);
            let mut state = self.state.write();
            if let Some(id) = state.store.active_id() {
                state.history.fail(id, e.to_string());
            }
            return Err(e);
        }
        Ok(self.refresh_history().await)
    }

    pub async fn read_note(&self, file_path: &str) -> String {
        history::load_note(self.backend.as_ref(), file_path).await
    }

    // --- backup / restore planning ---

    /// Resolve what a backup of the active tab should do. A pinned target
    /// that has disappeared is unpinned first so the backend falls back to
    /// its own generation discovery.
    pub async fn plan_backup(&self) -> Result<BackupPlan> {
        let tab = self.active_tab().ok_or(SessionError::NoFileSelected)?;
        if !tab.has_work_file() {
            return Err(SessionError::NoFileSelected);
        }

        let pinned = tab.selected_target_dir.clone();
        if tab.backup_mode == BackupMode::Diff
            && !pinned.is_empty()
            && !self.backend.directory_exists(&pinned).await
        {
            tracing::info!("Selected directory {} no longer exists, reverting to auto-discovery", pinned);
            let cleared = {
                let mut state = self.state.write();
                state.store.select_target_dir(tab.id, "")
            };
            if cleared {
                self.changed(SessionEvent::TabUpdated { id: tab.id });
            }
        }

        let current = self.state.read().store.tab(tab.id).cloned();
        let tab = current.ok_or(SessionError::UnknownTab(tab.id))?;
        BackupPlan::for_tab(&tab)
    }

    pub fn plan_restore(&self, sources: &[String]) -> Result<RestorePlan> {
        let tab = self.active_tab().ok_or(SessionError::NoFileSelected)?;
        RestorePlan::for_tab(&tab, sources)
    }

    // --- persistence ---

    /// Save now and wait for it. Returns whether a document was written.
    pub async fn save(&self) -> bool {
        self.persistence.save(&self.snapshot()).await
    }

    /// Replace tabs and recent files with the saved session, in place.
    /// Returns false when there was nothing to restore.
    pub async fn restore(&self) -> bool {
        let Some(snapshot) = self.persistence.restore().await else {
            return false;
        };
        let has_recent = snapshot.recent_files.is_some();
        {
            let mut state = self.state.write();
            if !state.store.replace_all(snapshot.tabs) {
                tracing::info!("Saved session has no tabs, keeping current ones");
            }
            if let Some(paths) = snapshot.recent_files {
                state.recent.replace_all(paths);
            }
            state.history = HistoryPanel::default();
        }
        tracing::info!("Restored previous session");
        if has_recent {
            self.request_recent_store();
        }
        self.events.emit(SessionEvent::SessionRestored);
        true
    }

    /// Wait for every scheduled save to finish.
    pub async fn flush(&self) {
        self.saves.flush().await;
    }

    fn changed(&self, event: SessionEvent) {
        self.events.emit(event);
        self.request_save();
    }

    fn spawn_tracked<F>(&self, what: &str, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => self.saves.track(handle.spawn(fut)),
            Err(_) => tracing::warn!("No async runtime, {} not saved", what),
        }
    }

    fn request_save(&self) {
        let snapshot = self.snapshot();
        let persistence = self.persistence.clone();
        self.spawn_tracked("session", async move {
            persistence.save(&snapshot).await;
        });
    }

    fn request_recent_store(&self) {
        let paths = self.recent_files();
        let backend = self.backend.clone();
        self.spawn_tracked("recent files", async move {
            if let Err(e) = backend.store_recent_files(&paths).await {
                tracing::warn!("Failed to store recent files: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackupEntry, MemoryBackend, Preference};
    use crate::history::HistoryView;

    fn session() -> (Arc<MemoryBackend>, Session) {
        let backend = Arc::new(MemoryBackend::new());
        let session = Session::new(backend.clone(), &Config::default());
        (backend, session)
    }

    fn entry(name: &str, path: &str, generation: u32) -> BackupEntry {
        BackupEntry {
            file_name: name.into(),
            file_path: path.into(),
            file_size: 1,
            timestamp: "2025-01-01 00:00:00".into(),
            generation,
        }
    }

    fn with_history(backend: &MemoryBackend) {
        backend.add_file("/x/work.clip", 512);
        backend.set_backups(
            "/x/work.clip",
            vec![
                entry("work_1.diff", "/x/base1_a/work_1.diff", 1),
                entry("work_2.diff", "/x/base2_b/work_2.diff", 2),
                entry("work.zip", "/x/work.zip", 0),
            ],
        );
    }

    #[tokio::test]
    async fn test_mutations_emit_events() {
        let (_, session) = session();
        let mut rx = session.subscribe();

        let first = session.active_tab().unwrap().id;
        let second = session.add_tab();
        session.switch_tab(first);
        session.reorder(second, first);
        session.remove_tab(second);

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::TabAdded { id: second });
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::TabSwitched { id: first });
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::TabsReordered);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::TabRemoved { id: second });
        session.flush().await;
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let (backend, session) = session();
        session.add_tab();
        session.flush().await;

        assert!(backend.write_count() >= 1);
        let stored = backend.text("/config/session.json").unwrap();
        let snapshot: SessionSnapshot = serde_json::from_str(&stored).unwrap();
        assert_eq!(snapshot.tabs.len(), 2);
    }

    #[tokio::test]
    async fn test_round_trip_into_fresh_session() {
        let (backend, session) = session();
        with_history(&backend);
        session.open_work_file("/x/work.clip").await.unwrap();
        session.set_search_query("work_2");
        session.add_tab();
        session.set_backup_mode(BackupMode::Copy);
        session.flush().await;
        assert!(session.save().await);

        let fresh = Session::new(backend.clone(), &Config::default());
        let handle = fresh.handle();
        assert!(fresh.restore().await);

        assert_eq!(fresh.tabs(), session.tabs());
        assert_eq!(fresh.recent_files(), ["/x/work.clip"]);
        // the handle taken before restore sees the restored tabs
        assert_eq!(handle.read().store.len(), 2);
        fresh.flush().await;
    }

    #[tokio::test]
    async fn test_restore_noop_when_disabled_or_missing() {
        let (backend, session) = session();
        let before = session.tabs();
        assert!(!session.restore().await);
        assert_eq!(session.tabs(), before);

        session.add_tab();
        session.flush().await;
        backend.set_preference(Preference::RestorePreviousState, false);
        let fresh = Session::new(backend.clone(), &Config::default());
        let fresh_tabs = fresh.tabs();
        assert!(!fresh.restore().await);
        assert_eq!(fresh.tabs(), fresh_tabs);
    }

    #[tokio::test]
    async fn test_restore_without_recent_list_keeps_recent_store() {
        let (backend, session) = session();
        backend.set_text(
            "/config/session.json",
            r#"{"tabs":[{"id":5,"workFile":"/a.clip","active":true}]}"#,
        );
        session.add_to_recent_files("/keep.clip");
        session.flush().await;

        assert!(session.restore().await);
        session.flush().await;

        assert_eq!(session.active_tab().unwrap().work_file, "/a.clip");
        assert_eq!(session.recent_files(), ["/keep.clip"]);
        assert_eq!(backend.stored_recent_files(), ["/keep.clip"]);
    }

    #[tokio::test]
    async fn test_recent_files_stored_without_session_restore() {
        let (backend, session) = session();
        backend.set_preference(Preference::RestorePreviousState, false);

        session.add_to_recent_files("/a.clip");
        session.add_to_recent_files("/b.clip");
        session.flush().await;

        assert_eq!(backend.stored_recent_files(), ["/b.clip", "/a.clip"]);
        assert!(backend.text("/config/session.json").is_none());

        let fresh = Session::new(backend.clone(), &Config::default());
        fresh.load_recent_files().await;
        assert_eq!(fresh.recent_files(), ["/b.clip", "/a.clip"]);
    }

    #[tokio::test]
    async fn test_open_missing_file_prunes_recent() {
        let (backend, session) = session();
        session.add_to_recent_files("/gone.clip");
        let before = session.active_tab().unwrap();

        let err = session.open_work_file("/gone.clip").await.unwrap_err();
        session.flush().await;

        assert!(err.is_stale_reference());
        assert!(session.recent_files().is_empty());
        assert!(backend.stored_recent_files().is_empty());
        assert_eq!(session.active_tab().unwrap(), before);
    }

    #[tokio::test]
    async fn test_refresh_work_file_size() {
        let (backend, session) = session();
        assert!(matches!(
            session.refresh_work_file_size().await,
            Err(SessionError::NoFileSelected)
        ));

        backend.add_file("/x/work.clip", 512);
        session.open_work_file("/x/work.clip").await.unwrap();
        backend.add_file("/x/work.clip", 2048);

        assert_eq!(session.refresh_work_file_size().await.unwrap(), 2048);
        assert_eq!(session.active_tab().unwrap().work_file_size, 2048);

        backend.remove_file("/x/work.clip");
        assert!(session.refresh_work_file_size().await.unwrap_err().is_stale_reference());
        assert!(session.recent_files().is_empty());
        assert_eq!(session.active_tab().unwrap().work_file, "/x/work.clip");
        session.flush().await;
    }

    #[tokio::test]
    async fn test_open_directory_is_rejected() {
        let (backend, session) = session();
        backend.add_dir("/x");
        assert!(session.open_work_file("/x").await.is_err());
        assert!(!session.active_tab().unwrap().has_work_file());
    }

    #[tokio::test]
    async fn test_open_resets_targets() {
        let (backend, session) = session();
        with_history(&backend);
        backend.add_file("/y/other.clip", 1);
        session.open_work_file("/x/work.clip").await.unwrap();
        session.set_backup_dir("/x");
        session.select_target_dir("/x/base1_a").await;

        session.open_work_file("/y/other.clip").await.unwrap();
        let tab = session.active_tab().unwrap();
        assert_eq!(tab.work_file, "/y/other.clip");
        assert!(tab.backup_dir.is_empty());
        assert!(tab.selected_target_dir.is_empty());
        assert_eq!(session.recent_files(), ["/y/other.clip", "/x/work.clip"]);
        session.flush().await;
    }

    #[tokio::test]
    async fn test_refresh_does_not_pin_inferred_target() {
        let (backend, session) = session();
        with_history(&backend);
        session.open_work_file("/x/work.clip").await.unwrap();

        assert_eq!(session.refresh_history().await, Refresh::Applied);

        let history = session.history();
        let HistoryView::Listing(listing) = history.view().unwrap() else {
            panic!("expected a listing");
        };
        assert_eq!(listing.active_directory, "/x/base2_b");
        assert!(session.active_tab().unwrap().selected_target_dir.is_empty());
        session.flush().await;
    }

    #[tokio::test]
    async fn test_select_generation_pins_directory() {
        let (backend, session) = session();
        with_history(&backend);
        session.open_work_file("/x/work.clip").await.unwrap();
        session.refresh_history().await;

        // archives and the current target are not selectable
        assert_eq!(session.select_generation("/x/work.zip").await, None);
        assert_eq!(session.select_generation("/x/base2_b/work_2.diff").await, None);

        let refresh = session.select_generation("/x/base1_a/work_1.diff").await;
        assert_eq!(refresh, Some(Refresh::Applied));
        assert_eq!(session.active_tab().unwrap().selected_target_dir, "/x/base1_a");

        let history = session.history();
        assert!(history.entry("/x/base1_a/work_1.diff").unwrap().is_target);
        assert!(!history.entry("/x/base2_b/work_2.diff").unwrap().is_target);

        session.flush().await;
        let saved: SessionSnapshot =
            serde_json::from_str(&backend.text("/config/session.json").unwrap()).unwrap();
        assert_eq!(saved.tabs[0].selected_target_dir, "/x/base1_a");
    }

    #[tokio::test]
    async fn test_listing_failure_keeps_previous_list() {
        let (backend, session) = session();
        with_history(&backend);
        session.open_work_file("/x/work.clip").await.unwrap();
        session.refresh_history().await;
        let shown = session.history().view().cloned();

        backend.fail_listings(true);
        assert_eq!(session.refresh_history().await, Refresh::Failed);

        let history = session.history();
        assert_eq!(history.view().cloned(), shown);
        assert!(history.error().is_some());
        session.flush().await;
    }

    #[tokio::test]
    async fn test_stale_pass_is_discarded_after_switch() {
        let (backend, session) = session();
        with_history(&backend);
        session.open_work_file("/x/work.clip").await.unwrap();
        let gate = backend.hold_listings();

        let (refresh, _) = tokio::join!(session.refresh_history(), async {
            session.add_tab();
            gate.notify_one();
        });

        assert_eq!(refresh, Refresh::Discarded);
        assert!(session.history().view().is_none());
        session.flush().await;
    }

    #[tokio::test]
    async fn test_stale_pass_is_discarded_after_query_change() {
        let (backend, session) = session();
        with_history(&backend);
        session.open_work_file("/x/work.clip").await.unwrap();
        let gate = backend.hold_listings();

        let (refresh, _) = tokio::join!(session.refresh_history(), async {
            session.set_search_query("work_1");
            gate.notify_one();
        });
        assert_eq!(refresh, Refresh::Discarded);

        gate.notify_one();
        assert_eq!(session.refresh_history().await, Refresh::Applied);
        assert_eq!(session.history().view().unwrap().entries().len(), 1);
        session.flush().await;
    }

    #[tokio::test]
    async fn test_write_note_refreshes_view() {
        let (backend, session) = session();
        with_history(&backend);
        session.open_work_file("/x/work.clip").await.unwrap();

        let refresh = session.write_note("/x/work.zip", "before the big change").await.unwrap();
        assert_eq!(refresh, Refresh::Applied);
        assert_eq!(backend.text("/x/work.zip.note").unwrap(), "before the big change");
        assert_eq!(
            session.history().entry("/x/work.zip").unwrap().note,
            "before the big change"
        );
        assert_eq!(session.read_note("/x/work.zip").await, "before the big change");
        session.flush().await;
    }

    #[tokio::test]
    async fn test_write_note_failure_is_inline() {
        let (backend, session) = session();
        with_history(&backend);
        session.open_work_file("/x/work.clip").await.unwrap();
        session.flush().await;
        backend.fail_writes(true);

        assert!(session.write_note("/x/work.zip", "memo").await.is_err());
        assert!(session.history().error().is_some());
        assert_eq!(session.tabs().len(), 1);
        session.flush().await;
    }

    #[tokio::test]
    async fn test_plan_backup_unpins_vanished_target() {
        let (backend, session) = session();
        with_history(&backend);
        session.open_work_file("/x/work.clip").await.unwrap();
        session.set_backup_dir("/x");
        session.select_target_dir("/x/base1_a").await;

        backend.add_dir("/x/base1_a");
        assert_eq!(session.plan_backup().await.unwrap().target_dir, "/x/base1_a");

        backend.remove_dir("/x/base1_a");
        let plan = session.plan_backup().await.unwrap();
        assert_eq!(plan.target_dir, "/x");
        assert!(session.active_tab().unwrap().selected_target_dir.is_empty());
        session.flush().await;
    }

    #[tokio::test]
    async fn test_user_input_errors_do_not_mutate() {
        let (_, session) = session();
        let before = session.snapshot();

        assert!(matches!(session.plan_backup().await, Err(SessionError::NoFileSelected)));
        assert!(session.plan_restore(&[]).unwrap_err().is_user_input());
        assert_eq!(session.snapshot(), before);
    }

    #[tokio::test]
    async fn test_remove_recent_file_requests_save() {
        let (backend, session) = session();
        session.add_to_recent_files("/a.clip");
        session.flush().await;
        let writes = backend.write_count();

        assert!(session.remove_recent_file("/a.clip"));
        assert!(!session.remove_recent_file("/a.clip"));
        session.flush().await;

        assert_eq!(backend.write_count(), writes + 1);
        assert!(backend.stored_recent_files().is_empty());
    }
}
