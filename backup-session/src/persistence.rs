//! Session snapshot persistence.
//!
//! The whole tab list and recent-file list are written as one JSON document
//! to `<config dir>/session.json`. Persistence is best effort: every failure
//! is logged and treated as "nothing saved" or "nothing to restore". Both
//! directions are skipped when the user turned "restore previous state" off.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::backend::{Backend, Preference};
use crate::tab::Tab;
use crate::Result;

pub const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(default)]
    pub tabs: Vec<Tab>,
    /// Absent in documents that never carried the list; the recent-file
    /// store is then left as it is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_files: Option<Vec<String>>,
}

pub struct SessionPersistence {
    backend: Arc<dyn Backend>,
    file_name: String,
}

impl SessionPersistence {
    pub fn new(backend: Arc<dyn Backend>, file_name: impl Into<String>) -> Self {
        Self {
            backend,
            file_name: file_name.into(),
        }
    }

    async fn enabled(&self) -> bool {
        self.backend
            .boolean_preference(Preference::RestorePreviousState)
            .await
    }

    async fn session_path(&self) -> Result<String> {
        let dir = self.backend.config_dir().await?;
        Ok(dir.join(&self.file_name).to_string_lossy().into_owned())
    }

    /// Write `snapshot`. Returns whether a document was written.
    pub async fn save(&self, snapshot: &SessionSnapshot) -> bool {
        if !self.enabled().await {
            tracing::debug!("Session restore disabled, skipping save");
            return false;
        }
        match self.try_save(snapshot).await {
            Ok(path) => {
                tracing::debug!("Saved session ({} tabs) to {}", snapshot.tabs.len(), path);
                true
            }
            Err(e) => {
                tracing::warn!("Save session failed: {}", e);
                false
            }
        }
    }

    async fn try_save(&self, snapshot: &SessionSnapshot) -> Result<String> {
        let path = self.session_path().await?;
        let data = serde_json::to_string_pretty(snapshot)?;
        self.backend.write_text(&path, &data).await?;
        Ok(path)
    }

    /// Read the last saved snapshot. `None` covers a disabled preference, a
    /// missing or empty document and a document that does not parse.
    pub async fn restore(&self) -> Option<SessionSnapshot> {
        if !self.enabled().await {
            tracing::debug!("Session restore disabled");
            return None;
        }
        match self.try_restore().await {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                tracing::info!("No session to restore");
                None
            }
            Err(e) => {
                tracing::info!("No session to restore: {}", e);
                None
            }
        }
    }

    async fn try_restore(&self) -> Result<Option<SessionSnapshot>> {
        let path = self.session_path().await?;
        let content = self.backend.read_text(&path).await?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }
}

/// Keeps the handles of fire-and-forget saves so shutdown can wait for them.
#[derive(Clone, Default)]
pub struct SaveTracker {
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spawned save, dropping handles of saves already finished.
    pub fn track(&self, handle: JoinHandle<()>) {
        let mut pending = self.pending.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Number of saves not yet finished.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait until every tracked save has completed.
    pub async fn flush(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.pending.lock());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!("Session save task failed: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::config::TabDefaults;
    use crate::tab::{BackupMode, TabId};

    fn snapshot() -> SessionSnapshot {
        let mut tab = Tab::new(TabId(100), &TabDefaults::default());
        tab.active = true;
        tab.work_file = "/art/cover.clip".into();
        tab.work_file_size = 4096;
        tab.selected_target_dir = "/art/cg_backup_cover/base2_20250101_120000".into();
        tab.backup_mode = BackupMode::Archive;
        tab.search_query = "final".into();
        let other = Tab::new(TabId(101), &TabDefaults::default());
        SessionSnapshot {
            tabs: vec![tab, other],
            recent_files: Some(vec!["/art/cover.clip".into(), "/art/old.psd".into()]),
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let backend = Arc::new(MemoryBackend::new());
        let persistence = SessionPersistence::new(backend.clone(), SESSION_FILE_NAME);

        assert!(persistence.save(&snapshot()).await);
        assert!(backend.text("/config/session.json").is_some());
        assert_eq!(persistence.restore().await, Some(snapshot()));
    }

    #[tokio::test]
    async fn test_disabled_preference_skips_both_directions() {
        let backend = Arc::new(MemoryBackend::new());
        let persistence = SessionPersistence::new(backend.clone(), SESSION_FILE_NAME);
        persistence.save(&snapshot()).await;

        backend.set_preference(Preference::RestorePreviousState, false);
        assert!(!persistence.save(&SessionSnapshot::default()).await);
        assert_eq!(backend.write_count(), 1);
        assert_eq!(persistence.restore().await, None);
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_document() {
        let backend = Arc::new(MemoryBackend::new());
        let persistence = SessionPersistence::new(backend.clone(), SESSION_FILE_NAME);
        assert_eq!(persistence.restore().await, None);

        backend.set_text("/config/session.json", "{ not json");
        assert_eq!(persistence.restore().await, None);
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_writes(true);
        let persistence = SessionPersistence::new(backend.clone(), SESSION_FILE_NAME);

        assert!(!persistence.save(&snapshot()).await);
    }

    #[tokio::test]
    async fn test_reads_document_with_missing_fields() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_text(
            "/config/session.json",
            r#"{"tabs": [{"id": 5, "workFile": "/a.clip", "active": true, "backupMode": "copy"}]}"#,
        );
        let persistence = SessionPersistence::new(backend.clone(), SESSION_FILE_NAME);

        let restored = persistence.restore().await.unwrap();
        assert_eq!(restored.tabs.len(), 1);
        assert_eq!(restored.tabs[0].backup_mode, BackupMode::Copy);
        assert_eq!(restored.tabs[0].diff_algo, "hdiff");
        assert_eq!(restored.recent_files, None);
    }

    #[tokio::test]
    async fn test_flush_waits_for_tracked_saves() {
        let backend = Arc::new(MemoryBackend::new());
        let persistence = Arc::new(SessionPersistence::new(backend.clone(), SESSION_FILE_NAME));
        let tracker = SaveTracker::new();

        for _ in 0..3 {
            let persistence = persistence.clone();
            tracker.track(tokio::spawn(async move {
                persistence.save(&snapshot()).await;
            }));
        }
        tracker.flush().await;

        assert_eq!(tracker.pending_count(), 0);
        assert_eq!(backend.write_count(), 3);
    }
}
