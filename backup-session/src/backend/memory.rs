//! In-memory backend for tests and embedding.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use super::{Backend, BackupEntry, Preference};
use crate::{Result, SessionError};

/// Keeps files, directories, text resources and preferences in maps.
/// Failures can be switched on per operation.
pub struct MemoryBackend {
    config_dir: PathBuf,
    files: Mutex<HashMap<String, u64>>,
    dirs: Mutex<HashSet<String>>,
    texts: Mutex<HashMap<String, String>>,
    unreadable: Mutex<HashSet<String>>,
    listings: Mutex<HashMap<String, Vec<BackupEntry>>>,
    recent: Mutex<Vec<String>>,
    preferences: Mutex<HashMap<Preference, bool>>,
    listing_gate: Mutex<Option<Arc<Notify>>>,
    fail_listings: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let mut preferences = HashMap::new();
        preferences.insert(Preference::RestorePreviousState, true);
        Self {
            config_dir: PathBuf::from("/config"),
            files: Mutex::new(HashMap::new()),
            dirs: Mutex::new(HashSet::new()),
            texts: Mutex::new(HashMap::new()),
            unreadable: Mutex::new(HashSet::new()),
            listings: Mutex::new(HashMap::new()),
            recent: Mutex::new(Vec::new()),
            preferences: Mutex::new(preferences),
            listing_gate: Mutex::new(None),
            fail_listings: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn add_file(&self, path: &str, size: u64) {
        self.files.lock().insert(path.to_string(), size);
    }

    pub fn remove_file(&self, path: &str) {
        self.files.lock().remove(path);
    }

    pub fn add_dir(&self, path: &str) {
        self.dirs.lock().insert(path.to_string());
    }

    pub fn remove_dir(&self, path: &str) {
        self.dirs.lock().remove(path);
    }

    pub fn set_text(&self, path: &str, text: &str) {
        self.texts.lock().insert(path.to_string(), text.to_string());
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.texts.lock().get(path).cloned()
    }

    /// Reads of `path` fail until the backend is dropped.
    pub fn make_unreadable(&self, path: &str) {
        self.unreadable.lock().insert(path.to_string());
    }

    pub fn set_backups(&self, work_file: &str, entries: Vec<BackupEntry>) {
        self.listings.lock().insert(work_file.to_string(), entries);
    }

    pub fn set_preference(&self, preference: Preference, value: bool) {
        self.preferences.lock().insert(preference, value);
    }

    pub fn stored_recent_files(&self) -> Vec<String> {
        self.recent.lock().clone()
    }

    /// Park every `list_backups` call until the returned handle is notified.
    pub fn hold_listings(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.listing_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn fail_listings(&self, fail: bool) {
        self.fail_listings.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `write_text` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self, what: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SessionError::Backend(format!("write refused: {what}")));
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn file_size(&self, path: &str) -> Result<u64> {
        if self.dirs.lock().contains(path) {
            return Err(SessionError::NotAFile(path.to_string()));
        }
        self.files
            .lock()
            .get(path)
            .copied()
            .ok_or_else(|| SessionError::FileNotFound(path.to_string()))
    }

    async fn directory_exists(&self, path: &str) -> bool {
        self.dirs.lock().contains(path)
    }

    async fn list_backups(&self, work_file: &str, _backup_dir: &str) -> Result<Vec<BackupEntry>> {
        let gate = self.listing_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_listings.load(Ordering::SeqCst) {
            return Err(SessionError::Backend("permission denied".into()));
        }
        Ok(self.listings.lock().get(work_file).cloned().unwrap_or_default())
    }

    async fn read_text(&self, path: &str) -> Result<String> {
        if self.unreadable.lock().contains(path) {
            return Err(SessionError::Backend(format!("cannot read {path}")));
        }
        Ok(self.texts.lock().get(path).cloned().unwrap_or_default())
    }

    async fn write_text(&self, path: &str, text: &str) -> Result<()> {
        self.check_writable(path)?;
        self.texts.lock().insert(path.to_string(), text.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn config_dir(&self) -> Result<PathBuf> {
        Ok(self.config_dir.clone())
    }

    async fn boolean_preference(&self, preference: Preference) -> bool {
        self.preferences.lock().get(&preference).copied().unwrap_or(false)
    }

    async fn load_recent_files(&self) -> Result<Vec<String>> {
        Ok(self.recent.lock().clone())
    }

    async fn store_recent_files(&self, paths: &[String]) -> Result<()> {
        self.check_writable("recent files")?;
        *self.recent.lock() = paths.to_vec();
        Ok(())
    }
}
