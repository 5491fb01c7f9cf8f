//! The backend collaborator: everything that touches disk or native settings.
//!
//! The session layer never performs I/O itself; it asks a [`Backend`] and
//! decides what to do with the answer.

mod memory;

pub use memory::MemoryBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::Result;

/// One backup artifact reported for a work file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
    /// Local modification time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    /// 0 for full archives and copies, otherwise the generation folder index
    pub generation: u32,
}

/// Boolean user preferences the session layer consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preference {
    /// Persist tabs between runs and restore them at startup
    RestorePreviousState,
    AlwaysOnTop,
    TrayMode,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Size of a regular file. Directories and unreadable paths are errors.
    async fn file_size(&self, path: &str) -> Result<u64>;

    async fn directory_exists(&self, path: &str) -> bool;

    /// Every backup artifact for `work_file` under `backup_dir`, or under the
    /// default root when `backup_dir` is empty. Unordered.
    async fn list_backups(&self, work_file: &str, backup_dir: &str) -> Result<Vec<BackupEntry>>;

    /// Read a small text resource. A missing resource reads as "".
    async fn read_text(&self, path: &str) -> Result<String>;

    async fn write_text(&self, path: &str, text: &str) -> Result<()>;

    async fn config_dir(&self) -> Result<PathBuf>;

    async fn boolean_preference(&self, preference: Preference) -> bool;

    /// Recent files live in their own store so they survive with session
    /// restore turned off.
    async fn load_recent_files(&self) -> Result<Vec<String>>;

    async fn store_recent_files(&self, paths: &[String]) -> Result<()>;
}
