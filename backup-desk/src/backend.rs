//! Filesystem implementation of the session backend.
//!
//! Backup layout under the root (`<dir of work file>/cg_backup_<stem>` unless
//! the tab names another one):
//!
//! ```text
//! cg_backup_cover/
//!   cover_20250101_120000.clip     full copy      (generation 0)
//!   cover_20250101_120500.zip      archive        (generation 0)
//!   base1_20250101_120000/
//!     cover.clip.base              generation base (skipped)
//!     cover_20250101_121000.diff   diff           (generation 1)
//!   base2_20250102_090000/
//!     ...
//! ```

use async_trait::async_trait;
use backup_session::backend::{Backend, BackupEntry, Preference};
use backup_session::{Result, SessionError};
use chrono::{DateTime, Local};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::AppConfig;

const RECENT_FILES_NAME: &str = "recent_files.json";
const GENERATION_PREFIX: &str = "base";
const BASE_SUFFIX: &str = ".base";
const CHECKSUM_FILE: &str = "checksum.json";
const BACKUP_EXTENSIONS: &[&str] = &[".diff", ".zip", ".tar.gz", ".tar", ".gz"];

pub struct LocalBackend {
    config_dir: PathBuf,
    preferences: AppConfig,
}

impl LocalBackend {
    pub fn new(config_dir: PathBuf, preferences: AppConfig) -> Self {
        Self {
            config_dir,
            preferences,
        }
    }

    fn recent_files_path(&self) -> PathBuf {
        self.config_dir.join(RECENT_FILES_NAME)
    }
}

/// Default backup root for a work file.
pub fn default_backup_dir(work_file: &Path) -> PathBuf {
    let dir = work_file.parent().unwrap_or_else(|| Path::new("."));
    let stem = work_file
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    dir.join(format!("cg_backup_{stem}"))
}

/// Generation index of a `base<N>_<timestamp>` folder name.
fn generation_of(dir_name: &str) -> Option<u32> {
    dir_name
        .strip_prefix(GENERATION_PREFIX)?
        .split('_')
        .next()?
        .parse()
        .ok()
}

/// Scan `root` for backups of `work_file`. A missing root has no backups;
/// an unreadable root is an error.
pub fn scan_backups(work_file: &Path, root: &Path) -> std::io::Result<Vec<BackupEntry>> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    std::fs::read_dir(root)?;

    let stem = work_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let own_ext = work_file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()));
    let accepted = |name: &str| {
        BACKUP_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
            || own_ext.as_deref().is_some_and(|ext| name.ends_with(ext))
    };

    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(2) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable backup entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }

        let generation = if entry.depth() == 1 {
            0
        } else {
            let parent = entry
                .path()
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !parent.starts_with(GENERATION_PREFIX) {
                continue;
            }
            generation_of(&parent).unwrap_or(0)
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(BASE_SUFFIX) || name == CHECKSUM_FILE {
            continue;
        }
        let lower = name.to_lowercase();
        if !lower.contains(&stem) || !accepted(&lower) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let modified: DateTime<Local> = metadata
            .modified()
            .unwrap_or_else(|_| std::time::SystemTime::now())
            .into();

        entries.push(BackupEntry {
            file_name: name,
            file_path: entry.path().to_string_lossy().into_owned(),
            file_size: metadata.len(),
            timestamp: modified.format("%Y-%m-%d %H:%M:%S").to_string(),
            generation,
        });
    }

    Ok(entries)
}

fn map_io(path: &str, e: std::io::Error) -> SessionError {
    match e.kind() {
        ErrorKind::NotFound => SessionError::FileNotFound(path.to_string()),
        _ => SessionError::Io(e),
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn file_size(&self, path: &str) -> Result<u64> {
        if path.is_empty() {
            return Err(SessionError::FileNotFound(String::new()));
        }
        let metadata = tokio::fs::metadata(path).await.map_err(|e| map_io(path, e))?;
        if metadata.is_dir() {
            return Err(SessionError::NotAFile(path.to_string()));
        }
        Ok(metadata.len())
    }

    async fn directory_exists(&self, path: &str) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn list_backups(&self, work_file: &str, backup_dir: &str) -> Result<Vec<BackupEntry>> {
        let work_file = PathBuf::from(work_file);
        let root = if backup_dir.is_empty() {
            default_backup_dir(&work_file)
        } else {
            PathBuf::from(backup_dir)
        };
        tracing::debug!("Listing backups of {} in {}", work_file.display(), root.display());

        let entries = tokio::task::spawn_blocking(move || scan_backups(&work_file, &root))
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))??;
        Ok(entries)
    }

    async fn read_text(&self, path: &str) -> Result<String> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(SessionError::Io(e)),
        }
    }

    async fn write_text(&self, path: &str, text: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, text).await?;
        Ok(())
    }

    async fn config_dir(&self) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.config_dir).await?;
        Ok(self.config_dir.clone())
    }

    async fn boolean_preference(&self, preference: Preference) -> bool {
        match preference {
            Preference::RestorePreviousState => self.preferences.restore_previous_state,
            Preference::AlwaysOnTop => self.preferences.always_on_top,
            Preference::TrayMode => self.preferences.tray_mode,
        }
    }

    async fn load_recent_files(&self) -> Result<Vec<String>> {
        let path = self.recent_files_path();
        let content = self.read_text(&path.to_string_lossy()).await?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn store_recent_files(&self, paths: &[String]) -> Result<()> {
        let data = serde_json::to_string(paths)?;
        let path = self.recent_files_path();
        self.write_text(&path.to_string_lossy(), &data).await
    }
}
