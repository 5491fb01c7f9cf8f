//! Configuration for the session layer.
//!
//! Loaded from a TOML file. Every field carries a default so a partial file is
//! enough; display strings are resolved once here instead of being patched in
//! at each call site.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::tab::BackupMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub tab_defaults: TabDefaults,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub strings: DisplayStrings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// File name of the session document inside the config directory
    #[serde(default = "default_session_file")]
    pub file_name: String,

    /// Maximum number of recent files kept
    #[serde(default = "default_max_recent")]
    pub max_recent_files: usize,
}

/// Settings applied to every freshly added tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabDefaults {
    #[serde(default)]
    pub backup_mode: BackupMode,

    /// Compression used by hdiff (zstd, lzma, none)
    #[serde(default = "default_compress_mode")]
    pub compress_mode: String,

    /// Diff algorithm (hdiff, bsdiff)
    #[serde(default = "default_diff_algo")]
    pub diff_algo: String,

    /// Archive format (zip, zip-pass, tar.gz)
    #[serde(default = "default_archive_format")]
    pub archive_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Every user-facing string the session layer hands to the presentation side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayStrings {
    pub select_file_first: String,
    pub no_history: String,
    pub history_error: String,
    pub full_archive: String,
    pub archive_badge: String,
    pub compatible: String,
    pub gen_mismatch: String,
    pub generation_label: String,
    pub target_label: String,
    /// Suffix of the newest generation number in the listing header
    pub latest_label: String,
    pub backup_memo: String,
    pub recent_files_title: String,
    pub no_recent_files: String,
    pub no_file_selected: String,
    pub updated_work_file: String,
    pub memo_saved: String,
    pub memo_save_error: String,
    pub restore_confirm: String,
    pub nothing_to_restore: String,
}

impl Default for DisplayStrings {
    fn default() -> Self {
        Self {
            select_file_first: "Please select a work file first.".into(),
            no_history: "No backup history.".into(),
            history_error: "Error loading history".into(),
            full_archive: "Full Archive".into(),
            archive_badge: "Archive".into(),
            compatible: "Write target (Active)".into(),
            gen_mismatch: "Other generation (select to switch)".into(),
            generation_label: "Gen".into(),
            target_label: "Target".into(),
            latest_label: "latest".into(),
            backup_memo: "Memo".into(),
            recent_files_title: "RECENT FILES".into(),
            no_recent_files: "No recent files".into(),
            no_file_selected: "No File Selected".into(),
            updated_work_file: "Work file updated.".into(),
            memo_saved: "Memo saved.".into(),
            memo_save_error: "Failed to save memo.".into(),
            restore_confirm: "Restore the selected backups?".into(),
            nothing_to_restore: "Select at least one backup to restore.".into(),
        }
    }
}

// Default values
fn default_session_file() -> String {
    crate::persistence::SESSION_FILE_NAME.to_string()
}

fn default_max_recent() -> usize {
    crate::recent::MAX_RECENT_COUNT
}

fn default_compress_mode() -> String {
    "zstd".to_string()
}

fn default_diff_algo() -> String {
    "hdiff".to_string()
}

fn default_archive_format() -> String {
    "zip".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file_name: default_session_file(),
            max_recent_files: default_max_recent(),
        }
    }
}

impl Default for TabDefaults {
    fn default() -> Self {
        Self {
            backup_mode: BackupMode::default(),
            compress_mode: default_compress_mode(),
            diff_algo: default_diff_algo(),
            archive_format: default_archive_format(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.session.file_name.trim().is_empty() {
            anyhow::bail!("session.file_name must not be empty");
        }
        if self.session.max_recent_files == 0 {
            anyhow::bail!("session.max_recent_files must be at least 1");
        }
        Ok(())
    }
}
