//! Tab records: one backup workflow context each.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::TabDefaults;

/// Opaque tab identifier. Derived from the wall clock at creation time and
/// kept strictly increasing within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a backup of the work file is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMode {
    /// Plain timestamped copy
    Copy,
    /// Compressed archive (zip or tar.gz)
    Archive,
    /// Binary diff against the current generation's base
    #[default]
    Diff,
}

impl BackupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupMode::Copy => "copy",
            BackupMode::Archive => "archive",
            BackupMode::Diff => "diff",
        }
    }
}

impl fmt::Display for BackupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "copy" => Ok(BackupMode::Copy),
            "archive" => Ok(BackupMode::Archive),
            "diff" => Ok(BackupMode::Diff),
            other => Err(format!("unknown backup mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,

    /// Work file path, empty when none is selected
    #[serde(default)]
    pub work_file: String,

    /// Work file size in bytes, 0 if unknown
    #[serde(default)]
    pub work_file_size: u64,

    /// Manually chosen backup root, empty for the backend default
    #[serde(default)]
    pub backup_dir: String,

    /// Generation directory the user pinned as the write target
    #[serde(default)]
    pub selected_target_dir: String,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub backup_mode: BackupMode,

    #[serde(default = "default_compress_mode")]
    pub compress_mode: String,

    #[serde(default = "default_diff_algo")]
    pub diff_algo: String,

    #[serde(default = "default_archive_format")]
    pub archive_format: String,

    #[serde(default)]
    pub search_query: String,
}

fn default_compress_mode() -> String {
    TabDefaults::default().compress_mode
}

fn default_diff_algo() -> String {
    TabDefaults::default().diff_algo
}

fn default_archive_format() -> String {
    TabDefaults::default().archive_format
}

impl Tab {
    /// A fresh, inactive tab with the given defaults.
    pub fn new(id: TabId, defaults: &TabDefaults) -> Self {
        Self {
            id,
            work_file: String::new(),
            work_file_size: 0,
            backup_dir: String::new(),
            selected_target_dir: String::new(),
            active: false,
            backup_mode: defaults.backup_mode,
            compress_mode: defaults.compress_mode.clone(),
            diff_algo: defaults.diff_algo.clone(),
            archive_format: defaults.archive_format.clone(),
            search_query: String::new(),
        }
    }

    pub fn has_work_file(&self) -> bool {
        !self.work_file.is_empty()
    }

    /// File name component of the work file, accepting either separator.
    pub fn work_file_name(&self) -> Option<&str> {
        if self.work_file.is_empty() {
            return None;
        }
        self.work_file.rsplit(['/', '\\']).next()
    }
}
