//! What the backend is asked to do when the user runs a backup or restore.

use serde::Serialize;

use crate::tab::{BackupMode, Tab};
use crate::{Result, SessionError};

/// A backup request resolved from the active tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPlan {
    pub work_file: String,
    /// Directory to write into; empty lets the backend use its default root
    pub target_dir: String,
    pub mode: BackupMode,
    pub compress_mode: String,
    pub diff_algo: String,
    pub archive_format: String,
}

impl BackupPlan {
    /// Build the plan for `tab`. Diff backups go to the pinned generation when
    /// there is one, everything else to the backup root.
    pub fn for_tab(tab: &Tab) -> Result<Self> {
        if !tab.has_work_file() {
            return Err(SessionError::NoFileSelected);
        }
        let target_dir = match tab.backup_mode {
            BackupMode::Diff if !tab.selected_target_dir.is_empty() => {
                tab.selected_target_dir.clone()
            }
            _ => tab.backup_dir.clone(),
        };
        Ok(Self {
            work_file: tab.work_file.clone(),
            target_dir,
            mode: tab.backup_mode,
            compress_mode: tab.compress_mode.clone(),
            diff_algo: tab.diff_algo.clone(),
            archive_format: tab.archive_format.clone(),
        })
    }
}

/// How a selected backup file is brought back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RestoreKind {
    /// Patch applied onto the work file
    Diff,
    Zip,
    TarGz,
    /// Plain copy of a full backup
    Copy,
}

impl RestoreKind {
    pub fn for_path(path: &str) -> Self {
        let lower = path.to_lowercase();
        if lower.ends_with(".diff") {
            RestoreKind::Diff
        } else if lower.ends_with(".zip") {
            RestoreKind::Zip
        } else if lower.ends_with(".tar.gz") {
            RestoreKind::TarGz
        } else {
            RestoreKind::Copy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreStep {
    pub source: String,
    pub kind: RestoreKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePlan {
    pub work_file: String,
    pub steps: Vec<RestoreStep>,
}

impl RestorePlan {
    /// Steps run in the order the sources were selected.
    pub fn for_tab(tab: &Tab, sources: &[String]) -> Result<Self> {
        if !tab.has_work_file() {
            return Err(SessionError::NoFileSelected);
        }
        if sources.is_empty() {
            return Err(SessionError::NothingToRestore);
        }
        let steps = sources
            .iter()
            .map(|source| RestoreStep {
                source: source.clone(),
                kind: RestoreKind::for_path(source),
            })
            .collect();
        Ok(Self {
            work_file: tab.work_file.clone(),
            steps,
        })
    }
}
