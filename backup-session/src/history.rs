//! Backup history reconciliation.
//!
//! Turns the backend's raw listing for a tab's work file into the list the
//! history view shows: sorted by file name (newest timestamped names first),
//! classified into full archives and generation artifacts, flagged against
//! the active write target, annotated with sidecar notes, and filtered by the
//! tab's search query.
//!
//! The active target is the tab's pinned `selected_target_dir` when set,
//! otherwise the directory of the first sorted entry. The inferred value is
//! for display only and is never written back to the tab.

use futures_util::future::join_all;
use serde::Serialize;

use crate::backend::{Backend, BackupEntry};
use crate::tab::{Tab, TabId};
use crate::Result;

const NOTE_SUFFIX: &str = ".note";
const DIFF_SUFFIX: &str = ".diff";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledEntry {
    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
    pub timestamp: String,
    pub generation: u32,
    /// Parent directory of `file_path`
    pub directory: String,
    pub is_archive: bool,
    /// The entry lives in the active target directory. Never set on archives.
    pub is_target: bool,
    /// Sidecar note, empty when there is none or it could not be read
    pub note: String,
}

impl ReconciledEntry {
    /// Generation number shown on the badge of a diff entry.
    pub fn display_generation(&self) -> u32 {
        self.generation.max(1)
    }

    /// Whether choosing this entry's badge would move the write target.
    pub fn can_become_target(&self) -> bool {
        !self.is_archive && !self.is_target
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryListing {
    pub active_directory: String,
    /// `active_directory` was derived from the listing, not pinned by the user
    pub inferred: bool,
    /// Highest generation present in the unfiltered listing
    pub latest_generation: u32,
    /// Entries left after the search filter, in display order
    pub entries: Vec<ReconciledEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum HistoryView {
    NoFileSelected,
    NoHistory,
    Listing(HistoryListing),
}

impl HistoryView {
    pub fn entries(&self) -> &[ReconciledEntry] {
        match self {
            HistoryView::Listing(listing) => &listing.entries,
            _ => &[],
        }
    }
}

/// Directory part of a path, accepting `/` and `\`. Empty for a bare name.
pub fn parent_directory(path: &str) -> &str {
    path.rfind(['/', '\\']).map(|i| &path[..i]).unwrap_or("")
}

pub fn note_path(file_path: &str) -> String {
    format!("{file_path}{NOTE_SUFFIX}")
}

/// Full archives are generation 0 and not `.diff` files.
pub fn is_archive(entry: &BackupEntry) -> bool {
    !entry.file_name.to_lowercase().ends_with(DIFF_SUFFIX) && entry.generation == 0
}

/// Descending by file name. Stable, so equal names keep listing order.
pub fn sort_entries(entries: &mut [BackupEntry]) {
    entries.sort_by(|a, b| b.file_name.cmp(&a.file_name));
}

/// The pinned target if any, else the directory of the first sorted entry.
/// The flag reports whether the result was inferred.
pub fn resolve_active_directory(tab: &Tab, sorted: &[BackupEntry]) -> (String, bool) {
    if !tab.selected_target_dir.is_empty() {
        return (tab.selected_target_dir.clone(), false);
    }
    let inferred = sorted
        .first()
        .map(|e| parent_directory(&e.file_path).to_string())
        .unwrap_or_default();
    (inferred, true)
}

/// Case-insensitive substring match on the file name or the note. An empty
/// query matches everything.
pub fn matches_query(query: &str, file_name: &str, note: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    file_name.to_lowercase().contains(&query) || note.to_lowercase().contains(&query)
}

/// Read the sidecar note of a backup file. Any failure reads as "".
pub async fn load_note(backend: &dyn Backend, file_path: &str) -> String {
    match backend.read_text(&note_path(file_path)).await {
        Ok(note) => note.trim_end().to_string(),
        Err(e) => {
            tracing::debug!("No note for {}: {}", file_path, e);
            String::new()
        }
    }
}

/// Produce the history view for `tab`. Only a failed listing is an error;
/// note failures degrade to empty notes.
pub async fn reconcile(backend: &dyn Backend, tab: &Tab) -> Result<HistoryView> {
    if !tab.has_work_file() {
        return Ok(HistoryView::NoFileSelected);
    }

    let mut raw = backend.list_backups(&tab.work_file, &tab.backup_dir).await?;
    if raw.is_empty() {
        return Ok(HistoryView::NoHistory);
    }

    sort_entries(&mut raw);
    let (active_directory, inferred) = resolve_active_directory(tab, &raw);
    let latest_generation = raw.iter().map(|e| e.generation).max().unwrap_or(0);

    let notes = join_all(raw.iter().map(|e| load_note(backend, &e.file_path))).await;

    let entries = raw
        .into_iter()
        .zip(notes)
        .filter(|(entry, note)| matches_query(&tab.search_query, &entry.file_name, note))
        .map(|(entry, note)| annotate(entry, note, &active_directory))
        .collect();

    Ok(HistoryView::Listing(HistoryListing {
        active_directory,
        inferred,
        latest_generation,
        entries,
    }))
}

fn annotate(entry: BackupEntry, note: String, active_directory: &str) -> ReconciledEntry {
    let archive = is_archive(&entry);
    let directory = parent_directory(&entry.file_path).to_string();
    let is_target = !archive && directory == active_directory;
    ReconciledEntry {
        file_name: entry.file_name,
        file_path: entry.file_path,
        file_size: entry.file_size,
        timestamp: entry.timestamp,
        generation: entry.generation,
        directory,
        is_archive: archive,
        is_target,
        note,
    }
}

/// What the history view currently shows.
#[derive(Debug, Clone, Default)]
pub struct HistoryPanel {
    tab: Option<TabId>,
    view: Option<HistoryView>,
    error: Option<String>,
}

impl HistoryPanel {
    pub fn tab(&self) -> Option<TabId> {
        self.tab
    }

    pub fn view(&self) -> Option<&HistoryView> {
        self.view.as_ref()
    }

    /// Inline error from the last pass, shown above the retained list.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn show(&mut self, tab: TabId, view: HistoryView) {
        self.tab = Some(tab);
        self.view = Some(view);
        self.error = None;
    }

    /// Record a failed pass. The previously shown list stays in place.
    pub fn fail(&mut self, tab: TabId, message: String) {
        self.tab = Some(tab);
        self.error = Some(message);
    }

    /// Look up an entry of the current view by its file path.
    pub fn entry(&self, file_path: &str) -> Option<&ReconciledEntry> {
        self.view
            .as_ref()?
            .entries()
            .iter()
            .find(|e| e.file_path == file_path)
    }
}
