//! Plain-text rendering of the session for the terminal.

use backup_session::history::{HistoryPanel, HistoryView, ReconciledEntry};
use backup_session::{DisplayStrings, Tab};
use std::fmt;

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Human-readable size in 1024 steps, at most two decimals, trailing zeros
/// dropped ("1.5 KB", "1 MB").
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut size = bytes as f64;
    let mut unit_index = 0;
    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    let mut number = format!("{size:.2}");
    if number.contains('.') {
        let trimmed = number.trim_end_matches('0').trim_end_matches('.').len();
        number.truncate(trimmed);
    }
    format!("{} {}", number, UNITS[unit_index])
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// The tab strip, active tab marked with `*`.
pub struct TabsView<'a> {
    pub tabs: &'a [Tab],
    pub strings: &'a DisplayStrings,
}

impl fmt::Display for TabsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tab in self.tabs {
            let marker = if tab.active { '*' } else { ' ' };
            let label = match tab.work_file_name() {
                Some(name) => format!("{} [{}]", name, format_size(tab.work_file_size)),
                None => self.strings.no_file_selected.clone(),
            };
            writeln!(f, "{} {:>15}  {}  ({})", marker, tab.id.to_string(), label, tab.backup_mode)?;
        }
        Ok(())
    }
}

pub struct RecentView<'a> {
    pub paths: &'a [String],
    pub strings: &'a DisplayStrings,
}

impl fmt::Display for RecentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.strings.recent_files_title)?;
        if self.paths.is_empty() {
            return writeln!(f, "  {}", self.strings.no_recent_files);
        }
        for path in self.paths {
            writeln!(f, "  {:<24} {}", file_name(path), path)?;
        }
        Ok(())
    }
}

/// The history panel: inline error, then the listing or its empty state.
pub struct HistoryRender<'a> {
    pub panel: &'a HistoryPanel,
    pub strings: &'a DisplayStrings,
}

impl HistoryRender<'_> {
    fn entry(&self, f: &mut fmt::Formatter<'_>, entry: &ReconciledEntry) -> fmt::Result {
        let strings = self.strings;
        let (badge, status) = if entry.is_archive {
            (format!("[{}]", strings.archive_badge), &strings.full_archive)
        } else if entry.is_target {
            (
                format!(
                    "[{}.{} ({})]",
                    strings.generation_label,
                    entry.display_generation(),
                    strings.target_label
                ),
                &strings.compatible,
            )
        } else {
            (
                format!("[{}.{}]", strings.generation_label, entry.display_generation()),
                &strings.gen_mismatch,
            )
        };
        let marker = if entry.is_target { '>' } else { ' ' };

        writeln!(
            f,
            "{} {} {} ({})  {}",
            marker,
            entry.file_name,
            badge,
            format_size(entry.file_size),
            entry.timestamp
        )?;
        writeln!(f, "    {}  {}", status, entry.file_path)?;
        if !entry.note.is_empty() {
            writeln!(f, "    {}: {}", strings.backup_memo, entry.note)?;
        }
        Ok(())
    }
}

impl fmt::Display for HistoryRender<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strings = self.strings;
        if let Some(error) = self.panel.error() {
            writeln!(f, "{}: {}", strings.history_error, error)?;
        }
        match self.panel.view() {
            None | Some(HistoryView::NoFileSelected) => writeln!(f, "{}", strings.select_file_first),
            Some(HistoryView::NoHistory) => writeln!(f, "{}", strings.no_history),
            Some(HistoryView::Listing(listing)) => {
                writeln!(
                    f,
                    "{}: {}{}  ({}.{} {})",
                    strings.target_label,
                    listing.active_directory,
                    if listing.inferred { " (auto)" } else { "" },
                    strings.generation_label,
                    listing.latest_generation.max(1),
                    strings.latest_label
                )?;
                for entry in &listing.entries {
                    self.entry(f, entry)?;
                }
                Ok(())
            }
        }
    }
}
