//! Backup Session Library
//!
//! State layer of the desktop backup utility: open work-file tabs, the
//! recent-file list, session persistence and reconciliation of backup
//! history against the chosen write target.

pub mod backend;
pub mod config;
pub mod events;
pub mod history;
pub mod persistence;
pub mod plan;
pub mod recent;
pub mod reorder;
pub mod session;
pub mod store;
pub mod tab;
pub mod utils;

// Re-export commonly used types
pub use backend::{Backend, BackupEntry, MemoryBackend, Preference};
pub use config::{Config, DisplayStrings};
pub use events::SessionEvent;
pub use history::{HistoryListing, HistoryView, ReconciledEntry};
pub use session::{Refresh, Session};
pub use tab::{BackupMode, Tab, TabId};
pub use utils::errors::{Result, SessionError};
