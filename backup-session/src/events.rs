//! Change notifications for the presentation side.
//!
//! Every mutation of session state emits one [`SessionEvent`]. Views subscribe
//! and redraw what the event names; nothing in this crate calls into the view.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::tab::TabId;

const BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum SessionEvent {
    TabAdded { id: TabId },
    TabRemoved { id: TabId },
    TabSwitched { id: TabId },
    TabsReordered,
    /// A field of the tab changed (work file, target, mode, query, ...)
    TabUpdated { id: TabId },
    RecentFilesChanged,
    SessionRestored,
    /// A reconciliation pass finished and was shown, or failed inline
    HistoryUpdated { id: TabId },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Send to current subscribers. Having none is not an error.
    pub fn emit(&self, event: SessionEvent) {
        tracing::trace!(?event, "session event");
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
