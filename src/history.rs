use std::cell::RefCell;

use tracing::debug;
use url::Url;

/// How an entry reached the session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// In-place navigation: the document was mutated without a reload.
    Push,
    /// Full-document load, the fallback path.
    Load,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: Url,
    pub transition: Transition,
}

/// Session history. Forward-only: this engine carries no back/forward
/// restoration and no serialized state payloads.
#[derive(Default)]
pub struct History {
    entries: RefCell<Vec<HistoryEntry>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an in-place navigation, the `history.pushState` equivalent.
    pub fn push(&self, url: Url) {
        self.record(url, Transition::Push);
    }

    /// Record a full-document load, the `location.assign` equivalent.
    pub fn assign(&self, url: Url) {
        self.record(url, Transition::Load);
    }

    fn record(&self, url: Url, transition: Transition) {
        debug!(target: "history", url = %url, ?transition, "recorded entry");
        self.entries.borrow_mut().push(HistoryEntry { url, transition });
    }

    pub fn current(&self) -> Option<HistoryEntry> {
        self.entries.borrow().last().cloned()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
