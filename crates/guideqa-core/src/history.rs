//! Durable, capped log of past question/answer interactions.

use crate::capped::CappedLog;
use crate::store::KeyValueStore;
use guideqa_types::{FeedbackSnapshot, HistoryItem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Durable storage key for the history sequence.
pub const HISTORY_KEY: &str = "guideqa.history.v1";

/// Maximum number of interactions retained.
pub const HISTORY_CAP: usize = 50;

/// What `patch_feedback` does when neither id nor question matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchFallback {
    /// Patch the newest item in the log.
    #[default]
    MostRecent,
    /// Leave the log untouched and report the miss.
    ReportMiss,
}

/// Which item `patch_feedback` patched, and how it was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    ById(Uuid),
    ByQuestion(Uuid),
    MostRecent(Uuid),
    NotFound,
}

impl PatchOutcome {
    pub fn patched_id(&self) -> Option<Uuid> {
        match self {
            PatchOutcome::ById(id)
            | PatchOutcome::ByQuestion(id)
            | PatchOutcome::MostRecent(id) => Some(*id),
            PatchOutcome::NotFound => None,
        }
    }
}

/// Newest-first interaction history over a durable store.
pub struct HistoryLog {
    store: Arc<dyn KeyValueStore>,
    cap: usize,
}

impl HistoryLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cap: HISTORY_CAP,
        }
    }

    /// Override the retention cap.
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    fn read(&self) -> CappedLog<HistoryItem> {
        CappedLog::parse(self.store.get(HISTORY_KEY).as_deref(), self.cap)
    }

    fn write(&self, log: &CappedLog<HistoryItem>) {
        match log.to_json() {
            Ok(json) => self.store.set(HISTORY_KEY, &json),
            Err(e) => warn!(target: "guideqa::history", "Failed to serialize history: {}", e),
        }
    }

    /// All retained interactions, newest first. Malformed storage reads as empty.
    pub fn load(&self) -> Vec<HistoryItem> {
        self.read().into_vec()
    }

    /// A single interaction by id.
    pub fn get(&self, id: Uuid) -> Option<HistoryItem> {
        self.read().iter().find(|item| item.id == id).cloned()
    }

    /// Record an interaction as the newest entry.
    pub fn add(&self, mut item: HistoryItem) {
        item.normalize();
        let id = item.id;

        let mut log = self.read();
        let evicted = log.push_newest(item);
        if evicted > 0 {
            debug!(target: "guideqa::history", "Evicted {} oldest history items", evicted);
        }
        self.write(&log);
        debug!(target: "guideqa::history", "Added history item {}", id);
    }

    /// Delete one interaction. Returns false when the id was not present.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut log = self.read();
        let before = log.len();
        log.retain(|item| item.id != id);

        if log.len() == before {
            return false;
        }
        self.write(&log);
        true
    }

    /// Delete the whole history.
    pub fn clear(&self) {
        self.store.remove(HISTORY_KEY);
        info!(target: "guideqa::history", "Cleared history");
    }

    /// Copy feedback onto the matching interaction.
    ///
    /// Lookup order: `id`, then exact `question` equality (newest match), then
    /// whatever `fallback` says.
    pub fn patch_feedback(
        &self,
        id: Option<Uuid>,
        feedback: FeedbackSnapshot,
        question: &str,
        fallback: PatchFallback,
    ) -> PatchOutcome {
        let mut log = self.read();

        let by_id = id.and_then(|id| log.iter().find(|item| item.id == id));
        let patched = if let Some(item) = by_id {
            PatchOutcome::ById(item.id)
        } else if let Some(item) = log.iter().find(|item| item.question == question) {
            PatchOutcome::ByQuestion(item.id)
        } else {
            match (fallback, log.front()) {
                (PatchFallback::MostRecent, Some(item)) => PatchOutcome::MostRecent(item.id),
                _ => PatchOutcome::NotFound,
            }
        };

        let Some(target) = patched.patched_id() else {
            debug!(target: "guideqa::history", "No history item matches feedback");
            return PatchOutcome::NotFound;
        };
        if let Some(item) = log.iter_mut().find(|item| item.id == target) {
            item.feedback = Some(feedback);
        }

        self.write(&log);
        debug!(target: "guideqa::history", "Patched feedback: {:?}", patched);
        patched
    }
}
