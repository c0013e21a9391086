//! Durable, capped log of feedback events.
//!
//! This log is the source of truth for feedback. History items only carry a
//! denormalized copy, reconciled at display time by [`crate::merge_feedback`].

use crate::capped::CappedLog;
use crate::store::KeyValueStore;
use guideqa_types::{FeedbackDraft, FeedbackEntry};
use std::sync::Arc;
use tracing::{debug, warn};

/// Durable storage key for the feedback sequence.
pub const FEEDBACK_KEY: &str = "guideqa.feedback.v1";

/// Maximum number of feedback entries retained.
pub const FEEDBACK_CAP: usize = 100;

/// Newest-first feedback log over a durable store.
pub struct FeedbackLog {
    store: Arc<dyn KeyValueStore>,
    cap: usize,
}

impl FeedbackLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cap: FEEDBACK_CAP,
        }
    }

    /// Override the retention cap.
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    fn read(&self) -> CappedLog<FeedbackEntry> {
        CappedLog::parse(self.store.get(FEEDBACK_KEY).as_deref(), self.cap)
    }

    /// All retained feedback, newest first. Malformed storage reads as empty.
    pub fn load(&self) -> Vec<FeedbackEntry> {
        self.read().into_vec()
    }

    /// Assign an id and timestamp, store as newest, and return the entry.
    pub fn record(&self, draft: FeedbackDraft) -> FeedbackEntry {
        let entry = draft.into_entry();

        let mut log = self.read();
        let evicted = log.push_newest(entry.clone());
        if evicted > 0 {
            debug!(target: "guideqa::feedback", "Evicted {} oldest feedback entries", evicted);
        }

        match log.to_json() {
            Ok(json) => self.store.set(FEEDBACK_KEY, &json),
            Err(e) => warn!(target: "guideqa::feedback", "Failed to serialize feedback: {}", e),
        }

        debug!(
            target: "guideqa::feedback",
            "Recorded {} feedback {} for history {:?}",
            entry.thumbs,
            entry.id,
            entry.history_id
        );
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use guideqa_types::Thumbs;
    use uuid::Uuid;

    fn create_test_log() -> (FeedbackLog, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (FeedbackLog::new(store.clone()), store)
    }

    #[test]
    fn test_record_assigns_id_and_timestamp() {
        let (log, _store) = create_test_log();
        let before = Utc::now();
        let entry = log.record(FeedbackDraft::new("q", Thumbs::Up));

        assert!(entry.timestamp >= before);
        assert_eq!(log.load(), vec![entry]);
    }

    #[test]
    fn test_record_keeps_caller_timestamp() {
        let (log, _store) = create_test_log();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let history_id = Uuid::new_v4();

        let entry = log.record(
            FeedbackDraft::new("q", Thumbs::Down)
                .with_history_id(history_id)
                .with_comment("missing dosage")
                .with_timestamp(ts),
        );

        assert_eq!(entry.timestamp, ts);
        assert_eq!(entry.history_id, Some(history_id));
        assert_eq!(entry.comment.as_deref(), Some("missing dosage"));
    }

    #[test]
    fn test_record_unique_ids_newest_first() {
        let (log, _store) = create_test_log();
        let first = log.record(FeedbackDraft::new("q", Thumbs::Up));
        let second = log.record(FeedbackDraft::new("q", Thumbs::Up));

        assert_ne!(first.id, second.id);
        let loaded = log.load();
        assert_eq!(loaded[0].id, second.id);
        assert_eq!(loaded[1].id, first.id);
    }

    #[test]
    fn test_record_caps_at_hundred() {
        let (log, _store) = create_test_log();
        let first = log.record(FeedbackDraft::new("first", Thumbs::Up));
        for i in 0..FEEDBACK_CAP {
            log.record(FeedbackDraft::new(format!("q{}", i), Thumbs::Down));
        }

        let loaded = log.load();
        assert_eq!(loaded.len(), FEEDBACK_CAP);
        assert!(!loaded.iter().any(|e| e.id == first.id));
    }

    #[test]
    fn test_malformed_storage_loads_empty() {
        let (log, store) = create_test_log();
        store.set(FEEDBACK_KEY, "null");
        assert!(log.load().is_empty());
    }
}
