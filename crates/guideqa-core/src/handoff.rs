//! Single-slot, read-once channels over the ephemeral store.
//!
//! Each channel holds at most one pending value. Publishing overwrites any
//! unread value; consuming returns it and clears the slot. The last shown
//! answer is kept alongside as feedback context and is not read-once.

use crate::store::KeyValueStore;
use guideqa_types::{QueryOutcome, QuerySuccess};
use std::sync::Arc;
use tracing::{debug, warn};

/// Ephemeral storage key for the pending query result.
pub const RESULT_KEY: &str = "guideqa.session.result";

/// Ephemeral storage key for the pending prefill question.
pub const PREFILL_KEY: &str = "guideqa.session.prefill";

/// Ephemeral storage key for the answer most recently shown to the user.
pub const LAST_ANSWER_KEY: &str = "guideqa.session.last_answer";

/// Carries one-shot values across a navigation step.
pub struct SessionHandoff {
    store: Arc<dyn KeyValueStore>,
}

impl SessionHandoff {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn take(&self, key: &str) -> Option<String> {
        let raw = self.store.get(key)?;
        self.store.remove(key);
        Some(raw)
    }

    /// Publish a query outcome, replacing any unread one.
    pub fn publish_result(&self, outcome: &QueryOutcome) {
        if self.store.get(RESULT_KEY).is_some() {
            debug!(target: "guideqa::handoff", "Overwriting unread query result");
        }
        match serde_json::to_string(outcome) {
            Ok(json) => self.store.set(RESULT_KEY, &json),
            Err(e) => warn!(target: "guideqa::handoff", "Failed to serialize result: {}", e),
        }
    }

    /// Take the pending outcome. A malformed stored value is cleared and
    /// returned as a failure outcome.
    pub fn consume_result(&self) -> Option<QueryOutcome> {
        let raw = self.take(RESULT_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(target: "guideqa::handoff", "Discarding malformed query result: {}", e);
                Some(QueryOutcome::failure(format!("Failed to parse stored result: {}", e)))
            }
        }
    }

    /// Publish a question to pre-fill the next query form.
    pub fn publish_prefill(&self, question: &str) {
        self.store.set(PREFILL_KEY, question);
    }

    /// Take the pending prefill question.
    pub fn consume_prefill(&self) -> Option<String> {
        self.take(PREFILL_KEY)
    }

    /// Remember an answer the user has seen, so it can be rated later.
    pub fn remember_answer(&self, success: &QuerySuccess) {
        match serde_json::to_string(success) {
            Ok(json) => self.store.set(LAST_ANSWER_KEY, &json),
            Err(e) => warn!(target: "guideqa::handoff", "Failed to serialize answer: {}", e),
        }
    }

    /// The answer last passed to [`remember_answer`](Self::remember_answer).
    pub fn last_answer(&self) -> Option<QuerySuccess> {
        let raw = self.store.get(LAST_ANSWER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(success) => Some(success),
            Err(e) => {
                warn!(target: "guideqa::handoff", "Discarding malformed last answer: {}", e);
                self.store.remove(LAST_ANSWER_KEY);
                None
            }
        }
    }

    /// Drop all pending values and the remembered answer.
    pub fn reset(&self) {
        self.store.remove(RESULT_KEY);
        self.store.remove(PREFILL_KEY);
        self.store.remove(LAST_ANSWER_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use guideqa_types::{QueryResponse, QuerySuccess};
    use uuid::Uuid;

    fn create_test_handoff() -> (SessionHandoff, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SessionHandoff::new(store.clone()), store)
    }

    fn success(answer: &str) -> QueryOutcome {
        QueryOutcome::Success(QuerySuccess {
            question: "q".into(),
            top_k: 5,
            history_id: Uuid::new_v4(),
            out_of_scope: false,
            response: QueryResponse {
                answer: answer.into(),
                categories: vec!["Referral criteria".into()],
                evidence: vec![],
            },
        })
    }

    #[test]
    fn test_result_is_read_once() {
        let (handoff, _store) = create_test_handoff();
        let outcome = success("answer");

        handoff.publish_result(&outcome);
        assert_eq!(handoff.consume_result(), Some(outcome));
        assert_eq!(handoff.consume_result(), None);
    }

    #[test]
    fn test_later_publish_overwrites() {
        let (handoff, _store) = create_test_handoff();
        handoff.publish_result(&success("first"));
        let second = QueryOutcome::failure("boom");
        handoff.publish_result(&second);

        assert_eq!(handoff.consume_result(), Some(second));
        assert_eq!(handoff.consume_result(), None);
    }

    #[test]
    fn test_malformed_result_becomes_failure() {
        let (handoff, store) = create_test_handoff();
        store.set(RESULT_KEY, "{garbage");

        match handoff.consume_result() {
            Some(QueryOutcome::Failure(f)) => {
                assert!(f.message.starts_with("Failed to parse stored result"))
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(store.get(RESULT_KEY), None);
    }

    #[test]
    fn test_prefill_is_read_once() {
        let (handoff, _store) = create_test_handoff();
        assert_eq!(handoff.consume_prefill(), None);

        handoff.publish_prefill("What is the recommended HbA1c target?");
        assert_eq!(
            handoff.consume_prefill().as_deref(),
            Some("What is the recommended HbA1c target?")
        );
        assert_eq!(handoff.consume_prefill(), None);
    }

    #[test]
    fn test_channels_are_independent() {
        let (handoff, _store) = create_test_handoff();
        handoff.publish_prefill("q");
        handoff.publish_result(&success("a"));

        assert!(handoff.consume_result().is_some());
        assert_eq!(handoff.consume_prefill().as_deref(), Some("q"));
    }

    #[test]
    fn test_last_answer_survives_reads() {
        let (handoff, store) = create_test_handoff();
        assert!(handoff.last_answer().is_none());

        let QueryOutcome::Success(answer) = success("a") else {
            unreachable!()
        };
        handoff.remember_answer(&answer);
        assert_eq!(handoff.last_answer(), Some(answer.clone()));
        assert_eq!(handoff.last_answer(), Some(answer));

        store.set(LAST_ANSWER_KEY, "[1,2");
        assert!(handoff.last_answer().is_none());
        assert_eq!(store.get(LAST_ANSWER_KEY), None);
    }

    #[test]
    fn test_reset_clears_everything() {
        let (handoff, _store) = create_test_handoff();
        let QueryOutcome::Success(answer) = success("a") else {
            unreachable!()
        };
        handoff.publish_prefill("q");
        handoff.publish_result(&success("a"));
        handoff.remember_answer(&answer);
        handoff.reset();

        assert_eq!(handoff.consume_result(), None);
        assert_eq!(handoff.consume_prefill(), None);
        assert_eq!(handoff.last_answer(), None);
    }
}
