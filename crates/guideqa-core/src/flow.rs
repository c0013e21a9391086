//! Query page flow: submission, result handoff, feedback, and repeat.
//!
//! Ties the backend to the two durable logs and the ephemeral handoff
//! channels. Nothing here fails the caller for storage reasons; backend
//! failures become failure outcomes on the result channel.

use crate::backend::{Backend, BackendError};
use crate::correlate::merge_feedback;
use crate::feedback::FeedbackLog;
use crate::handoff::SessionHandoff;
use crate::history::{HistoryLog, PatchFallback, PatchOutcome};
use crate::render::{SNIPPET_LEN, clip_chars};
use crate::store::KeyValueStore;
use crate::{GuideqaError, Result};
use guideqa_types::{
    DEFAULT_TOP_K, FeedbackDraft, FeedbackEntry, HistoryItem, IndexStatus, IngestRequest,
    IngestResponse, QueryOutcome, QueryRequest, QuerySuccess, Thumbs,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Tunables for [`QueryFlow`].
#[derive(Debug, Clone)]
pub struct QueryFlowConfig {
    /// Retrieval breadth used when a submission does not give one.
    pub default_top_k: u32,
    /// Ask the backend to return evidence even for uncategorized questions.
    pub debug_return_evidence: bool,
    /// Policy for feedback that matches no history item.
    pub patch_fallback: PatchFallback,
}

impl Default for QueryFlowConfig {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            debug_return_evidence: false,
            patch_fallback: PatchFallback::default(),
        }
    }
}

pub struct QueryFlow {
    backend: Arc<dyn Backend>,
    history: HistoryLog,
    feedback: FeedbackLog,
    handoff: SessionHandoff,
    config: QueryFlowConfig,
}

impl QueryFlow {
    /// Create a flow over a durable and an ephemeral storage area.
    pub fn new(
        backend: Arc<dyn Backend>,
        durable: Arc<dyn KeyValueStore>,
        ephemeral: Arc<dyn KeyValueStore>,
        config: QueryFlowConfig,
    ) -> Self {
        Self {
            backend,
            history: HistoryLog::new(durable.clone()),
            feedback: FeedbackLog::new(durable),
            handoff: SessionHandoff::new(ephemeral),
            config,
        }
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn feedback(&self) -> &FeedbackLog {
        &self.feedback
    }

    pub fn handoff(&self) -> &SessionHandoff {
        &self.handoff
    }

    /// Submit a question and publish the outcome on the result channel.
    ///
    /// A successful answer is recorded as exactly one history item; a failure
    /// records nothing. The outcome is also returned to the caller.
    pub async fn submit(&self, question: &str, top_k: Option<u32>) -> QueryOutcome {
        let top_k = top_k.unwrap_or(self.config.default_top_k);
        let request = QueryRequest {
            question: question.to_string(),
            top_k,
            debug_return_evidence: self.config.debug_return_evidence,
        };

        let outcome = match self.backend.query(&request).await {
            Ok(response) => {
                let item = HistoryItem::from_response(question, top_k, &response);
                let success = QuerySuccess {
                    question: item.question.clone(),
                    top_k,
                    history_id: item.id,
                    out_of_scope: item.out_of_scope,
                    response,
                };
                info!(
                    target: "guideqa::flow",
                    "Answered query {} (evidence: {}, out of scope: {})",
                    item.id,
                    item.evidence_count(),
                    item.out_of_scope
                );
                self.history.add(item);
                QueryOutcome::Success(success)
            }
            Err(e) => {
                warn!(target: "guideqa::flow", "Query failed: {}", e);
                QueryOutcome::failure(e.user_message())
            }
        };

        self.handoff.publish_result(&outcome);
        outcome
    }

    /// Take the outcome published by the last submission, if still unread.
    ///
    /// A successful answer taken here becomes the session's feedback context.
    pub fn take_result(&self) -> Option<QueryOutcome> {
        let outcome = self.handoff.consume_result()?;
        if let QueryOutcome::Success(success) = &outcome {
            self.handoff.remember_answer(success);
        }
        Some(outcome)
    }

    /// Record feedback, then copy it onto the matching history item.
    ///
    /// The feedback log is written regardless of whether a history item matches.
    pub fn submit_feedback(&self, draft: FeedbackDraft) -> (FeedbackEntry, PatchOutcome) {
        let entry = self.feedback.record(draft);
        let patched = self.history.patch_feedback(
            entry.history_id,
            entry.snapshot(),
            &entry.question,
            self.config.patch_fallback,
        );
        if patched == PatchOutcome::NotFound {
            info!(target: "guideqa::flow", "Feedback {} matches no history item", entry.id);
        }
        (entry, patched)
    }

    /// Record feedback on a stored history item.
    pub fn rate(
        &self,
        history_id: Uuid,
        thumbs: Thumbs,
        comment: Option<String>,
    ) -> Result<(FeedbackEntry, PatchOutcome)> {
        let item = self
            .history
            .get(history_id)
            .ok_or(GuideqaError::HistoryNotFound(history_id))?;

        let mut draft = draft_from_item(&item, thumbs);
        draft.comment = comment;
        Ok(self.submit_feedback(draft))
    }

    /// Rate the answer most recently taken from the result channel.
    ///
    /// The answer's history item may since have been removed or evicted, in
    /// which case the configured fallback decides what gets patched. Returns
    /// `None` when no answer has been shown this session.
    pub fn rate_last_answer(
        &self,
        thumbs: Thumbs,
        comment: Option<String>,
    ) -> Option<(FeedbackEntry, PatchOutcome)> {
        let success = self.handoff.last_answer()?;
        let mut draft = draft_from_success(&success, thumbs);
        draft.comment = comment;
        Some(self.submit_feedback(draft))
    }

    /// History with the latest feedback merged in, newest first.
    pub fn history_view(&self) -> Vec<HistoryItem> {
        merge_feedback(&self.history.load(), &self.feedback.load())
    }

    /// Queue a stored question as the next query's pre-fill.
    pub fn repeat(&self, history_id: Uuid) -> Option<String> {
        let item = self.history.get(history_id)?;
        self.handoff.publish_prefill(&item.question);
        Some(item.question)
    }

    /// Take the pending pre-fill question.
    pub fn take_prefill(&self) -> Option<String> {
        self.handoff.consume_prefill()
    }

    /// Pick the question for a new submission.
    ///
    /// A pending pre-fill is consumed either way and used only when no
    /// question was typed.
    pub fn next_question(&self, typed: Option<String>) -> Option<String> {
        let queued = self.take_prefill();
        typed.or(queued)
    }

    pub fn remove(&self, history_id: Uuid) -> bool {
        self.history.remove(history_id)
    }

    pub fn clear(&self) {
        self.history.clear();
    }

    /// Ask the backend to index a PDF.
    pub async fn ingest(
        &self,
        pdf_path: &str,
    ) -> std::result::Result<IngestResponse, BackendError> {
        let request = IngestRequest {
            pdf_path: pdf_path.to_string(),
        };
        let response = self.backend.ingest(&request).await?;
        info!(
            target: "guideqa::flow",
            "Ingested {} ({} pages, {} chunks)",
            pdf_path,
            response.pages,
            response.chunks
        );
        Ok(response)
    }

    pub async fn index_status(&self) -> std::result::Result<IndexStatus, BackendError> {
        self.backend.index_status().await
    }
}

/// Feedback draft carrying a history item's context.
pub fn draft_from_item(item: &HistoryItem, thumbs: Thumbs) -> FeedbackDraft {
    FeedbackDraft {
        history_id: Some(item.id),
        question: item.question.clone(),
        answer_snippet: clip_chars(&item.answer, SNIPPET_LEN),
        categories: item.categories.clone(),
        evidence_count: item.evidence_count(),
        thumbs,
        comment: None,
        timestamp: None,
    }
}

/// Feedback draft for a freshly rendered answer.
pub fn draft_from_success(success: &QuerySuccess, thumbs: Thumbs) -> FeedbackDraft {
    FeedbackDraft {
        history_id: Some(success.history_id),
        question: success.question.clone(),
        answer_snippet: clip_chars(&success.response.answer, SNIPPET_LEN),
        categories: success.response.categories.clone(),
        evidence_count: success.response.evidence.len(),
        thumbs,
        comment: None,
        timestamp: None,
    }
}
