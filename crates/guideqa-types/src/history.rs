//! Question/answer history types.
//!
//! A [`HistoryItem`] is written once per successful query and is persisted in
//! the durable store as part of a newest-first JSON array.

use crate::{FeedbackSnapshot, QueryResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Retrieval breadth used when a query does not specify one.
pub const DEFAULT_TOP_K: u32 = 5;

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

/// A supporting passage returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Source document label, when the backend knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// 1-based page number in the source document.
    pub page: u32,
    /// Text span of the passage.
    pub text: String,
    /// Relevance score reported by the vector search.
    pub score: f64,
}

/// One recorded question/answer interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// Unique identifier, assigned at creation.
    pub id: Uuid,
    /// When the interaction was recorded.
    pub created_at: DateTime<Utc>,
    /// The literal question text submitted.
    pub question: String,
    /// Retrieval breadth requested.
    #[serde(default = "default_top_k")]
    pub requested_top_k: u32,
    /// Topic labels returned by the backend.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Generated answer text.
    #[serde(default)]
    pub answer: String,
    /// Number of supporting passages. Filled from `evidence` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_count: Option<usize>,
    /// Supporting passages, in backend order.
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    /// True when the backend returned no evidence or no categories.
    #[serde(default)]
    pub out_of_scope: bool,
    /// Last-known feedback copied from the feedback log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<FeedbackSnapshot>,
}

impl HistoryItem {
    /// Create an empty interaction for a question.
    pub fn new(question: impl Into<String>, requested_top_k: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            question: question.into(),
            requested_top_k,
            categories: Vec::new(),
            answer: String::new(),
            evidence_count: None,
            evidence: Vec::new(),
            out_of_scope: true,
            feedback: None,
        }
    }

    /// Build an interaction from a successful backend response.
    pub fn from_response(
        question: impl Into<String>,
        requested_top_k: u32,
        response: &QueryResponse,
    ) -> Self {
        let mut item = Self::new(question, requested_top_k);
        item.answer = response.answer.clone();
        item.categories = response.categories.clone();
        item.evidence = response.evidence.clone();
        item.evidence_count = Some(response.evidence.len());
        item.out_of_scope = response.is_out_of_scope();
        item
    }

    /// Evidence count, derived from the evidence list when not stored.
    pub fn evidence_count(&self) -> usize {
        self.evidence_count.unwrap_or(self.evidence.len())
    }

    /// Fill `evidence_count` from the evidence list if it is missing.
    pub fn normalize(&mut self) {
        if self.evidence_count.is_none() {
            self.evidence_count = Some(self.evidence.len());
        }
    }
}

/// True when a response carries no evidence or no categories.
pub fn is_out_of_scope(evidence: &[Evidence], categories: &[String]) -> bool {
    evidence.is_empty() || categories.is_empty()
}
