//! One-shot query outcomes passed across a navigation step.

use crate::QueryResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of a query submission, as published on the result channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Success(QuerySuccess),
    Failure(QueryFailure),
}

impl QueryOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        QueryOutcome::Failure(QueryFailure {
            message: message.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Success(_))
    }
}

/// A computed answer together with the parameters that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySuccess {
    pub question: String,
    pub top_k: u32,
    /// Id of the history item written for this answer.
    pub history_id: Uuid,
    pub out_of_scope: bool,
    pub response: QueryResponse,
}

/// A failed submission. `message` is the raw backend body when there was one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFailure {
    pub message: String,
}
