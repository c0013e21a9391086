//! Feedback types.
//!
//! Feedback is stored separately from history and refers back to it weakly,
//! by history id and by a snapshot of the question text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A thumbs judgment on an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Thumbs {
    Up,
    Down,
}

impl fmt::Display for Thumbs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thumbs::Up => write!(f, "up"),
            Thumbs::Down => write!(f, "down"),
        }
    }
}

impl std::str::FromStr for Thumbs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" | "+" | "good" => Ok(Thumbs::Up),
            "down" | "-" | "bad" => Ok(Thumbs::Down),
            _ => Err(format!("Invalid thumbs value: '{}'. Use 'up' or 'down'.", s)),
        }
    }
}

/// Feedback fields denormalized onto a history item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSnapshot {
    pub thumbs: Thumbs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One recorded user judgment on an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    /// Unique identifier, assigned when recorded.
    pub id: Uuid,
    /// History item this feedback judges, if known. Not an owning reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_id: Option<Uuid>,
    /// Question text at feedback time, used as the fallback join key.
    pub question: String,
    #[serde(default)]
    pub answer_snippet: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub evidence_count: usize,
    pub thumbs: Thumbs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackEntry {
    /// The fields copied onto a matching history item.
    pub fn snapshot(&self) -> FeedbackSnapshot {
        FeedbackSnapshot {
            thumbs: self.thumbs,
            comment: self.comment.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// A feedback entry before the log assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackDraft {
    pub history_id: Option<Uuid>,
    pub question: String,
    pub answer_snippet: String,
    pub categories: Vec<String>,
    pub evidence_count: usize,
    pub thumbs: Thumbs,
    pub comment: Option<String>,
    /// Caller-supplied timestamp; the log uses the current time when absent.
    pub timestamp: Option<DateTime<Utc>>,
}

impl FeedbackDraft {
    /// A draft with no context beyond the question.
    pub fn new(question: impl Into<String>, thumbs: Thumbs) -> Self {
        Self {
            history_id: None,
            question: question.into(),
            answer_snippet: String::new(),
            categories: Vec::new(),
            evidence_count: 0,
            thumbs,
            comment: None,
            timestamp: None,
        }
    }

    pub fn with_history_id(mut self, id: Uuid) -> Self {
        self.history_id = Some(id);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Assign the id and timestamp.
    pub fn into_entry(self) -> FeedbackEntry {
        FeedbackEntry {
            id: Uuid::new_v4(),
            history_id: self.history_id,
            question: self.question,
            answer_snippet: self.answer_snippet,
            categories: self.categories,
            evidence_count: self.evidence_count,
            thumbs: self.thumbs,
            comment: self.comment,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        }
    }
}
