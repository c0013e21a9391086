//! Wire types for the retrieval/generation backend.

use crate::{Evidence, is_out_of_scope};
use serde::{Deserialize, Serialize};

/// Category labels the backend classifier may return.
pub const ALLOWED_CATEGORIES: [&str; 4] = [
    "Lifestyle management recommendations",
    "Medication protocol guidance",
    "Complication screening schedules",
    "Referral criteria",
];

/// Labels in `categories` that the classifier is not supposed to emit.
pub fn unknown_categories(categories: &[String]) -> Vec<&str> {
    categories
        .iter()
        .map(String::as_str)
        .filter(|label| !ALLOWED_CATEGORIES.contains(label))
        .collect()
}

/// Body of `POST /api/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub top_k: u32,
    #[serde(default)]
    pub debug_return_evidence: bool,
}

/// Successful response of `POST /api/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

impl QueryResponse {
    pub fn is_out_of_scope(&self) -> bool {
        is_out_of_scope(&self.evidence, &self.categories)
    }
}

/// Body of `POST /api/ingest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub pdf_path: String,
}

/// Response of `POST /api/ingest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub pages: u32,
    pub chunks: u32,
}

/// Response of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStatus {
    /// "cloud" or "local".
    pub mode: String,
    #[serde(default)]
    pub qdrant_path: Option<String>,
    pub collection: String,
    #[serde(default)]
    pub points_count: Option<u64>,
    pub embedding_model: String,
    pub embedding_dim: u32,
}
