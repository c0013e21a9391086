//! Client-side persistence and correlation for the guideline assistant.

mod backend;
mod capped;
mod correlate;
mod error;
mod eval;
mod feedback;
mod flow;
mod handoff;
mod history;
mod render;
mod store;

pub use backend::{Backend, BackendClient, BackendError, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use capped::CappedLog;
pub use correlate::merge_feedback;
pub use error::GuideqaError;
pub use eval::{
    EvalCase, EvalMetrics, EvalRecord, EvalRunner, EvalSummary, category_jaccard, load_cases,
};
pub use feedback::{FEEDBACK_CAP, FEEDBACK_KEY, FeedbackLog};
pub use flow::{QueryFlow, QueryFlowConfig, draft_from_item, draft_from_success};
pub use handoff::{LAST_ANSWER_KEY, PREFILL_KEY, RESULT_KEY, SessionHandoff};
pub use history::{HISTORY_CAP, HISTORY_KEY, HistoryLog, PatchFallback, PatchOutcome};
pub use render::{SNIPPET_LEN, clip_chars, render_failure, truncate_snippet};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};

/// Result type for guideqa operations.
pub type Result<T> = std::result::Result<T, GuideqaError>;
