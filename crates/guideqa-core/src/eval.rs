//! Batch evaluation of the backend against labelled questions.
//!
//! Cases are read from a JSON Lines file, each sent as a query, and scored by
//! category overlap and evidence presence. One JSON line is written per case.

use crate::backend::Backend;
use crate::{GuideqaError, Result};
use chrono::{DateTime, Utc};
use guideqa_types::{QueryRequest, QueryResponse, unknown_categories};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One labelled question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    /// Case id; defaults to `rowNNN` by line position.
    #[serde(default)]
    pub id: Option<String>,
    pub question: String,
    #[serde(default)]
    pub expected_categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub category_jaccard: f64,
    pub evidence_nonempty: bool,
}

/// Output line for one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRecord {
    pub id: String,
    pub timestamp_utc: DateTime<Utc>,
    pub top_k: u32,
    pub question: String,
    pub expected_categories: Vec<String>,
    pub ok: bool,
    pub http_status: Option<u16>,
    pub error: Option<String>,
    pub response: Option<QueryResponse>,
    pub metrics: EvalMetrics,
}

/// Aggregate scores over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvalSummary {
    pub total: usize,
    pub ok: usize,
    /// Mean category Jaccard over successful cases.
    pub avg_category_jaccard: f64,
    /// Share of successful cases that returned any evidence.
    pub evidence_nonempty_rate: f64,
}

/// Jaccard similarity of two label sets. Two empty sets are identical.
pub fn category_jaccard(expected: &[String], got: &[String]) -> f64 {
    let a: HashSet<&str> = expected.iter().map(String::as_str).collect();
    let b: HashSet<&str> = got.iter().map(String::as_str).collect();

    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        _ => a.intersection(&b).count() as f64 / a.union(&b).count() as f64,
    }
}

/// Read cases from a JSON Lines file, skipping blank lines.
pub fn load_cases(path: &Path) -> Result<Vec<EvalCase>> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut cases = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut case: EvalCase = serde_json::from_str(&line).map_err(|e| GuideqaError::InvalidCase {
            line: index + 1,
            message: e.to_string(),
        })?;
        if case.id.is_none() {
            case.id = Some(format!("row{:03}", cases.len() + 1));
        }
        cases.push(case);
    }

    Ok(cases)
}

/// Runs cases sequentially against a backend.
pub struct EvalRunner {
    backend: Arc<dyn Backend>,
    top_k: u32,
    debug_return_evidence: bool,
    pause: Duration,
}

impl EvalRunner {
    pub fn new(backend: Arc<dyn Backend>, top_k: u32) -> Self {
        Self {
            backend,
            top_k,
            debug_return_evidence: true,
            pause: Duration::from_millis(50),
        }
    }

    pub fn with_debug_evidence(mut self, enabled: bool) -> Self {
        self.debug_return_evidence = enabled;
        self
    }

    /// Delay between consecutive cases.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Evaluate one case.
    pub async fn run_case(&self, case: &EvalCase) -> EvalRecord {
        let request = QueryRequest {
            question: case.question.clone(),
            top_k: self.top_k,
            debug_return_evidence: self.debug_return_evidence,
        };
        let result = self.backend.query_with_status(&request).await;

        let (ok, http_status, error, response) = match result {
            Ok((status, response)) => (true, Some(status), None, Some(response)),
            Err(e) => (false, e.http_status(), Some(e.user_message()), None),
        };

        if let Some(r) = &response {
            let unknown = unknown_categories(&r.categories);
            if !unknown.is_empty() {
                warn!(
                    target: "guideqa::eval",
                    "Case {} got unrecognized categories: {}",
                    case.id.as_deref().unwrap_or_default(),
                    unknown.join(", ")
                );
            }
        }

        let metrics = match &response {
            Some(r) => EvalMetrics {
                category_jaccard: category_jaccard(&case.expected_categories, &r.categories),
                evidence_nonempty: !r.evidence.is_empty(),
            },
            None => EvalMetrics {
                category_jaccard: 0.0,
                evidence_nonempty: false,
            },
        };

        EvalRecord {
            id: case.id.clone().unwrap_or_default(),
            timestamp_utc: Utc::now(),
            top_k: self.top_k,
            question: case.question.clone(),
            expected_categories: case.expected_categories.clone(),
            ok,
            http_status,
            error,
            response,
            metrics,
        }
    }

    /// Evaluate all cases, writing one JSON line per case to `out`.
    pub async fn run(&self, cases: &[EvalCase], out: &mut dyn Write) -> Result<EvalSummary> {
        let mut summary = EvalSummary {
            total: cases.len(),
            ..Default::default()
        };
        let mut jaccard_sum = 0.0;
        let mut evidence_nonempty = 0usize;

        for (index, case) in cases.iter().enumerate() {
            if index > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            let record = self.run_case(case).await;
            serde_json::to_writer(&mut *out, &record)?;
            out.write_all(b"\n")?;

            info!(
                target: "guideqa::eval",
                "[{}/{}] {} ok={} cat_jacc={:.2} evidence={}",
                index + 1,
                cases.len(),
                record.id,
                record.ok,
                record.metrics.category_jaccard,
                record.metrics.evidence_nonempty
            );

            if record.ok {
                summary.ok += 1;
                jaccard_sum += record.metrics.category_jaccard;
                if record.metrics.evidence_nonempty {
                    evidence_nonempty += 1;
                }
            } else {
                debug!(target: "guideqa::eval", "Case {} failed: {:?}", record.id, record.error);
            }
        }
        out.flush()?;

        if summary.ok > 0 {
            summary.avg_category_jaccard = jaccard_sum / summary.ok as f64;
            summary.evidence_nonempty_rate = evidence_nonempty as f64 / summary.ok as f64;
        }
        Ok(summary)
    }
}
