//! Terminal rendering of outcomes, history and backend status.

use guideqa_core::{render_failure, truncate_snippet};
use guideqa_types::{HistoryItem, IndexStatus, QueryOutcome, Thumbs};
use std::fmt::Write;
use uuid::Uuid;

const EVIDENCE_PREVIEW_CHARS: usize = 160;

/// First block of a UUID, enough to pick an item from a short list.
pub fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn thumbs_label(thumbs: Thumbs) -> &'static str {
    match thumbs {
        Thumbs::Up => "helpful",
        Thumbs::Down => "not helpful",
    }
}

/// Render a consumed query outcome.
pub fn render_outcome(outcome: &QueryOutcome) -> String {
    let mut out = String::new();
    match outcome {
        QueryOutcome::Success(success) => {
            let response = &success.response;
            let _ = writeln!(out, "Q: {}", success.question);
            if success.out_of_scope {
                let _ = writeln!(
                    out,
                    "! Out of scope: the guideline returned no supporting evidence or category."
                );
            }
            if !response.categories.is_empty() {
                let _ = writeln!(out, "Categories: {}", response.categories.join(", "));
            }
            let _ = writeln!(out, "\n{}\n", response.answer.trim());

            if !response.evidence.is_empty() {
                let _ = writeln!(out, "Evidence ({}):", response.evidence.len());
                for (i, e) in response.evidence.iter().enumerate() {
                    let source = e.source.as_deref().unwrap_or("guideline");
                    let _ = writeln!(
                        out,
                        "  [{}] {} p.{} (score {:.2}) {}",
                        i + 1,
                        source,
                        e.page,
                        e.score,
                        truncate_snippet(&e.text, EVIDENCE_PREVIEW_CHARS)
                    );
                }
            }
            let _ = writeln!(
                out,
                "id {} (top_k {})",
                short_id(success.history_id),
                success.top_k
            );
        }
        QueryOutcome::Failure(failure) => {
            let _ = writeln!(out, "Query failed:");
            let _ = writeln!(out, "{}", render_failure(&failure.message));
        }
    }
    out
}

/// Render history as a compact list, newest first.
pub fn render_history(items: &[HistoryItem]) -> String {
    if items.is_empty() {
        return "No history yet.\n".to_string();
    }

    let mut out = String::new();
    for item in items {
        let scope = if item.out_of_scope {
            " [out of scope]"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{}  {}  {}{}",
            short_id(item.id),
            item.created_at.format("%Y-%m-%d %H:%M"),
            item.question,
            scope
        );
        let _ = write!(out, "          {} evidence", item.evidence_count());
        if !item.categories.is_empty() {
            let _ = write!(out, ", {}", item.categories.join(", "));
        }
        if let Some(feedback) = &item.feedback {
            let _ = write!(out, ", rated {}", thumbs_label(feedback.thumbs));
            if let Some(comment) = &feedback.comment {
                let _ = write!(out, " ({})", comment);
            }
        }
        out.push('\n');
    }
    out
}

pub fn render_status(status: &IndexStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "mode:            {}", status.mode);
    if let Some(path) = &status.qdrant_path {
        let _ = writeln!(out, "qdrant path:     {}", path);
    }
    let _ = writeln!(out, "collection:      {}", status.collection);
    let points = status
        .points_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let _ = writeln!(out, "points:          {}", points);
    let _ = writeln!(
        out,
        "embedding:       {} ({} dims)",
        status.embedding_model, status.embedding_dim
    );
    out
}
