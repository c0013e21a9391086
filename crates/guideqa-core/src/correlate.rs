//! Display-time join of feedback onto history.

use guideqa_types::{FeedbackEntry, HistoryItem};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Attach the latest applicable feedback to each history item.
///
/// `feedback` must be newest first, as stored. Each item is matched by
/// `history_id` first and by exact question text second; unmatched items keep
/// whatever feedback they already carry. Neither input is modified.
///
/// Only entries without a `history_id`, or whose item is no longer in
/// `history`, take part in the question match. An entry owned by a live item
/// never rates a different item that happens to share its question.
pub fn merge_feedback(history: &[HistoryItem], feedback: &[FeedbackEntry]) -> Vec<HistoryItem> {
    let live: HashSet<Uuid> = history.iter().map(|item| item.id).collect();
    let mut by_id = HashMap::new();
    let mut by_question = HashMap::new();

    // Set-if-absent over a newest-first sequence keeps the newest entry per key.
    for entry in feedback {
        if let Some(history_id) = entry.history_id {
            by_id.entry(history_id).or_insert(entry);
        }
        if entry.history_id.is_none_or(|id| !live.contains(&id)) {
            by_question.entry(entry.question.as_str()).or_insert(entry);
        }
    }

    history
        .iter()
        .map(|item| {
            let mut item = item.clone();
            let matched = by_id
                .get(&item.id)
                .or_else(|| by_question.get(item.question.as_str()));
            if let Some(entry) = matched {
                item.feedback = Some(entry.snapshot());
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use guideqa_types::{FeedbackDraft, FeedbackSnapshot, Thumbs};

    fn entry(
        question: &str,
        history_id: Option<Uuid>,
        thumbs: Thumbs,
        age_secs: i64,
    ) -> FeedbackEntry {
        let mut draft = FeedbackDraft::new(question, thumbs)
            .with_timestamp(Utc::now() - Duration::seconds(age_secs));
        draft.history_id = history_id;
        draft.into_entry()
    }

    #[test]
    fn test_newest_entry_wins_by_id() {
        let item = HistoryItem::new("q", 5);
        let older = entry("q", Some(item.id), Thumbs::Down, 60);
        let newer = entry("q", Some(item.id), Thumbs::Up, 1);

        let merged = merge_feedback(&[item], &[newer.clone(), older]);
        let fb = merged[0].feedback.as_ref().unwrap();
        assert_eq!(fb.thumbs, Thumbs::Up);
        assert_eq!(fb.timestamp, newer.timestamp);
    }

    #[test]
    fn test_question_fallback_when_no_id() {
        let item = HistoryItem::new("Q", 5);
        let fb = entry("Q", None, Thumbs::Down, 5);

        let merged = merge_feedback(&[item], &[fb]);
        assert_eq!(merged[0].feedback.as_ref().unwrap().thumbs, Thumbs::Down);
    }

    #[test]
    fn test_id_match_beats_newer_question_match() {
        let item = HistoryItem::new("Q", 5);
        let by_question = entry("Q", None, Thumbs::Up, 1);
        let by_id = entry("Q", Some(item.id), Thumbs::Down, 100);

        let merged = merge_feedback(&[item], &[by_question, by_id]);
        assert_eq!(merged[0].feedback.as_ref().unwrap().thumbs, Thumbs::Down);
    }

    #[test]
    fn test_orphan_feedback_matches_by_question() {
        // The owning item was evicted; a later item reuses the question text.
        let item = HistoryItem::new("Q", 5);
        let orphan = entry("Q", Some(Uuid::new_v4()), Thumbs::Up, 10);

        let merged = merge_feedback(&[item], &[orphan]);
        assert_eq!(merged[0].feedback.as_ref().unwrap().thumbs, Thumbs::Up);
    }

    #[test]
    fn test_rating_of_live_item_not_shared_by_question() {
        // A repeated question creates a second item with identical text.
        let original = HistoryItem::new("Q", 5);
        let repeated = HistoryItem::new("Q", 5);
        let rated = entry("Q", Some(original.id), Thumbs::Down, 30);

        let merged = merge_feedback(&[repeated, original], &[rated]);
        assert_eq!(merged[0].feedback, None);
        assert_eq!(merged[1].feedback.as_ref().unwrap().thumbs, Thumbs::Down);
    }

    #[test]
    fn test_unmatched_item_keeps_cached_feedback() {
        let mut item = HistoryItem::new("Q", 5);
        let cached = FeedbackSnapshot {
            thumbs: Thumbs::Down,
            comment: Some("cached".into()),
            timestamp: Utc::now(),
        };
        item.feedback = Some(cached.clone());
        let plain = HistoryItem::new("other", 5);

        let merged = merge_feedback(&[item, plain], &[entry("unrelated", None, Thumbs::Up, 1)]);
        assert_eq!(merged[0].feedback, Some(cached));
        assert_eq!(merged[1].feedback, None);
    }

    #[test]
    fn test_merge_preserves_order() {
        let items: Vec<HistoryItem> = (0..3)
            .map(|i| HistoryItem::new(format!("q{}", i), 5))
            .collect();
        let merged = merge_feedback(&items, &[]);
        let ids: Vec<Uuid> = merged.iter().map(|i| i.id).collect();
        assert_eq!(ids, items.iter().map(|i| i.id).collect::<Vec<_>>());
    }
}
