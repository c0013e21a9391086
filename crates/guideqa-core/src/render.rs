//! Text helpers shared by the flow and the CLI.

/// Characters of the answer kept on a feedback entry.
pub const SNIPPET_LEN: usize = 200;

/// Format a failure message for display.
///
/// Messages that parse as JSON are pretty-printed; anything else is returned
/// verbatim.
pub fn render_failure(message: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(message) {
        Ok(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| message.to_string())
        }
        _ => message.to_string(),
    }
}

/// First `max_chars` characters of `text`, otherwise untouched.
pub fn clip_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_index, _)) => text[..byte_index].to_string(),
    }
}

/// Whitespace-normalized prefix of `text`, at most `max_chars` characters
/// plus an ellipsis.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

    match normalized.char_indices().nth(max_chars) {
        None => normalized,
        Some((byte_index, _)) => format!("{}...", &normalized[..byte_index]),
    }
}
