//! Tolerant parsing of JSON-shaped model replies.
//!
//! Models are asked for bare JSON but routinely wrap it in code fences or
//! prose. Parsing tries the raw text, then fence contents, then the
//! outermost brace span; when everything fails the raw text is preserved
//! under a `raw` key rather than dropped.

pub(crate) fn parse_structured_reply(text: &str) -> serde_json::Value {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return value;
    }

    if let Some(inner) = extract_fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(inner.trim()) {
            return value;
        }
    }

    if let Some(span) = outermost_brace_span(trimmed) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(span) {
            return value;
        }
    }

    serde_json::json!({ "raw": trimmed })
}

fn extract_fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip the optional language tag on the fence line.
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

fn outermost_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
