pub trait StripCodeBlock {
    fn strip_code_block(&self) -> &str;
}

impl StripCodeBlock for str {
    /// Removes one surrounding Markdown code fence, language tag included.
    fn strip_code_block(&self) -> &str {
        let trimmed = self.trim();
        if trimmed.starts_with("```")
            && let Some(pos) = trimmed.find('\n')
            && let Some(inner) = trimmed[pos + 1..].strip_suffix("```")
        {
            return inner.trim();
        }
        trimmed
    }
}

/// Shortens model text for log lines, respecting char boundaries.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...(truncated)", &text[..idx]),
        None => text.to_string(),
    }
}
