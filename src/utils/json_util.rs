//! Locating and salvaging JSON in free-form model output.
//!
//! Models wrap their JSON in prose and code fences, copy the `#` comments from
//! prompt examples, use Python literals and drop or add commas. These helpers
//! find the most plausible JSON value in such text and repair the common
//! mistakes before handing it to `serde_json`.

use serde_json::Value;

use crate::utils::string_util::StripCodeBlock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("json could not be repaired: {0}")]
pub struct RepairError(pub String);

/// Finds the most plausible JSON object or array in `text`.
///
/// A fenced ```` ```json ```` block is preferred over the surrounding text, and
/// any other fence around the whole answer is dropped. Each `{` is tried in
/// order and the first one that repairs into an object wins; arrays are only
/// considered when no object is found. When the closing bracket is missing the
/// remainder of the text is returned so [`repair_json`] can close it.
pub fn extract_json(text: &str) -> Option<String> {
    if let Some(body) = fenced_json_block(text)
        && let Some(found) = locate_value(body)
    {
        return Some(found);
    }
    locate_value(text.strip_code_block())
}

/// Parses JSON-like text into a value, repairing minor syntax errors.
pub fn repair_json(text: &str) -> Result<Value, RepairError> {
    repair_with(text, true)
}

/// Returns the first bracketed list literal in `text` whose items are all strings.
///
/// Well-formed lists win over ones that only parse after repair, so stray
/// brackets in the surrounding prose do not shadow the real answer. Repair
/// never turns an unquoted word into a list item: `[Note]` is prose, not a list.
pub fn extract_list(text: &str) -> Option<Vec<String>> {
    let lists = candidates(text, '[');

    let strict = lists
        .iter()
        .find_map(|candidate| serde_json::from_str::<Value>(candidate).ok().and_then(string_items));
    strict.or_else(|| {
        lists
            .iter()
            .find_map(|candidate| repair_with(candidate, false).ok().and_then(string_items))
    })
}

fn repair_with(text: &str, quote_bare_words: bool) -> Result<Value, RepairError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RepairError("empty input".to_string()));
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }
    let normalized = normalize(trimmed, quote_bare_words);
    serde_json::from_str(&normalized).map_err(|e| RepairError(e.to_string()))
}

fn string_items(value: Value) -> Option<Vec<String>> {
    let Value::Array(items) = value else {
        return None;
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

/// Every slice of `text` starting at `open`, cut at its balanced closer when there is one.
fn candidates(text: &str, open: char) -> Vec<&str> {
    text.match_indices(open)
        .map(|(start, _)| {
            let candidate = &text[start..];
            match balanced_end(candidate) {
                Some(end) => &candidate[..end],
                None => candidate.trim_end(),
            }
        })
        .collect()
}

fn fenced_json_block(text: &str) -> Option<&str> {
    let lowered = text.to_ascii_lowercase();
    let start = lowered.find("```json")? + "```json".len();
    let body = &text[start..];
    Some(match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    })
}

fn locate_value(text: &str) -> Option<String> {
    let object = candidates(text, '{')
        .into_iter()
        .find(|candidate| matches!(repair_json(candidate), Ok(Value::Object(_))));
    object
        .or_else(|| {
            candidates(text, '[')
                .into_iter()
                .find(|candidate| matches!(repair_json(candidate), Ok(Value::Array(_))))
        })
        .map(str::to_string)
}

/// Byte offset just past the bracket closing the one `text` starts with.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Rewrites JSON-like text into strict JSON, token by token.
///
/// With `quote_bare_words` off, an unquoted word other than a literal is
/// copied as is and the result fails to parse.
fn normalize(text: &str, quote_bare_words: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut closers: Vec<char> = Vec::new();
    let mut opened = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                separate_values(&mut out);
                i = copy_string(&chars, i, &mut out);
            }
            '{' | '[' => {
                separate_values(&mut out);
                closers.push(if c == '{' { '}' } else { ']' });
                opened = true;
                out.push(c);
                i += 1;
            }
            '}' | ']' => {
                if closers.last() == Some(&c) {
                    closers.pop();
                    close_container(&mut out, c);
                }
                i += 1;
                if opened && closers.is_empty() {
                    break;
                }
            }
            '#' => i = skip_line(&chars, i),
            '/' if chars.get(i + 1) == Some(&'/') => i = skip_line(&chars, i),
            '/' if chars.get(i + 1) == Some(&'*') => i = skip_block_comment(&chars, i),
            ',' | ':' => {
                out.push(c);
                i += 1;
            }
            c if c.is_whitespace() => {
                out.push(c);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                separate_values(&mut out);
                i = copy_number(&chars, i, &mut out);
            }
            c if c.is_alphabetic() || c == '_' => {
                separate_values(&mut out);
                i = copy_bare_token(&chars, i, &mut out, quote_bare_words);
            }
            _ => i += 1,
        }
    }

    while let Some(closer) = closers.pop() {
        close_container(&mut out, closer);
    }
    out
}

fn close_container(out: &mut String, closer: char) {
    drop_trailing_comma(out);
    if out.trim_end().ends_with(':') {
        out.push_str(" null");
    }
    out.push(closer);
}

fn drop_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
}

/// Inserts the comma a model left out between two adjacent values.
fn separate_values(out: &mut String) {
    let tail = out.trim_end();
    let ends_value = tail.ends_with(['"', '}', ']'])
        || tail.ends_with(|c: char| c.is_ascii_digit())
        || tail.ends_with("true")
        || tail.ends_with("false")
        || tail.ends_with("null");
    if ends_value {
        out.push(',');
    }
}

fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                let next = chars[i + 1];
                if next == '\'' {
                    out.push('\'');
                } else {
                    out.push('\\');
                    out.push(next);
                }
                i += 2;
                continue;
            }
            _ if c == quote => {
                out.push('"');
                return i + 1;
            }
            '\\' => {}
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {}
            c => out.push(c),
        }
        i += 1;
    }
    // Unterminated string at end of truncated output.
    out.push('"');
    chars.len()
}

fn copy_number(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut i = start;
    if chars[i] == '+' {
        i += 1;
    }
    while i < chars.len() && (chars[i].is_ascii_digit() || matches!(chars[i], '.' | 'e' | 'E' | '-' | '+')) {
        out.push(chars[i]);
        i += 1;
    }
    i
}

/// Copies an unquoted word: a literal, a bare key or a bare string value.
fn copy_bare_token(chars: &[char], start: usize, out: &mut String, quote: bool) -> usize {
    let mut end = start;
    while end < chars.len() && !matches!(chars[end], ',' | '}' | ']' | ':' | '\n' | '#') {
        end += 1;
    }
    let token: String = chars[start..end].iter().collect();
    let token = token.trim();

    match token {
        "true" | "True" | "TRUE" => out.push_str("true"),
        "false" | "False" | "FALSE" => out.push_str("false"),
        "null" | "None" | "none" | "NULL" => out.push_str("null"),
        _ if !quote => out.push_str(token),
        _ => {
            out.push('"');
            for c in token.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
    }
    end
}

fn skip_line(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() && chars[i] != '\n' {
        i += 1;
    }
    i
}

fn skip_block_comment(chars: &[char], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_fenced_block() {
        let text = "Sure!\n```json\n{\"label\": \"cup\"}\n```\nAnything else?";
        assert_eq!(extract_json(text).unwrap(), "{\"label\": \"cup\"}");
    }

    #[test]
    fn extracts_object_from_prose() {
        let text = "The answer is {\"target\": \"a {red} cup\"} as requested.";
        assert_eq!(
            extract_json(text).unwrap(),
            "{\"target\": \"a {red} cup\"}"
        );
    }

    #[test]
    fn prefers_object_over_leading_array() {
        let text = "[note] {\"a\": [1, 2]}";
        assert_eq!(extract_json(text).unwrap(), "{\"a\": [1, 2]}");
    }

    #[test]
    fn returns_remainder_of_truncated_object() {
        let text = "{\"analysis\": {\"risk\": \"low\"}, \"target\": \"the blue";
        assert_eq!(extract_json(text).unwrap(), text);
    }

    #[test]
    fn unlabelled_fence_is_stripped() {
        let text = "```\n[\"cup\", \"bowl\"]\n```";
        assert_eq!(extract_json(text).unwrap(), "[\"cup\", \"bowl\"]");
    }

    #[test]
    fn no_json_found() {
        assert_eq!(extract_json("nothing to see here"), None);
    }

    #[test]
    fn strict_json_parses_unchanged() {
        assert_eq!(repair_json(" {\"a\": [1, 2]} ").unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn repairs_prompt_style_comments_and_trailing_commas() {
        let text = r#"{
            "bbox_2d": [10, 20, 30, 40],
            "label": "green cup",  # Keep this very brief
            "description": "A green cup", // detailed
        }"#;
        assert_eq!(
            repair_json(text).unwrap(),
            json!({"bbox_2d": [10, 20, 30, 40], "label": "green cup", "description": "A green cup"})
        );
    }

    #[test]
    fn repairs_python_style_literals() {
        let text = "{'target': 'the cup', 'ok': True, 'extra': None, label: green cup}";
        assert_eq!(
            repair_json(text).unwrap(),
            json!({"target": "the cup", "ok": true, "extra": null, "label": "green cup"})
        );
    }

    #[test]
    fn closes_truncated_output() {
        let text = "{\"analysis\": {\"risk\": \"low\"}, \"target\": \"the blue";
        assert_eq!(
            repair_json(text).unwrap(),
            json!({"analysis": {"risk": "low"}, "target": "the blue"})
        );
        assert_eq!(repair_json("{\"a\": 1, \"b\":").unwrap(), json!({"a": 1, "b": null}));
    }

    #[test]
    fn escapes_raw_newlines_in_strings() {
        let text = "{\"target\": \"the cube\n on the right\"}";
        assert_eq!(
            repair_json(text).unwrap(),
            json!({"target": "the cube\n on the right"})
        );
    }

    #[test]
    fn inserts_missing_commas() {
        let text = "{\"a\": 1\n\"b\": \"x\"\n\"c\": [1 2]}";
        assert_eq!(repair_json(text).unwrap(), json!({"a": 1, "b": "x", "c": [1, 2]}));
    }

    #[test]
    fn ignores_trailing_garbage() {
        assert_eq!(repair_json("{\"a\": 1} trailing words").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn empty_input_is_unrepairable() {
        assert!(repair_json("   ").is_err());
    }

    #[test]
    fn later_object_wins_over_brace_in_prose() {
        let text = "Considering {layout}, here it is: {\"analysis\": {}, \"target\": \"the red cup\"}";
        assert_eq!(
            extract_json(text).unwrap(),
            "{\"analysis\": {}, \"target\": \"the red cup\"}"
        );
    }

    #[test]
    fn array_only_when_no_object_repairs() {
        let text = "{oops} then [\"cup\", \"bowl\"]";
        assert_eq!(extract_json(text).unwrap(), "[\"cup\", \"bowl\"]");
    }

    #[test]
    fn extracts_list_literal() {
        let items = extract_list("Order: [\"red cup on left\", \"blue bowl\"] done").unwrap();
        assert_eq!(items, vec!["red cup on left", "blue bowl"]);
    }

    #[test]
    fn extracts_single_quoted_list() {
        let items = extract_list("['cup', 'bottle']").unwrap();
        assert_eq!(items, vec!["cup", "bottle"]);
    }

    #[test]
    fn skips_brackets_that_are_not_lists() {
        let items = extract_list("step [1 of 2]: [\"cup\"]").unwrap();
        assert_eq!(items, vec!["cup"]);
        assert!(extract_list("no list here").is_none());
    }

    #[test]
    fn bare_word_in_brackets_is_not_a_list() {
        let text = "[Note] Grasp order from right to left: ['red cup on right', 'blue bowl on left']";
        assert_eq!(
            extract_list(text).unwrap(),
            vec!["red cup on right", "blue bowl on left"]
        );
        assert!(extract_list("[red cup, blue bowl]").is_none());
    }

    #[test]
    fn number_list_does_not_shadow_string_list() {
        let text = "I see [2] cups. Order: ['red cup on right', 'blue bowl on left']";
        assert_eq!(
            extract_list(text).unwrap(),
            vec!["red cup on right", "blue bowl on left"]
        );
        assert!(extract_list("[1, 2, 3]").is_none());
    }
}
