//! JSON extraction from free-form model replies
//!
//! Models wrap JSON in markdown fences or add a sentence before it. The reply is
//! unwrapped from the first fenced block when present, then the first balanced span
//! that parses as a JSON object or array is taken.

use regex::Regex;
use std::sync::OnceLock;

fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").ok())
        .as_ref()
}

/// Content of the first fenced code block, or the trimmed input when there is none
pub fn strip_code_fences(text: &str) -> &str {
    fence_regex()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_else(|| text.trim())
}

/// First complete JSON object or array in `text`
///
/// Each `{` or `[` is tried in turn as a start, so braces inside surrounding prose or
/// quoted text are skipped when they do not open valid JSON.
pub fn extract_first_json_entity(text: &str) -> Option<&str> {
    text.char_indices()
        .filter(|(_, ch)| matches!(ch, '{' | '['))
        .filter_map(|(start, _)| balanced_end(text, start).map(|end| &text[start..=end]))
        .find(|candidate| serde_json::from_str::<serde_json::Value>(candidate).is_ok())
}

/// Byte index of the bracket closing the one at `start`
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if in_string {
            match ch {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// Fence-strip, then isolate the JSON payload
pub fn extract_json_payload(reply: &str) -> Option<&str> {
    extract_first_json_entity(strip_code_fences(reply))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        let reply = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(reply), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_bare_fence_with_prose() {
        let reply = "Here you go:\n```\n[1, 2]\n```\nGood luck!";
        assert_eq!(strip_code_fences(reply), "[1, 2]");
    }

    #[test]
    fn test_no_fence_returns_trimmed_input() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_first_entity_skips_leading_prose() {
        let text = "Sure! {\"name\": \"Coconut\", \"tags\": [\"a\", \"}\"]} trailing";
        assert_eq!(
            extract_first_json_entity(text),
            Some("{\"name\": \"Coconut\", \"tags\": [\"a\", \"}\"]}")
        );
    }

    #[test]
    fn test_braces_in_quoted_prose_are_skipped() {
        let text = r#"He said "use {caution}" then {"a": 1}"#;
        assert_eq!(extract_first_json_entity(text), Some(r#"{"a": 1}"#));

        let text = r#"Careful with "{" here: {"crop": "Rice"}"#;
        assert_eq!(extract_first_json_entity(text), Some(r#"{"crop": "Rice"}"#));

        let text = "Options [see below]: [{\"name\": \"Banana\"}]";
        assert_eq!(extract_first_json_entity(text), Some("[{\"name\": \"Banana\"}]"));
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(extract_first_json_entity("{\"a\": 1"), None);
        assert_eq!(extract_first_json_entity("no json here"), None);
        assert_eq!(extract_first_json_entity("{not json}"), None);
    }

    #[test]
    fn test_extract_payload_from_fenced_reply() {
        let reply = "```json\n{\"recommendations\": []}\n```";
        assert_eq!(extract_json_payload(reply), Some("{\"recommendations\": []}"));
    }
}
