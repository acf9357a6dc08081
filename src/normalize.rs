//! Pulls structured answers out of free-form model output.
//!
//! Models asked for a JSON array often wrap it in a markdown fence or add
//! prose around it. The array is the first balanced `[...]` in the text;
//! brackets inside JSON strings do not count towards the nesting depth.

use serde_json::Value;

use crate::error::AiError;

/// Locate and parse the JSON array embedded in model output
pub fn extract_json_array(text: &str) -> Result<Vec<Value>, AiError> {
    let candidate = first_balanced_array(text)
        .ok_or_else(|| AiError::InvalidJson("no JSON array found in model output".to_string()))?;

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(AiError::InvalidJson(format!(
            "expected a JSON array, found {}",
            other
        ))),
        Err(e) => Err(AiError::InvalidJson(e.to_string())),
    }
}

/// The slice from the first `[` to the `]` that closes it
fn first_balanced_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_markdown_fence() {
        let text = "```json\n[{\"front\":\"a\",\"back\":\"b\"}]\n```";
        let items = extract_json_array(text).unwrap();
        assert_eq!(items, vec![json!({"front": "a", "back": "b"})]);
    }

    #[test]
    fn test_ignores_surrounding_prose() {
        let text = "Here are your questions:\n[{\"question\":\"Q\",\"options\":[\"a\",\"b\",\"c\",\"d\"]}]\nGood luck!";
        let items = extract_json_array(text).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["options"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_plain_array() {
        let items = extract_json_array("[1, 2, 3]").unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_trailing_bracketed_prose_ignored() {
        let text = "```json\n[{\"front\":\"a\",\"back\":\"b\"}]\n```\nSources: [1] lecture notes";
        let items = extract_json_array(text).unwrap();
        assert_eq!(items, vec![json!({"front": "a", "back": "b"})]);
    }

    #[test]
    fn test_brackets_inside_strings() {
        let text = r#"[{"front": "Closing ] bracket", "back": "see [2"}] and [more]"#;
        let items = extract_json_array(text).unwrap();
        assert_eq!(items[0]["front"], "Closing ] bracket");
        assert_eq!(items[0]["back"], "see [2");
    }

    #[test]
    fn test_unclosed_array() {
        let result = extract_json_array("[{\"front\": \"a\"");
        assert!(matches!(result, Err(AiError::InvalidJson(_))));
    }

    #[test]
    fn test_no_array() {
        let result = extract_json_array("Sorry, I cannot help with that.");
        assert!(matches!(result, Err(AiError::InvalidJson(_))));
    }

    #[test]
    fn test_unparseable_array() {
        let result = extract_json_array("```json\n[{\"front\": \"a\",]\n```");
        assert!(matches!(result, Err(AiError::InvalidJson(_))));
    }
}
