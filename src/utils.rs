//! Small shared helpers

use serde_json::Value;

/// UTF-8-safe prefix truncation for log lines and error bodies.
pub fn ellipsize(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = 0;
    for (idx, c) in text.char_indices() {
        let char_end = idx + c.len_utf8();
        if char_end > max_bytes {
            break;
        }
        end = char_end;
    }
    format!("{} ... [{} bytes truncated]", &text[..end], text.len() - end)
}

/// JSON value kind name for warning messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipsize_respects_utf8_boundaries() {
        let text = "日本語のテキストです";
        let short = ellipsize(text, 7);
        assert!(short.starts_with("日本"));
        assert!(short.contains("truncated"));
        assert_eq!(ellipsize("short", 100), "short");
    }
}
