//! JSON Parse-and-Repair
//!
//! Strict parse with a single repair pass for the most common corruption in
//! model output: lone backslashes inside strings (Windows paths, regexes,
//! LaTeX) that are not valid JSON escapes.
//!
//! The repair escapes every backslash that does not start a valid escape
//! sequence (`\"`, `\\`, `\/`, `\b`, `\f`, `\n`, `\r`, `\t`, `\u`). When the
//! repaired text still fails to parse, the error reported is the one from
//! the *original* text, which points at the real problem.

use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::validation::LOG_PREVIEW_CHARS;
use crate::types::{Result, SrsError};

/// Characters allowed after a backslash in a JSON string
const VALID_ESCAPES: [char; 9] = ['"', '\\', '/', 'b', 'f', 'n', 'r', 't', 'u'];

/// Parse JSON, repairing invalid backslash escapes once if needed
pub fn parse_repaired(text: &str) -> Result<Value> {
    parse_with_repair_status(text).map(|(value, _)| value)
}

/// Parse JSON and report whether the repair pass was needed
pub fn parse_with_repair_status(text: &str) -> Result<(Value, bool)> {
    let original_err = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok((value, false)),
        Err(e) => e,
    };

    debug!("Strict JSON parse failed ({}), escaping stray backslashes", original_err);
    let repaired = escape_stray_backslashes(text);

    match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => {
            warn!("JSON repaired by escaping stray backslashes");
            Ok((value, true))
        }
        Err(_) => Err(SrsError::MalformedResponse(format!(
            "{} (content preview: {})",
            original_err,
            text.chars().take(LOG_PREVIEW_CHARS).collect::<String>()
        ))),
    }
}

/// Escape every backslash that does not begin a valid JSON escape
///
/// Valid pairs are copied through untouched, so `\\` stays a single
/// escaped backslash and is never split.
pub fn escape_stray_backslashes(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.peek() {
            Some(next) if VALID_ESCAPES.contains(next) => {
                result.push('\\');
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
            _ => result.push_str("\\\\"),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_json_not_repaired() {
        let (value, repaired) = parse_with_repair_status(r#"{"key": "value"}"#).unwrap();
        assert_eq!(value, json!({"key": "value"}));
        assert!(!repaired);
    }

    #[test]
    fn test_lone_backslash_is_escaped() {
        let (value, repaired) = parse_with_repair_status(r#"{"a": "C:\path"}"#).unwrap();
        assert!(repaired);
        assert_eq!(value["a"], "C:\\path");
    }

    #[test]
    fn test_valid_escapes_preserved_during_repair() {
        // \d is invalid, \n and \\ are valid and must survive
        let text = r#"{"regex": "\d+", "text": "line\nbreak", "path": "a\\b"}"#;
        let value = parse_repaired(text).unwrap();
        assert_eq!(value["regex"], "\\d+");
        assert_eq!(value["text"], "line\nbreak");
        assert_eq!(value["path"], "a\\b");
    }

    #[test]
    fn test_latex_in_string() {
        let value = parse_repaired(r#"{"formula": "\alpha + \sum x"}"#).unwrap();
        assert_eq!(value["formula"], "\\alpha + \\sum x");
    }

    #[test]
    fn test_unrepairable_reports_original_error() {
        let text = r#"{"a": "C:\path", "b": }"#;
        let err = parse_repaired(text).unwrap_err();
        match err {
            SrsError::MalformedResponse(message) => {
                // The repaired text fails at the dangling comma; the original at the escape
                assert!(message.contains("invalid escape"), "got: {message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_escape_stray_backslashes() {
        assert_eq!(escape_stray_backslashes(r"C:\path"), r"C:\\path");
        assert_eq!(escape_stray_backslashes(r"a\\b"), r"a\\b");
        assert_eq!(escape_stray_backslashes(r#"say \"hi\""#), r#"say \"hi\""#);
        assert_eq!(escape_stray_backslashes(r"\u00e9"), r"\u00e9");
        assert_eq!(escape_stray_backslashes("end\\"), "end\\\\");
    }
}
