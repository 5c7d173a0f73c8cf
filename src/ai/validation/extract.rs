//! JSON Extraction Heuristic
//!
//! Recovers a best-guess JSON substring from free-form model text.
//! This is a heuristic, not a parser: the result still has to go through
//! [`super::parse_repaired`] and the caller must handle failure.
//!
//! Fallback ladder, first match wins:
//! 1. A fenced block tagged `json` → its trimmed interior
//! 2. First `{` through last `}` (inclusive) when the closing brace follows the opening
//! 3. The trimmed original text

use std::sync::LazyLock;

use regex::Regex;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)```").expect("static regex is valid"));

/// Which rung of the ladder produced the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Fence,
    Braces,
    Raw,
}

/// Extract the candidate JSON payload from model output
pub fn extract_json(text: &str) -> &str {
    extract_json_with_source(text).0
}

/// Extract the candidate JSON payload and report which rule matched
pub fn extract_json_with_source(text: &str) -> (&str, ExtractionSource) {
    if let Some(inner) = JSON_FENCE.captures(text).and_then(|c| c.get(1)) {
        return (inner.as_str().trim(), ExtractionSource::Fence);
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}'))
        && end > start
    {
        return (&text[start..=end], ExtractionSource::Braces);
    }

    (text.trim(), ExtractionSource::Raw)
}

/// Remove one wrapping markdown code fence (```` ```json ```` or bare ```` ``` ````)
///
/// Applied by providers to the raw completion before it leaves the client.
/// Text without a leading or trailing fence is only trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();

    if let Some(rest) = s.strip_prefix("```") {
        s = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
    }

    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }

    s.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_interior() {
        let text = "Here you go:\n```json\n  {\"model\": \"Agile\"}  \n```\nThanks!";
        let (payload, source) = extract_json_with_source(text);
        assert_eq!(payload, "{\"model\": \"Agile\"}");
        assert_eq!(source, ExtractionSource::Fence);
    }

    #[test]
    fn test_fence_wins_over_braces() {
        let text = "{ignored} ```json\n{\"a\": 1}\n``` {also ignored}";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn test_brace_scan_spans_first_to_last() {
        let text = "Sure! {\"a\": {\"b\": 2}} hope that helps }";
        let (payload, source) = extract_json_with_source(text);
        assert_eq!(payload, "{\"a\": {\"b\": 2}} hope that helps }");
        assert_eq!(source, ExtractionSource::Braces);
    }

    #[test]
    fn test_brace_scan_with_prose() {
        let text = "The answer is {\"model\": \"Scrum\", \"why\": \"teams\"} as requested.";
        assert_eq!(extract_json(text), "{\"model\": \"Scrum\", \"why\": \"teams\"}");
    }

    #[test]
    fn test_closing_before_opening_falls_back_to_raw() {
        let text = "  } nothing useful {  ";
        let (payload, source) = extract_json_with_source(text);
        assert_eq!(payload, "} nothing useful {");
        assert_eq!(source, ExtractionSource::Raw);
    }

    #[test]
    fn test_no_json_returns_trimmed() {
        assert_eq!(extract_json("\n  just words \n"), "just words");
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        // Prose around the fence is left for the extractor
        assert_eq!(
            strip_code_fence("Result:\n```json\n{}\n```"),
            "Result:\n```json\n{}"
        );
    }
}
