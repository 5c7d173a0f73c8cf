//! Code-structure preservation for suggested text edits
//!
//! When the edited region holds source code and the instruction is about
//! prose, the model must not touch the code. Comments may change freely;
//! everything else must survive byte-for-byte once comments, trailing
//! whitespace and blank lines are ignored.
//!
//! If the original contains fenced blocks, only fenced bodies are compared,
//! so prose around them stays editable.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::types::{Result, SrsError};

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[^\n]*\n(.*?)```").expect("valid fence regex"));

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/|<!--.*?-->").expect("valid block comment regex"));

static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^:])//.*$|(^|\s)#(?:\s.*)?$|^\s*--\s.*$").expect("valid line comment regex")
});

/// Lines that look like code rather than prose
static CODE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^\s*(?:fn|def|class|function|import|from|package|public|private|protected|
               return|let|const|var|if|for|while|struct|enum|impl|use|select|insert|
               update|create)\b
        | [;{}]\s*$
        | ^\s*\#include\b
        | =>
        ",
    )
    .expect("valid code line regex")
});

/// Instruction words that explicitly allow code changes
const CODE_CHANGE_KEYWORDS: [&str; 12] = [
    "code",
    "function",
    "method",
    "refactor",
    "implement",
    "variable",
    "class",
    "snippet",
    "algorithm",
    "logic",
    "bug",
    "syntax",
];

/// Whole-word keyword match; "decode" or "barcode" do not count as "code"
static CODE_CHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:{})(?:s|es|ed|ing|ation|ations)?\b",
        CODE_CHANGE_KEYWORDS.join("|")
    ))
    .expect("valid code change regex")
});

/// Strip one surrounding markdown fence of any language tag
pub fn strip_fenced_code(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("python", "rust title=...") up to the first newline
    let body = match after_open.split_once('\n') {
        Some((_, body)) => body,
        None => after_open,
    };
    body.strip_suffix("```").unwrap_or(body).trim_end()
}

/// Whether `text` contains source code (fenced, or at least two code-like lines)
pub fn contains_code(text: &str) -> bool {
    if FENCED_BLOCK.is_match(text) {
        return true;
    }
    text.lines().filter(|line| CODE_LINE.is_match(line)).count() >= 2
}

/// Whether the instruction explicitly asks for code to change
pub fn requests_code_change(instruction: &str) -> bool {
    CODE_CHANGE.is_match(instruction)
}

/// Remove comment-like substrings
pub fn strip_comments(code: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(code, "");
    without_blocks
        .lines()
        .map(|line| LINE_COMMENT.replace(line, "$1$2").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Comment-free, blank-line-free, right-trimmed skeleton of `code`
pub fn structural_text(code: &str) -> String {
    strip_comments(code)
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn code_regions(text: &str) -> Vec<String> {
    let fenced: Vec<String> = FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| structural_text(m.as_str()))
        .collect();

    if fenced.is_empty() {
        vec![structural_text(text)]
    } else {
        fenced
    }
}

/// Reject a suggestion that changed code the instruction did not ask to change
pub fn check_code_preserved(original: &str, suggested: &str, instruction: &str) -> Result<()> {
    if !contains_code(original) {
        return Ok(());
    }
    if requests_code_change(instruction) {
        debug!("Instruction requests code changes; structure check skipped");
        return Ok(());
    }

    let before = code_regions(original);
    let after = code_regions(suggested);

    if before != after {
        warn!(
            original_regions = before.len(),
            suggested_regions = after.len(),
            "Suggested edit altered code structure"
        );
        return Err(SrsError::domain(
            "code_structure",
            "The suggested edit changes the code in the selected text. \
             Ask explicitly for a code change if that is intended",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL: &str = "fn total(items: &[u32]) -> u32 {\n    // sum all\n    items.iter().sum()\n}\n";

    #[test]
    fn test_strip_fenced_code() {
        assert_eq!(strip_fenced_code("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(strip_fenced_code("  let x = 1;  "), "let x = 1;");
        assert_eq!(strip_fenced_code("```\n    indented()\n```"), "    indented()");
    }

    #[test]
    fn test_detects_code() {
        assert!(contains_code(ORIGINAL));
        assert!(contains_code("Intro\n```sql\nSELECT 1\n```"));
        assert!(!contains_code("The system shall export reports as PDF."));
    }

    #[test]
    fn test_comment_only_change_allowed() {
        let suggested =
            "fn total(items: &[u32]) -> u32 {\n    /* add every item */\n    items.iter().sum()   \n\n}";
        assert!(check_code_preserved(ORIGINAL, suggested, "Improve the wording").is_ok());
    }

    #[test]
    fn test_structural_change_rejected() {
        let suggested = "fn total(items: &[u32]) -> u64 {\n    items.iter().map(|&i| i as u64).sum()\n}";
        let err = check_code_preserved(ORIGINAL, suggested, "Make it clearer").unwrap_err();
        assert!(matches!(err, SrsError::DomainInvariantViolation { .. }));
    }

    #[test]
    fn test_explicit_code_request_skips_check() {
        let suggested = "fn total(items: &[u32]) -> u64 { 0 }";
        assert!(check_code_preserved(ORIGINAL, suggested, "Refactor this function").is_ok());
    }

    #[test]
    fn test_code_change_keywords_match_whole_words() {
        assert!(requests_code_change("Fix the bug in this CODE"));
        assert!(requests_code_change("Refactoring welcome"));
        assert!(requests_code_change("rename the variables"));
        assert!(!requests_code_change("Explain how we decode the payload"));
        assert!(!requests_code_change("Mention the barcode scanner"));
        assert!(!requests_code_change("Say we encode dates as ISO 8601"));

        let suggested = "fn total(items: &[u32]) -> u64 { 0 }";
        assert!(check_code_preserved(ORIGINAL, suggested, "Describe how to decode it").is_err());
    }

    #[test]
    fn test_prose_around_fence_is_editable() {
        let original = "The exporter runs nightly.\n```python\nrun()  # nightly\n```";
        let suggested = "Every night, the exporter runs.\n```python\nrun()\n```";
        assert!(check_code_preserved(original, suggested, "Rephrase").is_ok());

        let broken = "Every night, the exporter runs.\n```python\nrun(force=True)\n```";
        assert!(check_code_preserved(original, broken, "Rephrase").is_err());
    }

    #[test]
    fn test_strip_comments_keeps_urls() {
        let stripped = strip_comments("let url = \"https://example.com\"; // home");
        assert_eq!(stripped.trim_end(), "let url = \"https://example.com\";");
    }

    #[test]
    fn test_strip_hash_and_html_comments() {
        assert_eq!(strip_comments("x = 1  # one").trim_end(), "x = 1");
        assert_eq!(strip_comments("<!-- note --><div></div>"), "<div></div>");
        assert_eq!(strip_comments("#include <stdio.h>"), "#include <stdio.h>");
    }
}
