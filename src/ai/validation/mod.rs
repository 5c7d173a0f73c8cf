//! AI Response Validation
//!
//! Turns raw model text into a schema-conforming JSON value:
//! - JSON extraction from prose and code fences (heuristic)
//! - Parse with a single backslash-repair pass
//! - Structural validation against a compiled JSON Schema
//!
//! The corrective retry that wraps these steps lives in `ai::pipeline`.

mod extract;
mod json_repair;
mod schema;

pub use extract::{ExtractionSource, extract_json, extract_json_with_source, strip_code_fence};
pub use json_repair::{escape_stray_backslashes, parse_repaired, parse_with_repair_status};
pub use schema::ResponseSchema;

use serde_json::Value;
use tracing::debug;

/// Why a completion was rejected by [`check_completion`]
#[derive(Debug)]
pub enum CompletionDefect {
    /// No parsable JSON could be recovered
    Unparsable(String),
    /// JSON parsed but violated the schema
    SchemaMismatch(Vec<String>),
}

impl CompletionDefect {
    /// Human-readable details for logging and the terminal error
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::Unparsable(message) => vec![message.clone()],
            Self::SchemaMismatch(errors) => errors.clone(),
        }
    }
}

/// A completion that passed extraction, parsing and schema validation
#[derive(Debug, Clone)]
pub struct CheckedCompletion {
    pub value: Value,
    /// Which extraction rule produced the payload
    pub source: ExtractionSource,
    /// Whether the backslash repair was needed
    pub was_repaired: bool,
}

/// Extract, parse and validate one raw completion
pub fn check_completion(
    raw: &str,
    schema: &ResponseSchema,
) -> std::result::Result<CheckedCompletion, CompletionDefect> {
    let (payload, source) = extract_json_with_source(raw);
    debug!(?source, schema = schema.name(), "Extracted candidate JSON");

    let (value, was_repaired) = parse_with_repair_status(payload)
        .map_err(|e| CompletionDefect::Unparsable(e.to_string()))?;

    schema
        .validate(&value)
        .map_err(CompletionDefect::SchemaMismatch)?;

    Ok(CheckedCompletion {
        value,
        source,
        was_repaired,
    })
}
