//! Extract Command
//!
//! Offline run of the response extractor and backslash repair over a saved
//! completion, optionally checked against a JSON Schema file.
//!
//! Usage:
//!   srsmith extract completion.txt
//!   srsmith extract completion.txt --schema sdlc.schema.json

use std::path::Path;

use crate::ai::validation::{ResponseSchema, extract_json_with_source, parse_with_repair_status};
use crate::cli::ui::Output;
use crate::cli::util::read_file;
use crate::types::{Result, SrsError};

pub fn run(path: &Path, schema_path: Option<&Path>) -> Result<()> {
    let output = Output::new();
    let raw = read_file(path)?;

    let (payload, source) = extract_json_with_source(&raw);
    let (value, repaired) = parse_with_repair_status(payload)?;

    output.info(&format!("Extracted via {:?}", source));
    if repaired {
        output.warning("Stray backslashes were escaped to parse the payload");
    }

    if let Some(schema_path) = schema_path {
        let definition: serde_json::Value = serde_json::from_str(&read_file(schema_path)?)?;
        let name = schema_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("schema");
        let schema = ResponseSchema::new(name, definition)?;

        if let Err(errors) = schema.validate(&value) {
            for error in &errors {
                output.error(error);
            }
            return Err(SrsError::SchemaViolation {
                schema: name.to_string(),
                details: errors,
            });
        }
        output.success(&format!("Conforms to schema '{}'", name));
    }

    output.json(&value)
}
