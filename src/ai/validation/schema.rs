//! Structural Schema Validation
//!
//! Wraps a compiled JSON Schema (draft 7) together with its name and source
//! definition. The definition is kept so the corrective retry prompt can
//! embed it verbatim.
//!
//! Validation is structural only: types, required fields, enumerations and
//! bounds the schema declares. Artifact semantics live in `ai::normalize`.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::types::{Result, SrsError};

/// A named, compiled response schema
pub struct ResponseSchema {
    name: String,
    definition: Value,
    compiled: JSONSchema,
}

impl std::fmt::Debug for ResponseSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseSchema")
            .field("name", &self.name)
            .finish()
    }
}

impl ResponseSchema {
    /// Compile a schema definition
    pub fn new(name: impl Into<String>, definition: Value) -> Result<Self> {
        let name = name.into();
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&definition)
            .map_err(|e| SrsError::Config(format!("Invalid schema '{}': {}", name, e)))?;

        Ok(Self {
            name,
            definition,
            compiled,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pretty-printed definition for prompt embedding
    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.definition).unwrap_or_else(|_| self.definition.to_string())
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.compiled.is_valid(value)
    }

    /// Validate, collecting every violation as `"<instance path>: <message>"`
    pub fn validate(&self, value: &Value) -> std::result::Result<(), Vec<String>> {
        self.compiled.validate(value).map_err(|errors| {
            errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        format!("/: {}", e)
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ResponseSchema {
        ResponseSchema::new(
            "sample",
            json!({
                "type": "object",
                "required": ["model", "why"],
                "properties": {
                    "model": {"type": "string"},
                    "why": {"type": "string"},
                    "priority": {"enum": ["High", "Medium", "Low"]}
                }
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_value() {
        let schema = sample();
        assert!(schema.is_valid(&json!({"model": "Agile", "why": "iterative"})));
        assert!(schema.validate(&json!({"model": "Agile", "why": "x"})).is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let schema = sample();
        let errors = schema.validate(&json!({"model": "Agile"})).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("why"));
    }

    #[test]
    fn test_wrong_type_and_enum() {
        let schema = sample();
        let errors = schema
            .validate(&json!({"model": 7, "why": "x", "priority": "Urgent"}))
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.starts_with("/model")));
        assert!(errors.iter().any(|e| e.starts_with("/priority")));
    }

    #[test]
    fn test_invalid_definition_rejected() {
        let err = ResponseSchema::new("broken", json!({"type": "no-such-type"})).unwrap_err();
        assert!(matches!(err, SrsError::Config(_)));
    }

    #[test]
    fn test_pretty_string_embeds_definition() {
        let schema = sample();
        let pretty = schema.to_pretty_string();
        assert!(pretty.contains("\"required\""));
        assert!(pretty.contains('\n'));
    }
}
