//! Response schemas for every drafted artifact
//!
//! Schemas are structural. Rules that need judgment (allow-lists, priority
//! spelling, code preservation) belong to the artifact normalizers.

use serde_json::{Value, json};

use crate::ai::validation::ResponseSchema;
use crate::types::Result;

/// Compiled schemas, one per artifact
#[derive(Debug)]
pub struct SchemaSet {
    pub sdlc: ResponseSchema,
    pub srs: ResponseSchema,
    pub plan: ResponseSchema,
    pub design: ResponseSchema,
    pub diagram: ResponseSchema,
    pub code: ResponseSchema,
    pub review: ResponseSchema,
    pub edit: ResponseSchema,
}

impl SchemaSet {
    pub fn compile() -> Result<Self> {
        Ok(Self {
            sdlc: ResponseSchema::new("sdlc", sdlc())?,
            srs: ResponseSchema::new("srs", srs())?,
            plan: ResponseSchema::new("plan", plan())?,
            design: ResponseSchema::new("design", design())?,
            diagram: ResponseSchema::new("diagram", diagram())?,
            code: ResponseSchema::new("code", code())?,
            review: ResponseSchema::new("review", review())?,
            edit: ResponseSchema::new("edit", edit())?,
        })
    }
}

fn non_empty_string() -> Value {
    json!({"type": "string", "minLength": 1})
}

fn sdlc() -> Value {
    // confidence stays untyped: the normalizer coerces it
    json!({
        "type": "object",
        "required": ["model", "why"],
        "properties": {
            "model": non_empty_string(),
            "why": non_empty_string(),
            "confidence": {}
        }
    })
}

fn requirement_list() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["id", "description", "priority"],
            "properties": {
                "id": {"type": "string"},
                "description": non_empty_string(),
                "priority": {"type": "string"}
            }
        }
    })
}

fn srs() -> Value {
    json!({
        "type": "object",
        "required": [
            "title",
            "introduction",
            "functional_requirements",
            "non_functional_requirements"
        ],
        "properties": {
            "title": non_empty_string(),
            "introduction": non_empty_string(),
            "functional_requirements": requirement_list(),
            "non_functional_requirements": requirement_list()
        }
    })
}

fn plan() -> Value {
    json!({
        "type": "object",
        "required": ["phases"],
        "properties": {
            "phases": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["name", "duration_weeks", "tasks"],
                    "properties": {
                        "name": non_empty_string(),
                        "duration_weeks": {"type": "number", "minimum": 0},
                        "tasks": {"type": "array", "items": {"type": "string"}}
                    }
                }
            }
        }
    })
}

fn design() -> Value {
    json!({
        "type": "object",
        "required": ["architecture", "components", "data_flow"],
        "properties": {
            "architecture": non_empty_string(),
            "components": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["name", "responsibility"],
                    "properties": {
                        "name": non_empty_string(),
                        "responsibility": {"type": "string"}
                    }
                }
            },
            "data_flow": {"type": "string"}
        }
    })
}

fn diagram() -> Value {
    json!({
        "type": "object",
        "required": ["diagram"],
        "properties": {
            "diagram": non_empty_string()
        }
    })
}

fn code() -> Value {
    json!({
        "type": "object",
        "required": ["language", "code", "explanation"],
        "properties": {
            "language": {"type": "string"},
            "code": non_empty_string(),
            "explanation": {"type": "string"}
        }
    })
}

fn review() -> Value {
    json!({
        "type": "object",
        "required": ["summary", "score", "issues", "tests"],
        "properties": {
            "summary": {"type": "string"},
            "score": {"type": "number"},
            "issues": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["severity", "message"],
                    "properties": {
                        "severity": {"type": "string"},
                        "line": {"type": ["integer", "null"], "minimum": 1, "maximum": 4294967295u64},
                        "message": non_empty_string()
                    }
                }
            },
            "tests": {"type": "array", "items": {"type": "string"}}
        }
    })
}

fn edit() -> Value {
    json!({
        "type": "object",
        "required": ["suggested_text", "explanation"],
        "properties": {
            "suggested_text": {"type": "string"},
            "explanation": {"type": "string"}
        }
    })
}
