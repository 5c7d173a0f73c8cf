//! Drafted artifact types and their normalizers
//!
//! Each `from_validated` takes a schema-valid JSON value, enforces the
//! artifact's domain rules, and produces the typed result.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::ai::normalize::{
    DiagramKind, apply_confidence, canonical_choice, check_code_preserved, clamp_number,
    match_allowed, normalize_diagram, number, strip_fenced_code,
};
use crate::constants::normalize::{MAX_REVIEW_SCORE, PRIORITIES, SDLC_MODELS, SEVERITIES};
use crate::types::{Result, SrsError};

fn into_object(value: Value) -> Result<serde_json::Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(SrsError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Typed view of a schema-valid value; a shape the schema let through but the
/// type rejects is a malformed response, never an internal error
fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| SrsError::MalformedResponse(format!("unexpected field shape: {}", e)))
}

// =============================================================================
// SDLC Recommendation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdlcRecommendation {
    /// Model name as the provider wrote it
    pub model: String,
    pub why: String,
    /// Always within `[0, 1]`
    pub confidence: f64,
}

impl SdlcRecommendation {
    pub fn from_validated(value: Value) -> Result<Self> {
        let mut object = into_object(value)?;

        let model = object
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or_default();
        match_allowed("sdlc_model", model, &SDLC_MODELS)?;
        apply_confidence(&mut object, "confidence");

        decode(Value::Object(object))
    }
}

// =============================================================================
// Software Requirements Specification
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub description: String,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrsDocument {
    pub title: String,
    pub introduction: String,
    pub functional_requirements: Vec<Requirement>,
    pub non_functional_requirements: Vec<Requirement>,
}

impl SrsDocument {
    pub fn from_validated(value: Value) -> Result<Self> {
        let mut doc: SrsDocument = decode(value)?;
        let mut seen = HashSet::new();

        normalize_requirements(&mut doc.functional_requirements, "FR", &mut seen)?;
        normalize_requirements(&mut doc.non_functional_requirements, "NFR", &mut seen)?;

        if doc.functional_requirements.is_empty() {
            return Err(SrsError::domain(
                "srs_requirements",
                "The generated SRS has no functional requirements",
            ));
        }
        Ok(doc)
    }
}

/// Canonicalize priorities, number blank ids, and reject duplicates
fn normalize_requirements(
    requirements: &mut [Requirement],
    prefix: &str,
    seen: &mut HashSet<String>,
) -> Result<()> {
    for (idx, requirement) in requirements.iter_mut().enumerate() {
        requirement.priority =
            canonical_choice("priority", &requirement.priority, &PRIORITIES)?.to_string();

        let id = requirement.id.trim();
        requirement.id = if id.is_empty() {
            format!("{}-{}", prefix, idx + 1)
        } else {
            id.to_string()
        };

        if !seen.insert(requirement.id.clone()) {
            return Err(SrsError::domain(
                "srs_requirements",
                format!("Duplicate requirement id '{}'", requirement.id),
            ));
        }
    }
    Ok(())
}

// =============================================================================
// Project Plan
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPhase {
    pub name: String,
    pub duration_weeks: f64,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPlan {
    pub phases: Vec<PlanPhase>,
}

impl ProjectPlan {
    pub fn from_validated(value: Value) -> Result<Self> {
        let mut plan: ProjectPlan = decode(value)?;

        for phase in &mut plan.phases {
            if !phase.duration_weeks.is_finite() || phase.duration_weeks < 0.0 {
                return Err(SrsError::domain(
                    "plan_duration",
                    format!("Phase '{}' has an invalid duration", phase.name),
                ));
            }
            phase.tasks.retain(|task| !task.trim().is_empty());
        }
        Ok(plan)
    }

    /// Sum of all phase durations
    pub fn total_weeks(&self) -> f64 {
        self.phases.iter().map(|p| p.duration_weeks).sum()
    }
}

// =============================================================================
// System Design
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub responsibility: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDesign {
    pub architecture: String,
    pub components: Vec<Component>,
    pub data_flow: String,
}

impl SystemDesign {
    pub fn from_validated(value: Value) -> Result<Self> {
        let design: SystemDesign = decode(value)?;

        let mut names = HashSet::new();
        for component in &design.components {
            if !names.insert(component.name.trim().to_lowercase()) {
                return Err(SrsError::domain(
                    "design_components",
                    format!("Component '{}' is listed twice", component.name),
                ));
            }
        }
        Ok(design)
    }
}

// =============================================================================
// Diagram
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub kind: String,
    /// Repaired Mermaid source
    pub diagram: String,
}

impl Diagram {
    pub fn from_validated(value: Value, kind: DiagramKind) -> Result<Self> {
        let source = value
            .get("diagram")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Ok(Self {
            kind: kind.to_string(),
            diagram: normalize_diagram(source, kind)?,
        })
    }
}

// =============================================================================
// Generated / Translated Code
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub language: String,
    pub code: String,
    pub explanation: String,
}

impl GeneratedCode {
    /// `requested_language` fills in a blank `language` field
    pub fn from_validated(value: Value, requested_language: &str) -> Result<Self> {
        let mut code: GeneratedCode = decode(value)?;

        code.code = strip_fenced_code(&code.code).to_string();
        if code.code.trim().is_empty() {
            return Err(SrsError::domain(
                "code_output",
                "The AI returned no code",
            ));
        }
        if code.language.trim().is_empty() {
            code.language = requested_language.to_string();
        }
        Ok(code)
    }
}

// =============================================================================
// Code Review
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewIssue {
    pub severity: String,
    #[serde(default, deserialize_with = "line_number")]
    pub line: Option<u32>,
    pub message: String,
}

/// Accepts `3` and `3.0`; JSON Schema treats both as integers
fn line_number<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) if n.fract() == 0.0 && (1.0..=f64::from(u32::MAX)).contains(&n) => {
            Ok(Some(n as u32))
        }
        Some(n) => Err(D::Error::custom(format!("invalid line number {}", n))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeReview {
    pub summary: String,
    /// Always within `[0, 10]`
    pub score: f64,
    pub issues: Vec<ReviewIssue>,
    pub tests: Vec<String>,
}

impl CodeReview {
    pub fn from_validated(value: Value) -> Result<Self> {
        let mut object = into_object(value)?;

        let score = clamp_number(object.get("score"), 0.0, MAX_REVIEW_SCORE).ok_or_else(|| {
            SrsError::domain("review_score", "The review score is not a number")
        })?;
        object.insert("score".to_string(), number(score));

        let mut review: CodeReview = decode(Value::Object(object))?;
        for issue in &mut review.issues {
            issue.severity = canonical_choice("severity", &issue.severity, &SEVERITIES)?.to_string();
        }
        Ok(review)
    }
}

// =============================================================================
// Suggested Edit
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedEdit {
    pub suggested_text: String,
    pub explanation: String,
}

impl SuggestedEdit {
    pub fn from_validated(value: Value, original: &str, instruction: &str) -> Result<Self> {
        let edit: SuggestedEdit = decode(value)?;
        check_code_preserved(original, &edit.suggested_text, instruction)?;
        Ok(edit)
    }
}
