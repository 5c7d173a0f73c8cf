//! Validated Generation Pipeline
//!
//! One logical generation: prompt in, schema-conforming JSON out.
//!
//! ```text
//! prompt ──► provider ──► extract ──► parse/repair ──► schema ──► Value
//!                                          │              │
//!                                          └── defect ────┘
//!                                                 │
//!                      retry prompt (schema + original prompt)
//!                                                 │
//!            provider ──► extract ──► parse/repair ──► schema ──► Value | SchemaViolation
//! ```
//!
//! Provider errors (busy, credential, transient, permanent) are never
//! retried here; the provider has already applied its own retry policy.
//! The corrective round happens at most once regardless of the defect kind.

use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::ai::provider::LlmProvider;
use crate::ai::validation::{CompletionDefect, ResponseSchema, check_completion};
use crate::constants::validation as validation_constants;
use crate::types::{Result, SrsError};

// =============================================================================
// Retry Policy
// =============================================================================

/// Validation rounds per logical operation, original call included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: validation_constants::CORRECTIVE_ATTEMPTS,
        }
    }
}

// =============================================================================
// Retry Prompt
// =============================================================================

/// Corrective prompt: the full schema followed by the original request
pub fn build_retry_prompt(original_prompt: &str, schema: &ResponseSchema) -> String {
    format!(
        "Your previous answer was not valid JSON matching the required schema.\n\
         Respond again with ONLY a JSON object that conforms exactly to this JSON Schema:\n\
         {}\n\n\
         Do not wrap the JSON in markdown and do not add commentary.\n\n\
         Original request:\n{}",
        schema.to_pretty_string(),
        original_prompt
    )
}

// =============================================================================
// Entry Points
// =============================================================================

/// Generate with the default retry prompt
pub async fn generate_validated(
    provider: &dyn LlmProvider,
    prompt: &str,
    schema: &ResponseSchema,
) -> Result<Value> {
    generate_validated_with(provider, prompt, schema, |schema| {
        build_retry_prompt(prompt, schema)
    })
    .await
}

/// Generate, validate, and correct once using a caller-supplied retry prompt
#[instrument(
    skip_all,
    fields(
        request_id = %Uuid::new_v4(),
        schema = schema.name(),
        provider = provider.name()
    )
)]
pub async fn generate_validated_with<F>(
    provider: &dyn LlmProvider,
    prompt: &str,
    schema: &ResponseSchema,
    retry_prompt_builder: F,
) -> Result<Value>
where
    F: Fn(&ResponseSchema) -> String,
{
    run_rounds(
        provider,
        prompt,
        schema,
        &retry_prompt_builder,
        RetryPolicy::default(),
    )
    .await
}

async fn run_rounds<F>(
    provider: &dyn LlmProvider,
    prompt: &str,
    schema: &ResponseSchema,
    retry_prompt_builder: &F,
    policy: RetryPolicy,
) -> Result<Value>
where
    F: Fn(&ResponseSchema) -> String,
{
    let mut last_defect: Option<CompletionDefect> = None;

    for round in 1..=policy.max_attempts {
        let request = if round == 1 {
            prompt.to_string()
        } else {
            retry_prompt_builder(schema)
        };

        let raw = provider.generate(&request).await?;

        match check_completion(&raw, schema) {
            Ok(checked) => {
                if round > 1 {
                    info!(round, "Corrective retry produced valid JSON");
                }
                debug!(
                    source = ?checked.source,
                    repaired = checked.was_repaired,
                    "Completion validated"
                );
                return Ok(checked.value);
            }
            Err(defect) => {
                warn!(
                    round,
                    max_rounds = policy.max_attempts,
                    details = ?defect.details(),
                    preview = %preview(&raw),
                    "Completion rejected"
                );
                last_defect = Some(defect);
            }
        }
    }

    Err(SrsError::SchemaViolation {
        schema: schema.name().to_string(),
        details: last_defect.map(|d| d.details()).unwrap_or_default(),
    })
}

fn preview(raw: &str) -> String {
    raw.chars()
        .take(validation_constants::LOG_PREVIEW_CHARS)
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
