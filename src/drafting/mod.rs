//! Artifact Drafting
//!
//! One operation per artifact. Every operation follows the same chain:
//!
//! ```text
//! built-in template ──fill──► prompt ──► generate_validated(schema) ──► normalizer ──► typed artifact
//! ```
//!
//! The [`Drafter`] holds the shared provider (and through it the shared rate
//! limiter), so all operations draw from one admission window.

mod artifacts;
mod schemas;

pub use artifacts::{
    CodeReview, Component, Diagram, GeneratedCode, PlanPhase, ProjectPlan, Requirement,
    ReviewIssue, SdlcRecommendation, SrsDocument, SuggestedEdit, SystemDesign,
};
pub use schemas::SchemaSet;

use serde_json::Value;
use tracing::info;

use crate::ai::normalize::{DiagramKind, match_allowed};
use crate::ai::pipeline::generate_validated;
use crate::ai::prompt::BuiltinTemplate;
use crate::ai::provider::{SharedProvider, create_provider};
use crate::ai::rate_limiter::RateLimiter;
use crate::ai::validation::ResponseSchema;
use crate::config::Config;
use crate::constants::normalize::SDLC_MODELS;
use crate::types::Result;

/// Artifact kinds exposed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ArtifactKind {
    /// SDLC model recommendation
    Sdlc,
    /// Software requirements specification
    Srs,
    /// Phased project plan
    Plan,
    /// High-level system design
    Design,
    /// Mermaid diagram
    Diagram,
    /// Code generated from requirements
    Code,
    /// Code translated between languages
    Translate,
    /// Code review with suggested tests
    Review,
    /// Suggested edit of a text region
    Edit,
}

/// Drafting operations over a shared provider
pub struct Drafter {
    provider: SharedProvider,
    schemas: SchemaSet,
}

impl std::fmt::Debug for Drafter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drafter")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .finish()
    }
}

impl Drafter {
    pub fn new(provider: SharedProvider) -> Result<Self> {
        Ok(Self {
            provider,
            schemas: SchemaSet::compile()?,
        })
    }

    /// Provider and rate limiter built from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let limiter = RateLimiter::from_config(&config.rate_limit).shared();
        Self::new(create_provider(config, limiter)?)
    }

    async fn run(
        &self,
        template: BuiltinTemplate,
        values: &[(&str, &str)],
        schema: &ResponseSchema,
    ) -> Result<Value> {
        let prompt = template.template().fill(values)?;
        info!(
            template = template.file_name(),
            schema = schema.name(),
            "Drafting artifact"
        );
        generate_validated(self.provider.as_ref(), &prompt, schema).await
    }

    pub async fn recommend_sdlc(&self, description: &str) -> Result<SdlcRecommendation> {
        let value = self
            .run(
                BuiltinTemplate::Sdlc,
                &[("description", description)],
                &self.schemas.sdlc,
            )
            .await?;
        SdlcRecommendation::from_validated(value)
    }

    pub async fn draft_srs(&self, description: &str) -> Result<SrsDocument> {
        let value = self
            .run(
                BuiltinTemplate::Srs,
                &[("description", description)],
                &self.schemas.srs,
            )
            .await?;
        SrsDocument::from_validated(value)
    }

    /// `model` must name an allowed process model; checked before any call
    pub async fn project_plan(&self, description: &str, model: &str) -> Result<ProjectPlan> {
        match_allowed("sdlc_model", model, &SDLC_MODELS)?;

        let value = self
            .run(
                BuiltinTemplate::Plan,
                &[("description", description), ("model", model)],
                &self.schemas.plan,
            )
            .await?;
        ProjectPlan::from_validated(value)
    }

    pub async fn system_design(&self, description: &str) -> Result<SystemDesign> {
        let value = self
            .run(
                BuiltinTemplate::Design,
                &[("description", description)],
                &self.schemas.design,
            )
            .await?;
        SystemDesign::from_validated(value)
    }

    pub async fn generate_diagram(&self, kind: DiagramKind, description: &str) -> Result<Diagram> {
        let value = self
            .run(
                BuiltinTemplate::Diagram,
                &[
                    ("kind", kind.as_str()),
                    ("header", kind.header()),
                    ("description", description),
                ],
                &self.schemas.diagram,
            )
            .await?;
        Diagram::from_validated(value, kind)
    }

    pub async fn generate_code(&self, requirements: &str, language: &str) -> Result<GeneratedCode> {
        let value = self
            .run(
                BuiltinTemplate::Code,
                &[("requirements", requirements), ("language", language)],
                &self.schemas.code,
            )
            .await?;
        GeneratedCode::from_validated(value, language)
    }

    pub async fn translate_code(&self, code: &str, from: &str, to: &str) -> Result<GeneratedCode> {
        let value = self
            .run(
                BuiltinTemplate::Translate,
                &[("code", code), ("from", from), ("to", to)],
                &self.schemas.code,
            )
            .await?;
        GeneratedCode::from_validated(value, to)
    }

    pub async fn review_code(&self, code: &str, language: &str) -> Result<CodeReview> {
        let value = self
            .run(
                BuiltinTemplate::Review,
                &[("code", code), ("language", language)],
                &self.schemas.review,
            )
            .await?;
        CodeReview::from_validated(value)
    }

    pub async fn suggest_edit(&self, original: &str, instruction: &str) -> Result<SuggestedEdit> {
        let value = self
            .run(
                BuiltinTemplate::Edit,
                &[("original", original), ("instruction", instruction)],
                &self.schemas.edit,
            )
            .await?;
        SuggestedEdit::from_validated(value, original, instruction)
    }
}
