//! Draft Command
//!
//! Run one artifact operation against the configured provider and print the
//! validated JSON.
//!
//! Usage:
//!   srsmith draft sdlc --text "A booking app for yoga studios"
//!   srsmith draft plan --input idea.md --model Scrum
//!   srsmith draft diagram --input idea.md --kind er
//!   srsmith draft translate --input main.py --from Python --language Go
//!   srsmith draft edit --input section.md --instruction "Tighten the wording"

use std::path::PathBuf;

use tracing::debug;

use crate::ai::normalize::DiagramKind;
use crate::cli::ui::Output;
use crate::cli::util::{InputSource, load_config, require_arg};
use crate::drafting::{ArtifactKind, Drafter};
use crate::types::{Result, SrsError};

/// Arguments of `srsmith draft`
#[derive(Debug, Clone)]
pub struct DraftOptions {
    pub artifact: ArtifactKind,
    pub input: Option<PathBuf>,
    pub text: Option<String>,
    /// Diagram kind (`diagram`)
    pub kind: Option<String>,
    /// Target language (`code`, `translate`, `review`)
    pub language: Option<String>,
    /// Source language (`translate`)
    pub from: Option<String>,
    /// Process model (`plan`)
    pub model: Option<String>,
    /// Edit instruction (`edit`)
    pub instruction: Option<String>,
    pub config: Option<PathBuf>,
}

pub async fn run(options: DraftOptions) -> Result<()> {
    let config = load_config(options.config.as_deref())?;
    let drafter = Drafter::from_config(&config)?;
    let input = InputSource::from_args(options.input.clone(), options.text.clone())?.read()?;

    debug!(artifact = ?options.artifact, chars = input.len(), "Running draft");
    let output = Output::new();

    match options.artifact {
        ArtifactKind::Sdlc => output.json(&drafter.recommend_sdlc(&input).await?),
        ArtifactKind::Srs => output.json(&drafter.draft_srs(&input).await?),
        ArtifactKind::Plan => {
            let model = require_arg(options.model.as_deref(), "--model", "plan")?;
            output.json(&drafter.project_plan(&input, model).await?)
        }
        ArtifactKind::Design => output.json(&drafter.system_design(&input).await?),
        ArtifactKind::Diagram => {
            let kind = parse_kind(options.kind.as_deref())?;
            output.json(&drafter.generate_diagram(kind, &input).await?)
        }
        ArtifactKind::Code => {
            let language = require_arg(options.language.as_deref(), "--language", "code")?;
            output.json(&drafter.generate_code(&input, language).await?)
        }
        ArtifactKind::Translate => {
            let from = require_arg(options.from.as_deref(), "--from", "translate")?;
            let to = require_arg(options.language.as_deref(), "--language", "translate")?;
            output.json(&drafter.translate_code(&input, from, to).await?)
        }
        ArtifactKind::Review => {
            let language = options
                .language
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or("source");
            output.json(&drafter.review_code(&input, language).await?)
        }
        ArtifactKind::Edit => {
            let instruction =
                require_arg(options.instruction.as_deref(), "--instruction", "edit")?;
            output.json(&drafter.suggest_edit(&input, instruction).await?)
        }
    }
}

/// Diagram kind from `--kind`, flowchart when absent
pub fn parse_kind(kind: Option<&str>) -> Result<DiagramKind> {
    match kind {
        None => Ok(DiagramKind::Flowchart),
        Some(name) => DiagramKind::parse(name).ok_or_else(|| {
            SrsError::Config(format!(
                "Unknown diagram kind '{}'. Valid values: flowchart, sequence, class, state, er",
                name
            ))
        }),
    }
}
