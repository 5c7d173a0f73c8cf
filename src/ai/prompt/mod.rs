//! Prompt Template System
//!
//! Artifact prompts are plain-text templates with `{{placeholder}}` slots,
//! embedded into the binary at compile time. Filling is strict: every slot
//! must receive a value, otherwise [`SrsError::Template`] is returned and no
//! half-rendered prompt ever reaches the provider.
//!
//! Substituted values are inserted verbatim and never rescanned, so user text
//! containing `{{...}}` cannot inject further substitutions.

use regex::Regex;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use crate::types::{Result, SrsError};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid placeholder regex")
});

// =============================================================================
// Built-in Templates
// =============================================================================

/// Templates shipped with the binary, one per artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTemplate {
    Sdlc,
    Srs,
    Plan,
    Design,
    Diagram,
    Code,
    Translate,
    Review,
    Edit,
}

impl BuiltinTemplate {
    pub const ALL: [BuiltinTemplate; 9] = [
        Self::Sdlc,
        Self::Srs,
        Self::Plan,
        Self::Design,
        Self::Diagram,
        Self::Code,
        Self::Translate,
        Self::Review,
        Self::Edit,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Sdlc => "sdlc_prompt.txt",
            Self::Srs => "srs_prompt.txt",
            Self::Plan => "plan_prompt.txt",
            Self::Design => "design_prompt.txt",
            Self::Diagram => "diagram_prompt.txt",
            Self::Code => "code_prompt.txt",
            Self::Translate => "translate_prompt.txt",
            Self::Review => "review_prompt.txt",
            Self::Edit => "edit_prompt.txt",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Self::Sdlc => include_str!("../../../prompts/sdlc_prompt.txt"),
            Self::Srs => include_str!("../../../prompts/srs_prompt.txt"),
            Self::Plan => include_str!("../../../prompts/plan_prompt.txt"),
            Self::Design => include_str!("../../../prompts/design_prompt.txt"),
            Self::Diagram => include_str!("../../../prompts/diagram_prompt.txt"),
            Self::Code => include_str!("../../../prompts/code_prompt.txt"),
            Self::Translate => include_str!("../../../prompts/translate_prompt.txt"),
            Self::Review => include_str!("../../../prompts/review_prompt.txt"),
            Self::Edit => include_str!("../../../prompts/edit_prompt.txt"),
        }
    }

    pub fn template(&self) -> PromptTemplate {
        PromptTemplate::new(self.file_name(), self.source())
    }
}

// =============================================================================
// Prompt Template
// =============================================================================

/// A named template with `{{placeholder}}` slots
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: Cow<'static, str>,
    text: Cow<'static, str>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<Cow<'static, str>>, text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distinct placeholder names, sorted
    pub fn placeholders(&self) -> BTreeSet<&str> {
        PLACEHOLDER
            .captures_iter(&self.text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .collect()
    }

    /// Render with the given values; every placeholder must be provided
    pub fn fill(&self, values: &[(&str, &str)]) -> Result<String> {
        let lookup: HashMap<&str, &str> = values.iter().copied().collect();

        let missing: Vec<&str> = self
            .placeholders()
            .into_iter()
            .filter(|name| !lookup.contains_key(name))
            .collect();

        if !missing.is_empty() {
            return Err(SrsError::Template {
                name: self.name.to_string(),
                message: format!("unresolved placeholder(s): {}", missing.join(", ")),
            });
        }

        let rendered = PLACEHOLDER.replace_all(&self.text, |caps: &regex::Captures<'_>| {
            lookup.get(&caps[1]).copied().unwrap_or_default().to_string()
        });

        Ok(rendered.trim_end().to_string())
    }
}
