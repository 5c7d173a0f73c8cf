//! srsmith - LLM-Assisted Requirements Drafting
//!
//! Drafts software requirements specifications and their companion artifacts
//! (SDLC recommendation, project plan, system design, Mermaid diagrams, code,
//! code review, section edits) through an OpenAI-compatible chat API, and
//! refuses to hand back anything that is not well-formed.
//!
//! ## Reliability Pipeline
//!
//! - **Rate Limiter**: sliding-window admission gate shared by every call
//! - **Provider Client**: bounded retry with linear backoff on transient failures
//! - **JSON Extraction**: recovers the payload from prose and code fences
//! - **Parse and Repair**: one backslash-escaping pass before giving up
//! - **Schema Validation**: Draft 7 schemas with exactly one corrective retry
//! - **Normalizers**: per-artifact clamping, allow-lists, and diagram repair
//!
//! ## Quick Start
//!
//! ```ignore
//! use srsmith::{ConfigLoader, Drafter};
//!
//! let config = ConfigLoader::load()?;
//! let drafter = Drafter::from_config(&config)?;
//! let recommendation = drafter.recommend_sdlc("A booking app for yoga studios").await?;
//! println!("{} ({:.2})", recommendation.model, recommendation.confidence);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: rate limiter, provider, validation, prompt templates, normalizers
//! - [`drafting`]: artifact operations and their schemas
//! - [`config`]: layered configuration
//! - [`types`]: error taxonomy

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod drafting;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, Result, SrsError};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use ai::{
    LlmProvider, OpenAiProvider, RateLimiter, ResponseSchema, SharedProvider, SharedRateLimiter,
    generate_validated,
};

pub use drafting::{ArtifactKind, Drafter};
