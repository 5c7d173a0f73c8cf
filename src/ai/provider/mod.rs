//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait: one logical text-generation call that
//! already includes rate limiting, retry/backoff and error classification.
//! Callers get either the trimmed completion text or a classified
//! [`SrsError`](crate::types::SrsError).
//!
//! ## Modules
//!
//! - `openai`: OpenAI-compatible Chat Completions provider
//! - `retry`: linear backoff schedule

mod openai;
mod retry;

pub use openai::OpenAiProvider;
pub use retry::RetrySchedule;

use async_trait::async_trait;
use std::sync::Arc;

use crate::ai::rate_limiter::SharedRateLimiter;
use crate::config::Config;
use crate::types::Result;

/// Shared LLM provider type for concurrent access across operations.
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// Text generation against a hosted model
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one logical generation call and return the completion text
    ///
    /// Implementations consult the shared rate limiter before every attempt,
    /// retry transient failures, and strip a wrapping JSON code fence from
    /// the answer. No JSON parsing happens at this layer.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Check if the provider is reachable with the configured credential
    async fn health_check(&self) -> Result<bool>;
}

/// Create the configured provider sharing the given rate limiter
pub fn create_provider(config: &Config, limiter: SharedRateLimiter) -> Result<SharedProvider> {
    let provider = OpenAiProvider::new(
        &config.llm,
        RetrySchedule::from_config(&config.retry),
        limiter,
    )?;
    Ok(Arc::new(provider))
}
