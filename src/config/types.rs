//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (user config dir) and project (.srsmith/) level configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{network, rate_limit, retry, validation};
use crate::types::{Result, SrsError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Outbound call admission settings
    pub rate_limit: RateLimitConfig,

    /// Retry behavior for provider calls and schema correction
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `SrsError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(SrsError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(SrsError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        url::Url::parse(&self.llm.api_base).map_err(|e| {
            SrsError::Config(format!("Invalid llm.api_base '{}': {}", self.llm.api_base, e))
        })?;

        if self.rate_limit.max_requests == 0 {
            return Err(SrsError::Config(
                "rate_limit.max_requests must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.window_ms == 0 {
            return Err(SrsError::Config(
                "rate_limit.window_ms must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(SrsError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.corrective_attempts != validation::CORRECTIVE_ATTEMPTS {
            return Err(SrsError::Config(format!(
                "retry.corrective_attempts is fixed at {}, got {}",
                validation::CORRECTIVE_ATTEMPTS,
                self.retry.corrective_attempts
            )));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// LLM provider configuration
///
/// The API key is never serialized and is redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    pub api_base: String,

    /// Model name
    pub model: String,

    /// API key; falls back to SRSMITH_API_KEY / OPENAI_API_KEY
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-attempt request timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for generation
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: usize,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: network::DEFAULT_API_BASE.to_string(),
            model: network::DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.2,
            max_tokens: network::DEFAULT_MAX_TOKENS,
        }
    }
}

// =============================================================================
// Rate Limit Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum admitted calls per window
    pub max_requests: usize,

    /// Window length in milliseconds
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: rate_limit::MAX_REQUESTS,
            window_ms: rate_limit::WINDOW_MS,
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Provider attempts per logical call
    pub max_attempts: u32,

    /// Linear backoff step in milliseconds
    pub backoff_base_ms: u64,

    /// Validation rounds (original plus corrective); only 2 is accepted
    pub corrective_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            backoff_base_ms: retry::BACKOFF_BASE_MS,
            corrective_attempts: validation::CORRECTIVE_ATTEMPTS,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
