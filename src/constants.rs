//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Rate limiter constants
pub mod rate_limit {
    /// Maximum admitted LLM calls per window
    pub const MAX_REQUESTS: usize = 15;

    /// Rolling window length (milliseconds)
    pub const WINDOW_MS: u64 = 60_000;
}

/// LLM client retry constants
pub mod retry {
    /// Total attempts per logical generation call (first try included)
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Linear backoff step; attempt `n` waits `n * BACKOFF_BASE_MS` before the next one
    pub const BACKOFF_BASE_MS: u64 = 800;

    /// HTTP statuses treated as transient provider failures
    pub const TRANSIENT_STATUSES: [u16; 3] = [429, 500, 503];

    /// HTTP statuses treated as a broken credential
    pub const AUTH_STATUSES: [u16; 2] = [401, 403];
}

/// Schema retry orchestration constants
pub mod validation {
    /// Validation rounds per logical operation: the original call plus one corrective call
    pub const CORRECTIVE_ATTEMPTS: u32 = 2;

    /// Maximum characters of raw completion echoed into log lines
    pub const LOG_PREVIEW_CHARS: usize = 200;
}

/// Network constants
pub mod network {
    /// Per-attempt request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Default OpenAI-compatible API base
    pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

    /// Default model identifier
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

    /// Default completion budget
    pub const DEFAULT_MAX_TOKENS: usize = 4096;
}

/// Domain normalizer constants
pub mod normalize {
    /// Confidence assigned when the model omits it or returns a non-number
    pub const DEFAULT_CONFIDENCE: f64 = 0.5;

    /// Upper bound for code review scores
    pub const MAX_REVIEW_SCORE: f64 = 10.0;

    /// Process models accepted for an SDLC recommendation
    pub const SDLC_MODELS: [&str; 10] = [
        "Waterfall",
        "Agile",
        "Scrum",
        "Kanban",
        "Spiral",
        "V-Model",
        "Iterative",
        "Incremental",
        "RAD",
        "DevOps",
    ];

    /// Requirement priorities, canonical spelling
    pub const PRIORITIES: [&str; 3] = ["High", "Medium", "Low"];

    /// Code review issue severities, canonical spelling
    pub const SEVERITIES: [&str; 4] = ["critical", "major", "minor", "info"];
}
