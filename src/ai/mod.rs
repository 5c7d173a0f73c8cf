//! AI Integration Layer
//!
//! Everything between a filled prompt and a trusted JSON value:
//! rate limiting, the provider client, response validation with one
//! corrective retry, and domain normalizers.

pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod rate_limiter;
pub mod validation;

pub use pipeline::{RetryPolicy, build_retry_prompt, generate_validated, generate_validated_with};
pub use prompt::{BuiltinTemplate, PromptTemplate};
pub use provider::{
    LlmProvider, OpenAiProvider, RetrySchedule, SharedProvider, create_provider,
};
pub use rate_limiter::{Clock, ManualClock, RateLimiter, SharedRateLimiter, SystemClock};
pub use validation::{ResponseSchema, extract_json, parse_repaired};
