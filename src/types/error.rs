//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Every failure below the drafting pipeline is classified into one of the
//! variants of [`SrsError`] with a stable, user-presentable message, so callers
//! branch on the variant (or its [`ErrorCategory`]) and never on message text.
//!
//! ## Error Categories
//!
//! - **Auth**: Missing or rejected credential (fail fast)
//! - **RateLimit**: Local admission gate refused the call (caller waits)
//! - **Transient**: Provider/network trouble that outlived the retry budget
//! - **Provider**: Provider rejected the request for a non-transient reason
//! - **Parse**: Completion could not be turned into JSON
//! - **Schema**: Completion stayed structurally invalid after the corrective retry
//! - **Domain**: Normalizer rejected a structurally valid result
//! - **Config**: Local misconfiguration

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Coarse error categories for transport-level mapping by calling layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credential missing or rejected
    Auth,
    /// Local rate limit reached - caller should wait
    RateLimit,
    /// Provider temporarily unavailable
    Transient,
    /// Provider rejected the request
    Provider,
    /// Response could not be parsed
    Parse,
    /// Response failed schema validation after retry
    Schema,
    /// Response violated an artifact invariant
    Domain,
    /// Local configuration problem
    Config,
    /// Anything else (I/O, serialization)
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "AUTH"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Provider => write!(f, "PROVIDER"),
            Self::Parse => write!(f, "PARSE_ERROR"),
            Self::Schema => write!(f, "SCHEMA"),
            Self::Domain => write!(f, "DOMAIN"),
            Self::Config => write!(f, "CONFIG"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

// =============================================================================
// Single-Attempt Failures
// =============================================================================

/// How a single provider attempt failed, before the retry policy is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    /// 401/403 - permanent misconfiguration
    Auth,
    /// Provider could not be reached
    Network,
    /// Request exceeded the per-attempt timeout
    Timeout,
    /// 429/500/503 - worth retrying
    Transient,
    /// Anything else the provider rejected
    Permanent,
}

impl AttemptKind {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Transient)
    }
}

/// Failure of one HTTP round-trip to the provider
#[derive(Debug, Clone)]
pub struct AttemptFailure {
    pub kind: AttemptKind,
    /// HTTP status, when the provider answered
    pub status: Option<u16>,
    /// Message reported by the provider (or transport), if any
    pub message: Option<String>,
}

impl AttemptFailure {
    pub fn new(kind: AttemptKind) -> Self {
        Self {
            kind,
            status: None,
            message: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " ({})", status)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw provider responses and transport errors to [`AttemptFailure`]s
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an HTTP status returned by the provider
    ///
    /// `body` is the raw response body; the provider's own message is pulled
    /// from `{"error": {"message": ...}}` or `{"message": ...}` when present.
    pub fn classify_http_status(status: u16, body: &str) -> AttemptFailure {
        use crate::constants::retry::{AUTH_STATUSES, TRANSIENT_STATUSES};

        let kind = if AUTH_STATUSES.contains(&status) {
            AttemptKind::Auth
        } else if TRANSIENT_STATUSES.contains(&status) {
            AttemptKind::Transient
        } else {
            AttemptKind::Permanent
        };

        let failure = AttemptFailure::new(kind).with_status(status);
        match Self::provider_message(body) {
            Some(message) => failure.with_message(message),
            None => failure,
        }
    }

    /// Classify a transport-level failure (no HTTP status available)
    pub fn classify_transport(err: &reqwest::Error) -> AttemptFailure {
        if err.is_timeout() {
            AttemptFailure::new(AttemptKind::Timeout).with_message(err.to_string())
        } else if err.is_connect() || err.is_request() {
            AttemptFailure::new(AttemptKind::Network).with_message(err.to_string())
        } else {
            AttemptFailure::new(AttemptKind::Permanent).with_message(err.to_string())
        }
    }

    /// Extract the provider-reported message from an error body
    pub fn provider_message(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .and_then(|m| m.as_str())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum SrsError {
    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    /// No credential configured, or the provider refused it
    #[error("AI service credential is missing or invalid: {reason}")]
    MisconfiguredCredential { reason: String },

    /// Local admission gate refused the call
    #[error("Rate limit exceeded. Server is busy, please wait {wait_secs} seconds and try again")]
    RateLimited { wait_secs: u64 },

    /// Transient/network failures outlasted the retry budget
    #[error("AI service is temporarily unavailable. Please try again later")]
    TransientProvider {
        attempts: u32,
        last_status: Option<u16>,
    },

    /// Provider rejected the request for a non-transient reason
    #[error("AI service error: {message}")]
    PermanentProvider {
        status: Option<u16>,
        message: String,
    },

    // -------------------------------------------------------------------------
    // Response Errors
    // -------------------------------------------------------------------------
    /// Completion could not be parsed as JSON
    #[error("Malformed AI response: {0}")]
    MalformedResponse(String),

    /// Completion stayed structurally invalid after the corrective retry
    #[error("Failed to get valid JSON after retry")]
    SchemaViolation { schema: String, details: Vec<String> },

    /// A normalizer rejected a structurally valid result
    #[error("{message}")]
    DomainInvariantViolation { rule: String, message: String },

    // -------------------------------------------------------------------------
    // Local Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Prompt template '{name}': {message}")]
    Template { name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SrsError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl SrsError {
    /// Create a domain invariant violation
    pub fn domain(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DomainInvariantViolation {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Create a credential error
    pub fn credential(reason: impl Into<String>) -> Self {
        Self::MisconfiguredCredential {
            reason: reason.into(),
        }
    }

    /// Category used by calling layers to pick a transport-level response
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MisconfiguredCredential { .. } => ErrorCategory::Auth,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::TransientProvider { .. } => ErrorCategory::Transient,
            Self::PermanentProvider { .. } => ErrorCategory::Provider,
            Self::MalformedResponse(_) => ErrorCategory::Parse,
            Self::SchemaViolation { .. } => ErrorCategory::Schema,
            Self::DomainInvariantViolation { .. } => ErrorCategory::Domain,
            Self::Config(_) | Self::Template { .. } => ErrorCategory::Config,
            Self::Io(_) | Self::Json(_) | Self::Yaml(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the same call may succeed if the caller tries again later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::TransientProvider { .. }
        )
    }

    /// Stable caller-facing text, free of provider internals for
    /// transient failures and of parse details for schema failures
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedResponse(_) => "The AI returned an unreadable response".to_string(),
            Self::Io(_) | Self::Json(_) | Self::Yaml(_) => {
                "An internal error occurred while processing the request".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Whether this is the "server busy" condition
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Suggested wait before the caller tries again
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { wait_secs } => Some(Duration::from_secs(*wait_secs)),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
        assert_eq!(ErrorCategory::Schema.to_string(), "SCHEMA");
    }

    #[test]
    fn test_attempt_kind_retryable() {
        assert!(AttemptKind::Network.is_retryable());
        assert!(AttemptKind::Timeout.is_retryable());
        assert!(AttemptKind::Transient.is_retryable());
        assert!(!AttemptKind::Auth.is_retryable());
        assert!(!AttemptKind::Permanent.is_retryable());
    }

    #[test]
    fn test_classify_http_status() {
        for status in [429, 500, 503] {
            let failure = ErrorClassifier::classify_http_status(status, "");
            assert_eq!(failure.kind, AttemptKind::Transient, "status {}", status);
        }

        assert_eq!(
            ErrorClassifier::classify_http_status(401, "").kind,
            AttemptKind::Auth
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(403, "").kind,
            AttemptKind::Auth
        );

        // 502 is not in the transient list
        let bad_gateway = ErrorClassifier::classify_http_status(502, "");
        assert_eq!(bad_gateway.kind, AttemptKind::Permanent);
        assert_eq!(bad_gateway.status, Some(502));
    }

    #[test]
    fn test_provider_message_extraction() {
        let body = r#"{"error": {"message": "model not found", "type": "invalid_request_error"}}"#;
        let failure = ErrorClassifier::classify_http_status(404, body);
        assert_eq!(failure.message.as_deref(), Some("model not found"));

        assert_eq!(
            ErrorClassifier::provider_message(r#"{"message": "bad input"}"#).as_deref(),
            Some("bad input")
        );
        assert_eq!(ErrorClassifier::provider_message("<html>oops</html>"), None);
        assert_eq!(
            ErrorClassifier::provider_message(r#"{"error": {"message": "  "}}"#),
            None
        );
    }

    #[test]
    fn test_rate_limited_message() {
        let err = SrsError::RateLimited { wait_secs: 42 };
        let message = err.to_string();
        assert!(message.to_lowercase().contains("rate limit"));
        assert!(message.contains("42 seconds"));
        assert!(err.is_busy());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
        assert_eq!(err.category(), ErrorCategory::RateLimit);
    }

    #[test]
    fn test_transient_message_hides_detail() {
        let err = SrsError::TransientProvider {
            attempts: 3,
            last_status: Some(503),
        };
        assert!(err.to_string().contains("temporarily unavailable"));
        assert!(!err.to_string().contains("503"));
        assert!(!err.is_busy());
    }

    #[test]
    fn test_schema_violation_message() {
        let err = SrsError::SchemaViolation {
            schema: "sdlc".to_string(),
            details: vec!["missing model".to_string()],
        };
        assert_eq!(err.to_string(), "Failed to get valid JSON after retry");
        assert_eq!(err.category(), ErrorCategory::Schema);
    }

    #[test]
    fn test_domain_helper() {
        let err = SrsError::domain("sdlc_model", "Unrecognized process model: Chaos");
        assert_eq!(err.category(), ErrorCategory::Domain);
        assert_eq!(err.to_string(), "Unrecognized process model: Chaos");
    }

    #[test]
    fn test_retryable_and_user_message() {
        assert!(SrsError::RateLimited { wait_secs: 1 }.is_retryable());
        assert!(!SrsError::credential("missing").is_retryable());

        let malformed = SrsError::MalformedResponse("expected value at line 1".to_string());
        assert!(!malformed.user_message().contains("line 1"));

        let permanent = SrsError::PermanentProvider {
            status: Some(400),
            message: "bad request".to_string(),
        };
        assert_eq!(permanent.user_message(), "AI service error: bad request");
    }
}
