//! OpenAI-Compatible API Provider
//!
//! LLM provider using the Chat Completions API. Any endpoint speaking the
//! same protocol (hosted or self-hosted gateway) works via `llm.api_base`.
//!
//! ## Attempt Policy
//!
//! | Outcome                          | Action                                   |
//! |----------------------------------|------------------------------------------|
//! | no API key                       | fail before any I/O                      |
//! | rate limiter refuses             | surface `RateLimited` immediately        |
//! | 401 / 403                        | fail, credential considered broken       |
//! | 429 / 500 / 503, timeout, network| retry with linear backoff                |
//! | any other status                 | fail with the provider's message         |

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{LlmProvider, RetrySchedule};
use crate::ai::rate_limiter::SharedRateLimiter;
use crate::ai::validation::strip_code_fence;
use crate::config::LlmConfig;
use crate::types::{AttemptFailure, AttemptKind, ErrorClassifier, Result, SrsError};

const SYSTEM_PROMPT: &str = "You are a senior software engineering assistant helping to draft \
requirements and design artifacts. Respond with valid JSON only.";

/// Message used when the provider rejects a request without saying why
const GENERIC_SERVICE_ERROR: &str = "the AI service could not complete the request";

/// OpenAI-compatible provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
    limiter: SharedRateLimiter,
    retry: RetrySchedule,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("retry", &self.retry)
            .finish()
    }
}

impl OpenAiProvider {
    /// Build the provider. A missing API key is not an error here; every
    /// `generate` call fails fast instead, so the rest of the tool stays usable.
    pub fn new(
        config: &LlmConfig,
        retry: RetrySchedule,
        limiter: SharedRateLimiter,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SrsError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| SecretString::from(key.to_string()));

        Ok(Self {
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
            limiter,
            retry,
        })
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        }
    }

    /// One HTTP round-trip
    async fn attempt(
        &self,
        api_key: &SecretString,
        prompt: &str,
    ) -> std::result::Result<String, AttemptFailure> {
        let url = format!("{}/chat/completions", self.api_base);
        let request = self.build_request(prompt);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(status.as_u16(), &body));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e))?;

        if let Some(usage) = &body.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Token usage"
            );
        }

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                AttemptFailure::new(AttemptKind::Permanent)
                    .with_message("the AI service returned an empty completion")
            })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            return Err(SrsError::credential(
                "no API key configured (set SRSMITH_API_KEY or llm.api_key)",
            ));
        };

        info!(
            "Generating with {} (model: {}, temperature: {})",
            self.name(),
            self.model,
            self.temperature
        );

        let start_time = Instant::now();
        let mut last_failure: Option<AttemptFailure> = None;

        for attempt in 1..=self.retry.max_attempts {
            self.limiter.try_acquire()?;

            match self.attempt(api_key, prompt).await {
                Ok(text) => {
                    debug!(
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Completion received"
                    );
                    return Ok(strip_code_fence(&text).to_string());
                }
                Err(failure) if failure.kind == AttemptKind::Auth => {
                    warn!(status = ?failure.status, "Provider rejected credential");
                    return Err(SrsError::credential(format!(
                        "the AI service rejected the API key (HTTP {})",
                        failure.status.unwrap_or_default()
                    )));
                }
                Err(failure) if !failure.is_retryable() => {
                    warn!(%failure, "Provider request failed permanently");
                    return Err(SrsError::PermanentProvider {
                        status: failure.status,
                        message: failure
                            .message
                            .unwrap_or_else(|| GENERIC_SERVICE_ERROR.to_string()),
                    });
                }
                Err(failure) => {
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        %failure,
                        "Transient provider failure"
                    );
                    last_failure = Some(failure);

                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    }
                }
            }
        }

        Err(SrsError::TransientProvider {
            attempts: self.retry.max_attempts,
            last_status: last_failure.and_then(|f| f.status),
        })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let Some(api_key) = &self.api_key else {
            return Ok(false);
        };

        let url = format!("{}/models", self.api_base);
        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("AI service is available");
                Ok(true)
            }
            Ok(resp) => {
                warn!("AI service check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("AI service check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::rate_limiter::RateLimiter;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
        })
    }

    fn provider_at(api_base: &str, timeout_secs: u64, limiter: SharedRateLimiter) -> OpenAiProvider {
        let config = LlmConfig {
            api_base: api_base.to_string(),
            api_key: Some("sk-test".to_string()),
            timeout_secs,
            ..LlmConfig::default()
        };
        OpenAiProvider::new(
            &config,
            RetrySchedule::new(3, Duration::from_millis(5)),
            limiter,
        )
        .unwrap()
    }

    fn provider_for(server: &MockServer, api_key: Option<&str>, max_requests: usize) -> OpenAiProvider {
        let config = LlmConfig {
            api_base: server.uri(),
            api_key: api_key.map(String::from),
            timeout_secs: 5,
            ..LlmConfig::default()
        };
        let limiter = RateLimiter::new(max_requests, Duration::from_secs(60)).shared();
        OpenAiProvider::new(
            &config,
            RetrySchedule::new(3, Duration::from_millis(5)),
            limiter,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_success_strips_code_fence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("```json\n{\"model\": \"Agile\"}\n```")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("sk-test"), 10);
        let text = provider.generate("recommend a model").await.unwrap();
        assert_eq!(text, "{\"model\": \"Agile\"}");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_io() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider_for(&server, None, 10);
        let err = provider.generate("hello").await.unwrap_err();
        assert!(matches!(err, SrsError::MisconfiguredCredential { .. }));
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                json!({"error": {"message": "Incorrect API key provided"}}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("sk-bad"), 10);
        let err = provider.generate("hello").await.unwrap_err();
        assert!(matches!(err, SrsError::MisconfiguredCredential { .. }));
    }

    #[tokio::test]
    async fn test_forbidden_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let limiter = RateLimiter::new(10, Duration::from_secs(60)).shared();
        let provider = provider_at(&server.uri(), 5, limiter.clone());
        let err = provider.generate("hello").await.unwrap_err();
        assert!(matches!(err, SrsError::MisconfiguredCredential { .. }));
        assert_eq!(limiter.in_window(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_host_retried_then_transient() {
        // Nothing listens on port 1
        let limiter = RateLimiter::new(10, Duration::from_secs(60)).shared();
        let provider = provider_at("http://127.0.0.1:1", 5, limiter.clone());

        let err = provider.generate("hello").await.unwrap_err();
        match err {
            SrsError::TransientProvider {
                attempts,
                last_status,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_status, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(limiter.in_window(), 3);
    }

    #[tokio::test]
    async fn test_request_timeout_retried_then_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("{}"))
                    .set_delay(Duration::from_secs(3)),
            )
            .expect(3)
            .mount(&server)
            .await;

        let limiter = RateLimiter::new(10, Duration::from_secs(60)).shared();
        let provider = provider_at(&server.uri(), 1, limiter.clone());

        let err = provider.generate("hello").await.unwrap_err();
        assert!(matches!(err, SrsError::TransientProvider { attempts: 3, .. }));
        assert_eq!(limiter.in_window(), 3);
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        assert!(provider_for(&server, Some("sk-test"), 1).health_check().await.unwrap());
        assert!(!provider_for(&server, Some("sk-other"), 1).health_check().await.unwrap());
        assert!(!provider_for(&server, None, 1).health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"ok\": true}")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("sk-test"), 10);
        let text = provider.generate("hello").await.unwrap();
        assert_eq!(text, "{\"ok\": true}");
    }

    #[tokio::test]
    async fn test_transient_exhaustion_hides_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"error": {"message": "shard 7 exploded"}})),
            )
            .expect(3)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("sk-test"), 10);
        let err = provider.generate("hello").await.unwrap_err();
        match &err {
            SrsError::TransientProvider {
                attempts,
                last_status,
            } => {
                assert_eq!(*attempts, 3);
                assert_eq!(*last_status, Some(500));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.to_string().contains("shard 7"));
    }

    #[tokio::test]
    async fn test_permanent_error_carries_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                json!({"error": {"message": "maximum context length exceeded"}}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("sk-test"), 10);
        let err = provider.generate("hello").await.unwrap_err();
        match err {
            SrsError::PermanentProvider { status, message } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "maximum context length exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_permanent_error_without_message_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("sk-test"), 10);
        let err = provider.generate("hello").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("AI service error: {}", GENERIC_SERVICE_ERROR)
        );
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_as_busy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("sk-test"), 1);
        provider.generate("first").await.unwrap();

        let err = provider.generate("second").await.unwrap_err();
        assert!(err.is_busy());
        assert!(err.to_string().to_lowercase().contains("rate limit"));
    }

    #[tokio::test]
    async fn test_retries_consume_rate_window() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        // Two admissions available: the third attempt is refused locally
        let provider = provider_for(&server, Some("sk-test"), 2);
        let err = provider.generate("hello").await.unwrap_err();
        assert!(matches!(err, SrsError::RateLimited { .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = LlmConfig {
            api_key: Some("sk-very-secret".to_string()),
            ..LlmConfig::default()
        };
        let provider = OpenAiProvider::new(
            &config,
            RetrySchedule::default(),
            RateLimiter::new(1, Duration::from_secs(1)).shared(),
        )
        .unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-very-secret"));
    }
}
