//! OpenAI-compatible completion client with retry and backoff
//!
//! This is the only retry/backoff logic in the system: rate-limited and
//! transport-failed requests are retried with exponentially increasing
//! delay, bounded by an attempt count and a total elapsed-time cap. Other
//! upstream errors surface immediately.

use crate::config::CompletionConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Completion call error types
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("rate limited by completion API: {0}")]
    RateLimited(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("completion API key is not configured")]
    MissingApiKey,
}

/// Seam between the fact extractor and the remote completion service
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send a prompt and return the model's text response
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Completion client for an OpenAI-compatible chat API
pub struct CompletionClient {
    http: Client,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Exponential backoff for the given 1-based attempt number
    fn calculate_backoff(&self, attempt: usize) -> Duration {
        let base = self.config.retry_backoff();
        let multiplier = 2_u32.pow((attempt - 1) as u32);
        base.saturating_mul(multiplier)
    }

    /// One request, no retries
    async fn call_api(&self, prompt: &str) -> Result<String, CompletionError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(CompletionError::MissingApiKey)?;

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        debug!("Calling completion API: model={}", self.config.model);

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::RateLimited(body));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                message: body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("no choices in response".to_string()))?;

        Ok(choice.message.content)
    }

    fn should_retry(error: &CompletionError) -> bool {
        matches!(
            error,
            CompletionError::RateLimited(_) | CompletionError::Transport(_)
        )
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.call_api(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if Self::should_retry(&e) => {
                    if attempt >= self.config.max_retries {
                        error!("Completion failed after {} attempts: {}", attempt, e);
                        return Err(e);
                    }

                    let backoff = self.calculate_backoff(attempt);
                    if started.elapsed() + backoff > self.config.max_elapsed() {
                        error!(
                            "Completion retry window exhausted after {:?}: {}",
                            started.elapsed(),
                            e
                        );
                        return Err(e);
                    }

                    crate::metrics::METRICS.completion_retries.inc();
                    warn!(
                        "Completion attempt {} failed: {}, retrying in {:?}",
                        attempt, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    error!("Completion failed: {}", e);
                    return Err(e);
                }
            }
        }
    }
}

// OpenAI-compatible wire types
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(api_url: String) -> CompletionConfig {
        CompletionConfig {
            api_url,
            api_key: Some("test-key".to_string()),
            retry_backoff_ms: 1,
            ..Default::default()
        }
    }

    fn completion_body(text: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        })
        .to_string()
    }

    #[test]
    fn test_calculate_backoff() {
        let client = CompletionClient::new(CompletionConfig::default()).unwrap();
        assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
        assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
        assert_eq!(client.calculate_backoff(3), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(completion_body("fact one\nfact two"))
            .create_async()
            .await;

        let url = format!("{}/v1/chat/completions", server.url());
        let client = CompletionClient::new(test_config(url)).unwrap();

        let text = client.complete("Question: q\nDocument: d").await.unwrap();
        assert_eq!(text, "fact one\nfact two");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retries_on_rate_limit_then_succeeds() {
        use axum::http::StatusCode;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        // Upstream that rate-limits the first request and succeeds after
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = axum::Router::new().route(
            "/v1/chat/completions",
            axum::routing::post(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        (StatusCode::TOO_MANY_REQUESTS, "slow down".to_string())
                    } else {
                        (StatusCode::OK, completion_body("recovered"))
                    }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let url = format!("http://{}/v1/chat/completions", addr);
        let client = CompletionClient::new(test_config(url)).unwrap();

        let text = client.complete("prompt").await.unwrap();
        assert_eq!(text, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_attempts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .expect(3)
            .create_async()
            .await;

        let url = format!("{}/v1/chat/completions", server.url());
        let client = CompletionClient::new(test_config(url)).unwrap();

        let result = client.complete("prompt").await;
        assert!(matches!(result, Err(CompletionError::RateLimited(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upstream_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("boom")
            .expect(1)
            .create_async()
            .await;

        let url = format!("{}/v1/chat/completions", server.url());
        let client = CompletionClient::new(test_config(url)).unwrap();

        let result = client.complete("prompt").await;
        assert!(matches!(
            result,
            Err(CompletionError::Upstream { status: 500, .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let mut config = test_config("http://localhost:1/unused".to_string());
        config.api_key = None;
        let client = CompletionClient::new(config).unwrap();

        let result = client.complete("prompt").await;
        assert!(matches!(result, Err(CompletionError::MissingApiKey)));
    }
}
