//! OpenRouter API client with automatic retry for transient errors.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{classify_http_status, LlmError, LlmErrorKind, RetryConfig};
use super::{ChatMessage, ChatResponse, LlmClient, TokenUsage, ToolCall, ToolDefinition};

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// OpenRouter chat-completions client.
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    retry_config: RetryConfig,
}

impl OpenRouterClient {
    /// Create a new client with the default retry configuration.
    pub fn new(api_key: String) -> Self {
        Self::with_retry_config(api_key, RetryConfig::default())
    }

    pub fn with_retry_config(api_key: String, retry_config: RetryConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            retry_config,
        }
    }

    /// Parse a `Retry-After` header given in seconds.
    fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    async fn execute_request(&self, request: &CompletionRequest) -> Result<ChatResponse, LlmError> {
        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network_error(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network_error(format!("Connection failed: {e}"))
                } else {
                    LlmError::network_error(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let retry_after = Self::parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let code = status.as_u16();
            return Err(match classify_http_status(code) {
                LlmErrorKind::RateLimited => LlmError::rate_limited(body, retry_after),
                LlmErrorKind::ClientError => LlmError::client_error(code, body),
                _ => LlmError::server_error(code, body),
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::parse_error(format!("Failed to parse response: {e}, body: {body}"))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::parse_error("No choices in response".to_string()))?;

        Ok(ChatResponse {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls,
            finish_reason: choice.finish_reason,
            usage: parsed
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
            model: parsed.model.or_else(|| Some(request.model.clone())),
        })
    }

    async fn execute_with_retry(
        &self,
        request: &CompletionRequest,
    ) -> anyhow::Result<ChatResponse> {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            match self.execute_request(request).await {
                Ok(response) => {
                    if attempt > 0 {
                        tracing::info!(
                            "Request succeeded after {} retries ({:?})",
                            attempt,
                            start.elapsed()
                        );
                    }
                    return Ok(response);
                }
                Err(error) => {
                    let should_retry = self.retry_config.should_retry(&error)
                        && attempt < self.retry_config.max_retries;
                    if !should_retry {
                        tracing::error!("Request failed after {} attempts: {}", attempt + 1, error);
                        return Err(anyhow::anyhow!("{error}"));
                    }

                    let remaining = self
                        .retry_config
                        .max_retry_duration
                        .saturating_sub(start.elapsed());
                    let delay = error.suggested_delay(attempt).min(remaining);
                    if delay.is_zero() {
                        tracing::warn!("Retry budget exhausted: {}", error);
                        return Err(anyhow::anyhow!("{error}"));
                    }

                    tracing::warn!(
                        "Attempt {} failed with {}, retrying in {:?}",
                        attempt + 1,
                        error.kind,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> anyhow::Result<ChatResponse> {
        let request = CompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            tools: tools.map(|t| t.to_vec()),
            tool_choice: tools.map(|_| "auto".to_string()),
        };

        tracing::debug!(model, turns = messages.len(), "sending chat completion");

        self.execute_with_retry(&request).await
    }
}

/// Wire request format (OpenAI-compatible).
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

/// Wire response format.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
