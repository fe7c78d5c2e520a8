use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, warn};

use super::ChatBackend;
use super::types::{ApiErrorResponse, ChatCompletionResponse, ChatRequest};
use crate::errors::{CollaboratorError, ConfigError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for an OpenAI-compatible chat completions API.
///
/// Every request is bounded by the timeout given at construction; a request
/// that exceeds it fails with `CollaboratorError::Timeout`. Requests are
/// sent exactly once.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> CollaboratorError {
        if e.is_timeout() {
            warn!(timeout_secs = self.timeout.as_secs_f64(), "Chat completion timed out");
            CollaboratorError::Timeout(self.timeout)
        } else {
            CollaboratorError::Http(e)
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, CollaboratorError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Creating chat completion"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                warn!("Rate limited by chat completions API");
                return Err(CollaboratorError::RateLimited);
            }

            if let Ok(error_resp) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                error!(
                    "Chat completions API error: {} (type: {:?})",
                    error_resp.error.message, error_resp.error.error_type
                );
                return Err(CollaboratorError::Api {
                    status: status.as_u16(),
                    message: error_resp.error.message,
                });
            }

            return Err(CollaboratorError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let chat_response: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(CollaboratorError::EmptyCompletion)
    }
}
