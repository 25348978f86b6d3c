//! Text generation client
//!
//! Sends the trigger report to an OpenAI-compatible chat completions
//! endpoint and parses the reply into three recommendations.

use crate::recommend::prompt::{build_prompt, parse_recommendations, SYSTEM_PROMPT};
use crate::recommend::{RecommendError, RecommendationRequest, Recommender};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Configuration for the text generation client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGenConfig {
    /// Base URL of the service (e.g., "https://api.openai.com")
    pub base_url: String,
    /// Model name passed through unchanged
    pub model: String,
    /// Bearer token, if the service needs one
    pub api_key: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum attempts per recommendation request
    pub max_retries: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for TextGenConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            request_timeout_ms: 20_000,
            max_retries: 3,
            temperature: 0.4,
            max_tokens: 400,
        }
    }
}

/// Recommender backed by a chat completions endpoint
pub struct TextGenRecommender {
    client: Client,
    config: TextGenConfig,
}

impl TextGenRecommender {
    pub fn new(config: TextGenConfig) -> Result<Self, RecommendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TextGenConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }

    /// POST the completion request, retrying transport failures and 429s
    async fn complete(&self, prompt: &str) -> Result<String, RecommendError> {
        let url = self.completions_url();
        let body = self.request_body(prompt);
        let mut last_error = RecommendError::Unavailable;

        for attempt in 0..self.config.max_retries.max(1) {
            if attempt > 0 {
                // Quadratic backoff: 1s, 4s, 9s...
                let delay = std::time::Duration::from_secs((attempt as u64).pow(2));
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&url).json(&body);
            if let Some(key) = &self.config.api_key {
                request = request.bearer_auth(key);
            }

            tracing::debug!(url = %url, attempt, "Requesting recommendations");

            match request.send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        let reply: ChatCompletionResponse = response.json().await?;
                        return reply
                            .choices
                            .into_iter()
                            .next()
                            .map(|choice| choice.message.content)
                            .ok_or_else(|| {
                                RecommendError::InvalidResponse(
                                    "missing choices[0].message.content".to_string(),
                                )
                            });
                    } else if response.status().as_u16() == 429 {
                        if let Some(retry_after) = response.headers().get("Retry-After") {
                            if let Ok(secs) = retry_after.to_str().unwrap_or("5").parse::<u64>() {
                                tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
                            }
                        }
                        last_error = RecommendError::RateLimited;
                        continue;
                    } else {
                        let status = response.status();
                        let text = response.text().await.unwrap_or_default();
                        return Err(RecommendError::ApiError {
                            status: status.as_u16(),
                            message: text,
                        });
                    }
                }
                Err(e) => {
                    last_error = if e.is_timeout() {
                        RecommendError::Timeout
                    } else if e.is_connect() {
                        RecommendError::Unavailable
                    } else {
                        RecommendError::Request(e)
                    };
                    continue;
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl Recommender for TextGenRecommender {
    fn name(&self) -> &str {
        "text_generation"
    }

    async fn recommend(
        &self,
        request: RecommendationRequest<'_>,
    ) -> Result<Vec<String>, RecommendError> {
        let prompt = build_prompt(request.report, request.records);
        let content = self.complete(&prompt).await?;
        parse_recommendations(&content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}
