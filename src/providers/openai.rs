use super::AnalysisService;
use crate::config::Config;
use crate::error::{ScanError, ScanResult, ServiceCall};
use crate::scan::{prompts, EncodedPayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    vision_model: String,
    text_model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
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
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> ScanResult<Self> {
        let api_key = config.api_key()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ScanError::Configuration(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            vision_model: config.vision_model.clone(),
            text_model: config.text_model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    async fn complete(&self, call: ServiceCall, request: ChatRequest<'_>) -> ScanResult<String> {
        let url = format!("{}/chat/completions", self.api_url);
        tracing::debug!(model = request.model, max_tokens = request.max_tokens, "POST {url}");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScanError::service(call, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScanError::service(call, e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|env| env.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            tracing::warn!(%status, "generation service returned an error");
            return Err(ScanError::service(call, format!("{status}: {detail}")));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ScanError::service(call, format!("malformed response: {e}")))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ScanError::service(call, "malformed response: no message content"))?;

        tracing::debug!(chars = text.len(), "generation complete");
        Ok(text)
    }
}

#[async_trait]
impl AnalysisService for OpenAiClient {
    async fn analyze(&self, payload: &EncodedPayload) -> ScanResult<String> {
        let request = ChatRequest {
            model: &self.vision_model,
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: prompts::analysis_prompt(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: payload.data_uri(),
                            detail: "high",
                        },
                    },
                ]),
            }],
            max_tokens: self.max_tokens,
        };
        self.complete(ServiceCall::Analysis, request).await
    }

    async fn simplify(&self, analysis: &str) -> ScanResult<String> {
        let request = ChatRequest {
            model: &self.text_model,
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Text(prompts::simplify_prompt(analysis)),
            }],
            max_tokens: self.max_tokens,
        };
        self.complete(ServiceCall::Simplification, request).await
    }
}
