//! Google Gemini gateway over the Generative Language REST API

use async_trait::async_trait;
use prism_application::{GatewayError, LlmGateway, LlmSession};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Shared HTTP state; sessions hold a clone
#[derive(Clone)]
struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    async fn generate(
        &self,
        model: &str,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        let body = GenerateRequest {
            system_instruction: (!system_prompt.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part {
                    text: system_prompt,
                }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
        };
        let url = format!("{}/models/{}:generateContent", self.endpoint, model);
        debug!(model, prompt_chars = prompt.len(), "Sending Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(model, %status, "Gemini request failed");
            return Err(match status {
                StatusCode::NOT_FOUND => GatewayError::ModelNotAvailable(model.to_string()),
                _ => GatewayError::RequestFailed(format!("{}: {}", status, truncate(&detail))),
            });
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?
            .text()
            .ok_or_else(|| GatewayError::InvalidResponse("response has no text".to_string()))
    }
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// LLM gateway backed by the Gemini API
pub struct GeminiGateway {
    inner: GeminiClient,
}

impl GeminiGateway {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GatewayError::ConnectionError("missing API key".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        Ok(Self {
            inner: GeminiClient {
                client,
                endpoint: endpoint
                    .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                api_key,
            },
        })
    }
}

#[async_trait]
impl LlmGateway for GeminiGateway {
    async fn create_session_with_system_prompt(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(GeminiSession {
            client: self.inner.clone(),
            model: model.to_string(),
            system_prompt: system_prompt.to_string(),
        }))
    }

    async fn available_models(&self) -> Result<Vec<String>, GatewayError> {
        let url = format!("{}/models", self.inner.endpoint);
        let response = self
            .inner
            .client
            .get(&url)
            .header("x-goog-api-key", &self.inner.api_key)
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(GatewayError::RequestFailed(response.status().to_string()));
        }
        let list = response
            .json::<ModelList>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok(list
            .models
            .into_iter()
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }
}

/// One model plus system prompt; each `send` is a single-turn request
pub struct GeminiSession {
    client: GeminiClient,
    model: String,
    system_prompt: String,
}

#[async_trait]
impl LlmSession for GeminiSession {
    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        self.client
            .generate(&self.model, &self.system_prompt, content)
            .await
    }
}
