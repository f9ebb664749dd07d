//! Hosted vision-model calls via an OpenAI-compatible chat-completions API.

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tracing::{error, info};

use super::image_prep::{decode_base64_image, prepare_image, IMAGE_MEDIA_TYPE};
use super::parse::parse_analysis_response;
use super::prompts::build_analysis_prompt;
use super::types::AnalysisResult;
use crate::config::AppConfig;
use crate::error::AnalysisError;

const REQUEST_TIMEOUT_SECS: u64 = 60;

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(serde::Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

/// Client for the hosted vision-language endpoint.
pub struct VisionClient {
    client: Client,
    chat_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl VisionClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let chat_url = format!(
            "{}/chat/completions",
            config.api_base_url.as_str().trim_end_matches('/')
        );
        info!(
            "Vision client configured: endpoint={}, model={}",
            chat_url, config.model_name
        );

        Ok(Self {
            client,
            chat_url,
            api_key: config.api_key.clone(),
            model: config.model_name.clone(),
            temperature: config.model_temperature,
            max_tokens: config.max_completion_tokens,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Send one analysis request and return the raw reply text.
    ///
    /// # Errors
    /// `AnalysisError::Upstream` on network failure, non-2xx status, or a
    /// malformed API envelope.
    pub async fn request_analysis(&self, base64_image: &str) -> Result<String, AnalysisError> {
        let data_url = format!("data:{};base64,{}", IMAGE_MEDIA_TYPE, base64_image);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: serde_json::json!([
                    {"type": "text", "text": build_analysis_prompt()},
                    {"type": "image_url", "image_url": {"url": data_url}}
                ]),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.chat_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let msg = if e.is_timeout() {
                    format!("Request timed out after {}s", REQUEST_TIMEOUT_SECS)
                } else {
                    format!("Request failed: {}", e)
                };
                error!("{}", msg);
                AnalysisError::Upstream(msg)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            let msg = format!("{} from model endpoint: {}", status, truncate(&body, 1024));
            error!("{}", msg);
            return Err(AnalysisError::Upstream(msg));
        }

        let envelope: ChatResponse = response.json().await.map_err(|e| {
            AnalysisError::Upstream(format!("Malformed API response envelope: {}", e))
        })?;

        if let Some(usage) = &envelope.usage {
            info!("Model call completed ({} tokens)", usage.total_tokens);
        }

        envelope
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AnalysisError::Upstream("No choices in API response".to_string()))
    }
}

/// Analyze raw image bytes for leaf disease.
///
/// An empty upload short-circuits to an `invalid_image` result without
/// touching the decoder or the network.
pub async fn analyze_image(
    client: &VisionClient,
    image_bytes: &[u8],
) -> Result<AnalysisResult, AnalysisError> {
    if image_bytes.is_empty() {
        info!("Empty image upload, returning invalid_image result");
        return Ok(AnalysisResult::invalid_image());
    }

    info!("Starting leaf analysis ({} bytes)", image_bytes.len());
    let base64_image = prepare_image(image_bytes)?;
    let raw_reply = client.request_analysis(&base64_image).await?;
    let result = parse_analysis_response(&raw_reply)?;

    info!(
        "Analysis complete: detected={}, type={}, confidence={}",
        result.disease_detected, result.disease_type, result.confidence
    );
    Ok(result)
}

/// Analyze a base64 image payload (raw base64 or a `data:` URL).
pub async fn analyze_image_base64(
    client: &VisionClient,
    payload: &str,
) -> Result<AnalysisResult, AnalysisError> {
    let image_bytes = decode_base64_image(payload)?;
    analyze_image(client, &image_bytes).await
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
