// src/services/venice_service.rs
use crate::config::{MIN_GENERATION_SIZE, VeniceConfig};
use crate::errors::{NETWORK_ERROR, PromptMintError};
use crate::models::*;
use log::{debug, info, warn};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name fragments that mark a model id as image-capable when the API does
/// not tag it. Changing this list changes which models are offered.
const IMAGE_MODEL_FRAGMENTS: &[&str] = &[
    "flux",
    "sdxl",
    "stable-diffusion",
    "sd35",
    "sd3",
    "dall-e",
    "fluently",
    "hidream",
    "lustify",
    "pony",
    "qwen-image",
];

#[derive(Debug, Serialize)]
struct ImageGenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    size: String,
    n: u32,
    response_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cfg_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImageData>,
    seed: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImageData {
    #[serde(default)]
    b64_json: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(rename = "type")]
    model_type: Option<String>,
}

pub struct VeniceService {
    config: VeniceConfig,
    client: Client,
}

impl VeniceService {
    pub fn new(config: VeniceConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    pub async fn generate_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, PromptMintError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);
        let width = request.width.unwrap_or(MIN_GENERATION_SIZE);
        let height = request.height.unwrap_or(MIN_GENERATION_SIZE);

        let body = ImageGenerationBody {
            model,
            prompt: &request.prompt,
            size: format!("{}x{}", width, height),
            n: 1,
            response_format: "b64_json",
            seed: request.seed,
            steps: request.steps,
            cfg_scale: request.cfg_scale,
            negative_prompt: request.negative_prompt.as_deref(),
        };

        info!("Requesting {}x{} image from model {}", width, height, model);

        let response = self
            .client
            .post(format!("{}/images/generations", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("Image generation request failed", e))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let status = response.status().as_u16();
        let result: ImageGenerationResponse = response.json().await.map_err(|e| {
            PromptMintError::generation(
                format!("Failed to parse generation response: {}", e),
                Some(status),
                Some("INVALID_RESPONSE".to_string()),
            )
        })?;

        debug!("Generation returned {} image(s)", result.data.len());

        Ok(GenerationResult {
            images: result
                .data
                .into_iter()
                .map(|item| GeneratedImage {
                    b64_json: item.b64_json,
                    url: item.url,
                })
                .collect(),
            model: model.to_string(),
            seed: result.seed.or(request.seed).unwrap_or_default(),
        })
    }

    /// Never fails: any error just means the API is not usable right now.
    pub async fn health_check(&self) -> bool {
        match self.fetch_models().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Venice health check failed: {}", e);
                false
            }
        }
    }

    pub async fn list_image_models(&self) -> Result<Vec<String>, PromptMintError> {
        let response = self
            .fetch_models()
            .await
            .map_err(|e| transport_error("Model listing request failed", e))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let status = response.status().as_u16();
        let models: ModelList = response.json().await.map_err(|e| {
            PromptMintError::generation(
                format!("Failed to parse model list: {}", e),
                Some(status),
                Some("INVALID_RESPONSE".to_string()),
            )
        })?;

        Ok(models
            .data
            .into_iter()
            .filter(|m| is_image_model(&m.id, m.model_type.as_deref()))
            .map(|m| m.id)
            .collect())
    }

    async fn fetch_models(&self) -> Result<Response, reqwest::Error> {
        self.client
            .get(format!("{}/models", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await
    }
}

pub fn is_image_model(id: &str, model_type: Option<&str>) -> bool {
    if model_type == Some("image") {
        return true;
    }
    let id = id.to_ascii_lowercase();
    IMAGE_MODEL_FRAGMENTS
        .iter()
        .any(|fragment| id.contains(fragment))
}

fn transport_error(context: &str, e: reqwest::Error) -> PromptMintError {
    warn!("{}: {}", context, e);
    PromptMintError::Generation {
        message: format!("{}: {}", context, e),
        status: None,
        code: NETWORK_ERROR.to_string(),
        source: Some(e),
    }
}

async fn error_from_response(response: Response) -> PromptMintError {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();

    let (message, code) = parse_error_body(&error_text);
    let message = message.unwrap_or_else(|| {
        if error_text.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        } else {
            error_text.clone()
        }
    });

    warn!("Venice returned {}: {}", status.as_u16(), message);
    PromptMintError::generation(message, Some(status.as_u16()), code)
}

/// Pulls `{error: {message, code}}` (or `{error: "text"}`) out of an error body.
fn parse_error_body(text: &str) -> (Option<String>, Option<String>) {
    let Ok(body) = serde_json::from_str::<Value>(text) else {
        return (None, None);
    };

    match &body["error"] {
        Value::String(message) => (Some(message.clone()), None),
        Value::Object(error) => {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(|m| m.to_string());
            let code = match error.get("code") {
                Some(Value::String(code)) => Some(code.clone()),
                Some(Value::Number(code)) => Some(code.to_string()),
                _ => None,
            };
            (message, code)
        }
        _ => (None, None),
    }
}
