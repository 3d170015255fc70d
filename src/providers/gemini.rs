// Google Gemini API provider implementation
//
// One client covers three capabilities: text (generateContent), image
// (generateContent with image modality), and video (Veo predictLongRunning +
// operation polling).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::retry::with_retry;
use super::types::{
    InlineData, OperationHandle, OperationStatus, ResponseFormat, TextRequest, VideoRequest,
};
use super::{ImageProvider, TextProvider, VideoProvider};
use crate::config::GeminiConfig;
use crate::errors::ProviderError;

const PROVIDER: &str = "gemini";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Google Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    video_model: String,
}

impl GeminiClient {
    /// Create a new Gemini client from configuration
    pub fn new(config: &GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            video_model: config.video_model.clone(),
        })
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    /// POST a generateContent request for `model` and return the parsed response.
    async fn generate_content(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiResponse, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        tracing::debug!(model, "Sending generateContent request to Gemini");

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Gemini response: {e}")))
    }

    /// Single poll of a video operation (no retry)
    async fn poll_once(&self, handle: &OperationHandle) -> Result<OperationStatus, ProviderError> {
        let url = format!("{}/{}", self.base_url, handle.0);
        let response = self
            .client
            .get(&url)
            .query(&[("key", &self.api_key)])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let operation: GeminiOperation = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Veo operation: {e}")))?;

        Ok(operation.into_status())
    }
}

fn transport(source: reqwest::Error) -> ProviderError {
    ProviderError::Transport {
        provider: PROVIDER,
        source,
    }
}

fn user_content(prompt: &str, attachments: &[InlineData]) -> GeminiContent {
    let mut parts = vec![GeminiPart::text(prompt)];
    parts.extend(attachments.iter().cloned().map(GeminiPart::inline));
    GeminiContent {
        role: "user".to_string(),
        parts,
    }
}

#[async_trait]
impl TextProvider for GeminiClient {
    async fn generate_text(&self, request: &TextRequest) -> Result<String, ProviderError> {
        let body = GeminiRequest {
            contents: vec![user_content(&request.prompt, &request.attachments)],
            generation_config: Some(GeminiGenerationConfig {
                response_mime_type: match request.response_format {
                    ResponseFormat::Json => Some("application/json".to_string()),
                    ResponseFormat::Text => None,
                },
                response_modalities: None,
            }),
        };

        let response = self.generate_content(&self.text_model, &body).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(ProviderError::Blocked(response.block_description(
                "Gemini returned no text",
            )));
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[async_trait]
impl ImageProvider for GeminiClient {
    async fn generate_image(
        &self,
        prompt: &str,
        references: &[InlineData],
    ) -> Result<InlineData, ProviderError> {
        let body = GeminiRequest {
            contents: vec![user_content(prompt, references)],
            generation_config: Some(GeminiGenerationConfig {
                response_mime_type: None,
                response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
            }),
        };

        let response = self.generate_content(&self.image_model, &body).await?;
        response.first_inline_data().ok_or_else(|| {
            ProviderError::Blocked(response.block_description(
                "Model did not return an image part. The prompt may have been blocked.",
            ))
        })
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[async_trait]
impl VideoProvider for GeminiClient {
    async fn submit(&self, request: &VideoRequest) -> Result<OperationHandle, ProviderError> {
        let url = format!(
            "{}/models/{}:predictLongRunning",
            self.base_url, self.video_model
        );

        // Veo only accepts portrait or landscape; square formats fall back to the model default.
        let aspect_ratio = matches!(request.aspect_ratio.as_str(), "9:16" | "16:9")
            .then(|| request.aspect_ratio.clone());

        let body = VeoRequest {
            instances: vec![VeoInstance {
                prompt: request.prompt.clone(),
                image: VeoImage {
                    bytes_base64_encoded: request.source_image.data.clone(),
                    mime_type: request.source_image.mime_type.clone(),
                },
            }],
            parameters: VeoParameters {
                sample_count: 1,
                aspect_ratio,
            },
        };

        tracing::debug!(model = %self.video_model, "Submitting Veo video job");

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let operation: GeminiOperation = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Veo submit: {e}")))?;

        if operation.name.is_empty() {
            return Err(ProviderError::MalformedResponse(
                "Veo submit returned no operation name".to_string(),
            ));
        }
        Ok(OperationHandle(operation.name))
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, ProviderError> {
        with_retry(|| self.poll_once(handle)).await
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// Gemini API types

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }

    fn inline(data: InlineData) -> Self {
        Self {
            text: None,
            inline_data: Some(data),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GeminiResponse {
    fn parts(&self) -> impl Iterator<Item = &GeminiPart> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.parts()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    fn first_inline_data(&self) -> Option<InlineData> {
        self.parts().find_map(|p| p.inline_data.clone())
    }

    /// Human-readable reason for an empty answer, including any block/finish reason.
    fn block_description(&self, fallback: &str) -> String {
        let block = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref());
        let finish = self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref());
        match (block, finish) {
            (Some(reason), _) => format!("{fallback} (blocked: {reason})"),
            (None, Some(reason)) if reason != "STOP" => format!("{fallback} (finish reason: {reason})"),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct VeoRequest {
    instances: Vec<VeoInstance>,
    parameters: VeoParameters,
}

#[derive(Debug, Clone, Serialize)]
struct VeoInstance {
    prompt: String,
    image: VeoImage,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    sample_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiOperation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<GeminiOperationError>,
    #[serde(default)]
    response: Option<VeoResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiOperationError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoResponse {
    #[serde(default)]
    generate_video_response: Option<VeoGeneratedVideos>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoGeneratedVideos {
    #[serde(default)]
    generated_samples: Vec<VeoSample>,
}

#[derive(Debug, Clone, Deserialize)]
struct VeoSample {
    video: Option<VeoVideo>,
}

#[derive(Debug, Clone, Deserialize)]
struct VeoVideo {
    uri: Option<String>,
}

impl GeminiOperation {
    fn into_status(self) -> OperationStatus {
        if let Some(error) = self.error {
            return OperationStatus::Failed {
                message: error
                    .message
                    .unwrap_or_else(|| "Unknown video generation error.".to_string()),
            };
        }
        if !self.done {
            return OperationStatus::Pending;
        }
        let uri = self
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|r| r.generated_samples.into_iter().next())
            .and_then(|s| s.video)
            .and_then(|v| v.uri);
        match uri {
            Some(uri) => OperationStatus::Done { uri },
            None => OperationStatus::Failed {
                message: "Video generation finished but no video URI was found.".to_string(),
            },
        }
    }
}
