// ElevenLabs text-to-speech provider

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::types::InlineData;
use super::SpeechProvider;
use crate::config::SpeechConfig;
use crate::errors::ProviderError;

const PROVIDER: &str = "elevenlabs";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const AUDIO_MIME: &str = "audio/mpeg";

/// ElevenLabs API client
#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    api_key: String,
    base_url: String,
    model_id: String,
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabsClient {
    pub fn new(config: &SpeechConfig) -> Result<Self, ProviderError> {
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
            model_id: config.model_id.clone(),
            stability: config.stability,
            similarity_boost: config.similarity_boost,
        })
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[async_trait]
impl SpeechProvider for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<InlineData, ProviderError> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);
        let body = SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: self.stability,
                similarity_boost: self.similarity_boost,
            },
        };

        tracing::debug!(voice_id, chars = text.len(), "Requesting ElevenLabs speech");

        let response = self
            .client
            .post(&url)
            .header("accept", AUDIO_MIME)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;

        if bytes.is_empty() {
            return Err(ProviderError::Blocked(
                "ElevenLabs returned an empty audio body".to_string(),
            ));
        }

        Ok(InlineData::from_bytes(AUDIO_MIME, &bytes))
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
