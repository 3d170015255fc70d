// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::constants::*;

/// Gemini text, image, and video models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    #[serde(default = "default_video_model")]
    pub video_model: String,
}

impl GeminiConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_gemini_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            video_model: default_video_model(),
        }
    }
}

/// ElevenLabs speech synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_speech_base_url")]
    pub base_url: String,

    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    #[serde(default = "default_speech_model")]
    pub model_id: String,

    #[serde(default = "default_stability")]
    pub stability: f32,

    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
}

impl SpeechConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_speech_base_url(),
            voice_id: default_voice_id(),
            model_id: default_speech_model(),
            stability: DEFAULT_STABILITY,
            similarity_boost: DEFAULT_SIMILARITY_BOOST,
        }
    }
}

/// Improve-loop and video polling knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_video_min_improvement")]
    pub video_min_improvement: f64,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_video_max_wait_secs")]
    pub video_max_wait_secs: u64,

    /// Append every critique to this JSONL file (optional)
    #[serde(default)]
    pub critique_log: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            video_min_improvement: DEFAULT_VIDEO_MIN_IMPROVEMENT,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            video_max_wait_secs: DEFAULT_VIDEO_MAX_WAIT_SECS,
            critique_log: None,
        }
    }
}

impl PipelineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn video_max_wait(&self) -> Duration {
        Duration::from_secs(self.video_max_wait_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gemini: GeminiConfig,

    pub speech: SpeechConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn new(gemini: GeminiConfig, speech: SpeechConfig) -> Self {
        Self {
            gemini,
            speech,
            pipeline: PipelineConfig::default(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.gemini.api_key.trim().is_empty() {
            bail!("Gemini API key is not set ([gemini] api_key or GEMINI_API_KEY)");
        }
        if self.speech.api_key.trim().is_empty() {
            bail!("ElevenLabs API key is not set ([speech] api_key or ELEVENLABS_API_KEY)");
        }
        if self.speech.voice_id.trim().is_empty() {
            bail!("[speech] voice_id must not be empty");
        }
        for (name, value) in [
            ("stability", self.speech.stability),
            ("similarity_boost", self.speech.similarity_boost),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("[speech] {} must be between 0.0 and 1.0, got {}", name, value);
            }
        }

        let pipeline = &self.pipeline;
        if !(1..=MAX_ITERATIONS).contains(&pipeline.max_iterations) {
            bail!(
                "[pipeline] max_iterations must be between 1 and {}, got {}",
                MAX_ITERATIONS,
                pipeline.max_iterations
            );
        }
        if pipeline.poll_interval_secs == 0 {
            bail!("[pipeline] poll_interval_secs must be greater than zero");
        }
        if pipeline.video_max_wait_secs < pipeline.poll_interval_secs {
            bail!(
                "[pipeline] video_max_wait_secs ({}) must be at least poll_interval_secs ({})",
                pipeline.video_max_wait_secs,
                pipeline.poll_interval_secs
            );
        }
        if !(0.0..1.0).contains(&pipeline.video_min_improvement) {
            bail!(
                "[pipeline] video_min_improvement must be in [0.0, 1.0), got {}",
                pipeline.video_min_improvement
            );
        }

        Ok(())
    }
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_video_model() -> String {
    DEFAULT_VIDEO_MODEL.to_string()
}

fn default_speech_base_url() -> String {
    DEFAULT_SPEECH_BASE_URL.to_string()
}

fn default_voice_id() -> String {
    DEFAULT_VOICE_ID.to_string()
}

fn default_speech_model() -> String {
    DEFAULT_SPEECH_MODEL.to_string()
}

fn default_stability() -> f32 {
    DEFAULT_STABILITY
}

fn default_similarity_boost() -> f32 {
    DEFAULT_SIMILARITY_BOOST
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

fn default_video_min_improvement() -> f64 {
    DEFAULT_VIDEO_MIN_IMPROVEMENT
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_video_max_wait_secs() -> u64 {
    DEFAULT_VIDEO_MAX_WAIT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config::new(
            GeminiConfig::with_api_key("gemini-key"),
            SpeechConfig::with_api_key("eleven-key"),
        )
    }

    #[test]
    fn test_defaults() {
        let config = valid();
        assert_eq!(config.pipeline.max_iterations, 3);
        assert_eq!(config.pipeline.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.pipeline.video_max_wait(), Duration::from_secs(600));
        assert_eq!(config.speech.voice_id, "21m00Tcm4TlvDq8ikWAM");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_keys() {
        let mut config = valid();
        config.gemini.api_key = "  ".into();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.speech.api_key.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_polling() {
        let mut config = valid();
        config.pipeline.poll_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.pipeline.video_max_wait_secs = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_thresholds() {
        let mut config = valid();
        config.pipeline.video_min_improvement = 1.5;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.speech.stability = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_iteration_cap_out_of_range() {
        for max_iterations in [0, MAX_ITERATIONS + 1, 10] {
            let mut config = valid();
            config.pipeline.max_iterations = max_iterations;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("max_iterations"));
        }

        let mut config = valid();
        config.pipeline.max_iterations = MAX_ITERATIONS;
        assert!(config.validate().is_ok());
    }
}
