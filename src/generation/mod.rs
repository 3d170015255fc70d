// Asset generation
//
// One provider request per call. Every call produces a new, independent
// version; nothing is cached or deduplicated.

use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::campaign::{AspectRatio, Campaign, ContentRef, Scene};
use crate::errors::{GenerationError, PreconditionError};
use crate::providers::json::parse_json_object;
use crate::providers::{
    ImageProvider, InlineData, SpeechProvider, TextProvider, TextRequest, VideoProvider,
    VideoRequest,
};

pub mod prompts;
pub mod video;

pub use video::{PollSettings, VideoJob, VideoPhase};

const VIDEO_MIME: &str = "video/mp4";

/// Generated post copy before critique.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CopyDraft {
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// The external providers behind each asset kind.
#[derive(Clone)]
pub struct Providers {
    pub text: Arc<dyn TextProvider>,
    pub image: Arc<dyn ImageProvider>,
    pub video: Arc<dyn VideoProvider>,
    pub speech: Arc<dyn SpeechProvider>,
}

pub struct AssetGenerator {
    providers: Providers,
    voice_id: String,
    poll: PollSettings,
}

impl AssetGenerator {
    pub fn new(providers: Providers, voice_id: impl Into<String>, poll: PollSettings) -> Self {
        Self {
            providers,
            voice_id: voice_id.into(),
            poll,
        }
    }

    pub fn text_provider(&self) -> &Arc<dyn TextProvider> {
        &self.providers.text
    }

    /// Image for a scene. `visual_prompt` is the scene prompt, possibly feedback-augmented.
    pub async fn generate_image(
        &self,
        visual_prompt: &str,
        logo: Option<&InlineData>,
        aspect_ratio: AspectRatio,
    ) -> Result<ContentRef, GenerationError> {
        let prompt = prompts::image_prompt(visual_prompt, logo.is_some(), aspect_ratio);
        let references: Vec<InlineData> = logo.cloned().into_iter().collect();

        tracing::debug!(
            provider = self.providers.image.name(),
            references = references.len(),
            "Generating image"
        );
        let image = self
            .providers
            .image
            .generate_image(&prompt, &references)
            .await?;
        Ok(ContentRef::Inline(image))
    }

    /// Video animated from the scene's image. Rejected before any provider
    /// call when there is no source image.
    pub async fn generate_video(
        &self,
        scene: &Scene,
        visual_prompt: &str,
        source_image: Option<&InlineData>,
        aspect_ratio: AspectRatio,
        cancel: &CancellationToken,
    ) -> Result<ContentRef, GenerationError> {
        let source_image = source_image
            .ok_or(PreconditionError::MissingSourceImage { scene_id: scene.id })?;

        let request = VideoRequest {
            prompt: prompts::video_prompt(visual_prompt),
            source_image: source_image.clone(),
            aspect_ratio: aspect_ratio.as_str().to_string(),
        };

        let mut job = VideoJob::submit(self.providers.video.as_ref(), &request, self.poll).await?;
        let uri = job.wait(cancel).await?;
        Ok(ContentRef::Remote {
            uri,
            mime_type: VIDEO_MIME.to_string(),
        })
    }

    pub async fn generate_voiceover(&self, scene: &Scene) -> Result<ContentRef, GenerationError> {
        if scene.voiceover.trim().is_empty() {
            return Err(GenerationError::Malformed(format!(
                "scene {} has no voiceover line",
                scene.id
            )));
        }
        let audio = self
            .providers
            .speech
            .synthesize(&scene.voiceover, &self.voice_id)
            .await?;
        Ok(ContentRef::Inline(audio))
    }

    /// Caption and hashtags for the whole campaign. Malformed JSON is a hard failure.
    pub async fn generate_copy(&self, campaign: &Campaign) -> Result<CopyDraft, GenerationError> {
        let request = TextRequest::new(prompts::copy_prompt(campaign)).json();
        let text = self.providers.text.generate_text(&request).await?;

        let draft: CopyDraft = parse_json_object(&text)
            .map_err(|e| GenerationError::Malformed(format!("post copy is not valid JSON: {}", e)))?;
        if draft.caption.trim().is_empty() {
            return Err(GenerationError::Malformed(
                "post copy has an empty caption".to_string(),
            ));
        }
        Ok(draft)
    }
}
