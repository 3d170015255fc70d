// Generative provider abstraction
//
// The pipeline treats text, image, video, and speech generation as opaque
// capabilities. Each capability is a trait so vendors (and test doubles) can be
// swapped without touching the control loop.

use async_trait::async_trait;

use crate::errors::ProviderError;

pub mod json;
pub mod types;

// Provider implementations
pub mod elevenlabs;
pub mod gemini;

pub mod retry;

pub use elevenlabs::ElevenLabsClient;
pub use gemini::GeminiClient;
pub use types::{
    InlineData, OperationHandle, OperationStatus, ResponseFormat, TextRequest, VideoRequest,
};

/// Text (and multimodal-in, text-out) generation.
///
/// Used for plan creation, copywriting, and critique.
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate_text(&self, request: &TextRequest) -> Result<String, ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Image generation guided by optional reference images (e.g. a brand logo).
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_image(
        &self,
        prompt: &str,
        references: &[InlineData],
    ) -> Result<InlineData, ProviderError>;

    fn name(&self) -> &str;
}

/// Image-to-video generation as a submit-then-poll long-running operation.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Submit a job and return its handle without waiting for completion.
    async fn submit(&self, request: &VideoRequest) -> Result<OperationHandle, ProviderError>;

    /// Check the job once.
    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, ProviderError>;

    fn name(&self) -> &str;
}

/// Text-to-speech synthesis.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<InlineData, ProviderError>;

    fn name(&self) -> &str;
}
