// Scripted providers and critic shared by the integration tests
//
// Every double counts its calls so tests can assert that no-op paths never
// reach a provider.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use adforge::campaign::{AspectRatio, Campaign, CampaignBrief, Scene};
use adforge::controller::{IterationController, IterationPolicy};
use adforge::critic::{
    Critic, Critique, CritiqueContext, CritiqueSubject, DimensionScores, Feedback,
};
use adforge::errors::{CritiqueError, ProviderError};
use adforge::generation::{AssetGenerator, PollSettings, Providers};
use adforge::orchestrator::CampaignOrchestrator;
use adforge::providers::{
    ImageProvider, InlineData, OperationHandle, OperationStatus, SpeechProvider, TextProvider,
    TextRequest, VideoProvider, VideoRequest,
};

pub const COPY_JSON: &str =
    r##"{"caption": "Glow brighter every morning.", "hashtags": ["#glow", "#skincare"]}"##;

/// Pops scripted results in order; once empty, falls back to the default.
struct Script<T> {
    queue: Mutex<VecDeque<Result<T, String>>>,
    calls: AtomicUsize,
}

impl<T> Script<T> {
    fn new(queue: Vec<Result<T, String>>) -> Self {
        Self {
            queue: Mutex::new(queue.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> Option<Result<T, String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queue.lock().unwrap().pop_front()
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub struct ScriptedText {
    script: Script<String>,
    default: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedText {
    pub fn new(default: &str) -> Self {
        Self::scripted(Vec::new(), default)
    }

    pub fn scripted(queue: Vec<Result<String, String>>, default: &str) -> Self {
        Self {
            script: Script::new(queue),
            default: default.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }
}

#[async_trait]
impl TextProvider for ScriptedText {
    async fn generate_text(&self, request: &TextRequest) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        match self.script.next() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ProviderError::Blocked(message)),
            None => Ok(self.default.clone()),
        }
    }

    fn name(&self) -> &str {
        "scripted-text"
    }
}

pub struct ScriptedImage {
    script: Script<InlineData>,
    pub prompts: Mutex<Vec<String>>,
    pub reference_counts: Mutex<Vec<usize>>,
}

impl ScriptedImage {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(queue: Vec<Result<InlineData, String>>) -> Self {
        Self {
            script: Script::new(queue),
            prompts: Mutex::new(Vec::new()),
            reference_counts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ImageProvider for ScriptedImage {
    async fn generate_image(
        &self,
        prompt: &str,
        references: &[InlineData],
    ) -> Result<InlineData, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reference_counts.lock().unwrap().push(references.len());
        let n = self.script.calls() + 1;
        match self.script.next() {
            Some(Ok(image)) => Ok(image),
            Some(Err(message)) => Err(ProviderError::Blocked(message)),
            None => Ok(InlineData::from_bytes("image/png", format!("png-{n}").as_bytes())),
        }
    }

    fn name(&self) -> &str {
        "scripted-image"
    }
}

/// Submits succeed unless scripted otherwise; every operation is done on its first poll.
pub struct ScriptedVideo {
    submits: Script<()>,
    polls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedVideo {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(queue: Vec<Result<(), String>>) -> Self {
        Self {
            submits: Script::new(queue),
            polls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn submits(&self) -> usize {
        self.submits.calls()
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoProvider for ScriptedVideo {
    async fn submit(&self, request: &VideoRequest) -> Result<OperationHandle, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let n = self.submits.calls() + 1;
        match self.submits.next() {
            Some(Err(message)) => Err(ProviderError::Blocked(message)),
            _ => Ok(OperationHandle(format!("operations/video-{n}"))),
        }
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, ProviderError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(OperationStatus::Done {
            uri: format!("https://media.example/{}.mp4", handle.0.replace('/', "-")),
        })
    }

    fn name(&self) -> &str {
        "scripted-video"
    }
}

pub struct ScriptedSpeech {
    script: Script<InlineData>,
}

impl ScriptedSpeech {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(queue: Vec<Result<InlineData, String>>) -> Self {
        Self {
            script: Script::new(queue),
        }
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }
}

#[async_trait]
impl SpeechProvider for ScriptedSpeech {
    async fn synthesize(&self, text: &str, _voice_id: &str) -> Result<InlineData, ProviderError> {
        match self.script.next() {
            Some(Ok(audio)) => Ok(audio),
            Some(Err(message)) => Err(ProviderError::Blocked(message)),
            None => Ok(InlineData::from_bytes("audio/mpeg", text.as_bytes())),
        }
    }

    fn name(&self) -> &str {
        "scripted-speech"
    }
}

/// Returns queued overall scores (uniform across dimensions), then `default`.
/// An `Err` entry simulates an unparseable judgment.
pub struct ScriptedCritic {
    script: Script<f64>,
    default: f64,
    pub subjects: Mutex<Vec<&'static str>>,
}

impl ScriptedCritic {
    pub fn new(default: f64) -> Self {
        Self::scripted(Vec::new(), default)
    }

    pub fn scripted(queue: Vec<Result<f64, String>>, default: f64) -> Self {
        Self {
            script: Script::new(queue),
            default,
            subjects: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }
}

pub fn critique(score: f64) -> Critique {
    Critique::from_scores(
        DimensionScores::uniform(score),
        Feedback {
            strengths: vec!["Clear product focus".to_string()],
            issues: vec!["Lighting is flat".to_string()],
            suggestions: vec!["Add warm rim lighting".to_string()],
        },
    )
}

#[async_trait]
impl Critic for ScriptedCritic {
    async fn critique(
        &self,
        subject: &CritiqueSubject,
        _context: &CritiqueContext,
    ) -> Result<Critique, CritiqueError> {
        self.subjects.lock().unwrap().push(subject.label());
        match self.script.next() {
            Some(Ok(score)) => Ok(critique(score)),
            Some(Err(message)) => Err(CritiqueError::Malformed(message)),
            None => Ok(critique(self.default)),
        }
    }
}

/// The doubles behind one controller, kept so tests can inspect call counts.
pub struct Harness {
    pub text: Arc<ScriptedText>,
    pub image: Arc<ScriptedImage>,
    pub video: Arc<ScriptedVideo>,
    pub speech: Arc<ScriptedSpeech>,
    pub critic: Arc<ScriptedCritic>,
    pub cancel: CancellationToken,
}

impl Harness {
    pub fn new(critic: ScriptedCritic) -> Self {
        Self {
            text: Arc::new(ScriptedText::new(COPY_JSON)),
            image: Arc::new(ScriptedImage::new()),
            video: Arc::new(ScriptedVideo::new()),
            speech: Arc::new(ScriptedSpeech::new()),
            critic: Arc::new(critic),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_image(mut self, image: ScriptedImage) -> Self {
        self.image = Arc::new(image);
        self
    }

    pub fn with_speech(mut self, speech: ScriptedSpeech) -> Self {
        self.speech = Arc::new(speech);
        self
    }

    pub fn controller(&self) -> IterationController {
        let providers = Providers {
            text: self.text.clone(),
            image: self.image.clone(),
            video: self.video.clone(),
            speech: self.speech.clone(),
        };
        let poll = PollSettings {
            interval: Duration::from_millis(1),
            max_wait: Duration::from_secs(5),
        };
        let generator = Arc::new(AssetGenerator::new(providers, "test-voice", poll));
        IterationController::new(generator, self.critic.clone(), IterationPolicy::default())
            .with_cancellation(self.cancel.clone())
    }

    pub fn orchestrator(&self) -> CampaignOrchestrator {
        CampaignOrchestrator::new(self.controller())
    }
}

pub fn brief(scene_count: usize) -> CampaignBrief {
    CampaignBrief {
        product: "Lumen vitamin C serum".to_string(),
        audience: "skincare enthusiasts, commuters".to_string(),
        aspect_ratio: AspectRatio::Vertical,
        scene_count,
    }
}

pub fn campaign(scene_count: usize) -> Campaign {
    let scenes = (1..=scene_count as u32)
        .map(|id| Scene {
            id,
            voiceover: format!("Scene {id}: wake up your skin."),
            on_screen_text: format!("Glow #{id}"),
            visual_prompt: format!("Close-up of the serum bottle on a sunlit shelf, shot {id}"),
        })
        .collect();
    Campaign::new(brief(scene_count), scenes, None)
}
