// Automated quality critique
//
// A critique scores one asset-version on five weighted dimensions. The overall
// score and the deployment gate are always derived here from the dimension
// scores, never taken from the judge's own arithmetic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::AspectRatio;
use crate::errors::CritiqueError;
use crate::providers::InlineData;

mod llm;

pub use llm::LlmCritic;

pub const BRAND_ALIGNMENT_WEIGHT: f64 = 0.30;
pub const SAFETY_ETHICS_WEIGHT: f64 = 0.25;
pub const MESSAGE_CLARITY_WEIGHT: f64 = 0.20;
pub const VISUAL_QUALITY_WEIGHT: f64 = 0.15;
pub const PLATFORM_OPTIMIZATION_WEIGHT: f64 = 0.10;

/// Minimum overall score for an asset to need no further improvement.
pub const DEPLOYMENT_THRESHOLD: f64 = 0.7;

// Absorbs float error in weighted sums that are exactly 0.7 on paper.
pub(crate) const SCORE_EPSILON: f64 = 1e-9;

/// True iff `score >= DEPLOYMENT_THRESHOLD`.
pub fn is_deployment_ready(score: f64) -> bool {
    meets_threshold(score, DEPLOYMENT_THRESHOLD)
}

/// `score >= threshold`, tolerant of float error in weighted sums and means.
pub fn meets_threshold(score: f64, threshold: f64) -> bool {
    score + SCORE_EPSILON >= threshold
}

/// The five judged dimensions, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScores {
    pub brand_alignment: f64,
    pub visual_quality: f64,
    pub message_clarity: f64,
    pub safety_ethics: f64,
    pub platform_optimization: f64,
}

impl DimensionScores {
    pub fn uniform(score: f64) -> Self {
        Self {
            brand_alignment: score,
            visual_quality: score,
            message_clarity: score,
            safety_ethics: score,
            platform_optimization: score,
        }
    }

    pub fn weighted_score(&self) -> f64 {
        self.brand_alignment * BRAND_ALIGNMENT_WEIGHT
            + self.safety_ethics * SAFETY_ETHICS_WEIGHT
            + self.message_clarity * MESSAGE_CLARITY_WEIGHT
            + self.visual_quality * VISUAL_QUALITY_WEIGHT
            + self.platform_optimization * PLATFORM_OPTIMIZATION_WEIGHT
    }

    /// Clamp every dimension into [0, 1]. Fails on NaN or infinity.
    pub fn clamped(self) -> Result<Self, CritiqueError> {
        let clamp = |name: &str, v: f64| {
            if v.is_finite() {
                Ok(v.clamp(0.0, 1.0))
            } else {
                Err(CritiqueError::Malformed(format!("{} score is not a number", name)))
            }
        };
        Ok(Self {
            brand_alignment: clamp("brandAlignment", self.brand_alignment)?,
            visual_quality: clamp("visualQuality", self.visual_quality)?,
            message_clarity: clamp("messageClarity", self.message_clarity)?,
            safety_ethics: clamp("safetyEthics", self.safety_ethics)?,
            platform_optimization: clamp("platformOptimization", self.platform_optimization)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Immutable judgment of one asset-version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Critique {
    pub overall_score: f64,
    pub scores: DimensionScores,
    pub feedback: Feedback,
    pub deployment_ready: bool,
    pub critiqued_at: DateTime<Utc>,
    /// Which generation attempt this judged (0 = first generation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
}

impl Critique {
    pub fn from_scores(scores: DimensionScores, feedback: Feedback) -> Self {
        let overall_score = scores.weighted_score();
        Self {
            overall_score,
            scores,
            feedback,
            deployment_ready: is_deployment_ready(overall_score),
            critiqued_at: Utc::now(),
            iteration: None,
        }
    }

    pub fn with_iteration(mut self, iteration: u32) -> Self {
        self.iteration = Some(iteration);
        self
    }
}

/// What is being judged.
#[derive(Debug, Clone)]
pub enum CritiqueSubject {
    Image(InlineData),
    /// Judged from its description and the provider-hosted URI
    Video { uri: String },
    Copy { caption: String, hashtags: Vec<String> },
}

impl CritiqueSubject {
    pub fn label(&self) -> &'static str {
        match self {
            CritiqueSubject::Image(_) => "image",
            CritiqueSubject::Video { .. } => "video",
            CritiqueSubject::Copy { .. } => "copy",
        }
    }
}

/// Scene text that accompanies a visual under critique.
#[derive(Debug, Clone, Default)]
pub struct SceneContext {
    pub scene_id: u32,
    pub scene_count: usize,
    pub visual_prompt: String,
    pub voiceover: String,
    pub on_screen_text: String,
}

/// Campaign and scene context the critic judges against.
#[derive(Debug, Clone)]
pub struct CritiqueContext {
    pub product: String,
    pub audience: String,
    pub aspect_ratio: AspectRatio,
    /// Absent for campaign-level copy
    pub scene: Option<SceneContext>,
}

/// Produces a structured quality judgment for an asset-version.
#[async_trait]
pub trait Critic: Send + Sync {
    async fn critique(
        &self,
        subject: &CritiqueSubject,
        context: &CritiqueContext,
    ) -> Result<Critique, CritiqueError>;
}
