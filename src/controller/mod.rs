// Iteration controller: the per-asset generate -> critique -> regenerate loop
//
// All asset mutations during generation go through here. Hard generation
// failures mark the asset failed and stop; critique failures leave the asset
// complete and unjudged; only critique feedback drives regeneration.

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::campaign::{AssetKind, AssetStatus, Campaign, ContentRef};
use crate::config::PipelineConfig;
use crate::config::constants::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_VIDEO_MIN_IMPROVEMENT, MAX_ITERATIONS,
};
use crate::critic::{Critic, Critique, CritiqueSubject, SCORE_EPSILON};
use crate::errors::{ControlError, PreconditionError};
use crate::generation::prompts::augment_prompt;
use crate::generation::AssetGenerator;
use crate::logging::{CritiqueLogEntry, CritiqueLogger};

/// Asset kinds that go through the critique-driven improve loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualKind {
    Image,
    Video,
}

impl From<VisualKind> for AssetKind {
    fn from(kind: VisualKind) -> Self {
        match kind {
            VisualKind::Image => AssetKind::Image,
            VisualKind::Video => AssetKind::Video,
        }
    }
}

impl fmt::Display for VisualKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        AssetKind::from(*self).fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationPolicy {
    /// Regenerations allowed after the first generation
    pub max_iterations: u32,
    /// Score gain a regenerated video needs before it is auto-accepted
    pub video_min_improvement: f64,
}

impl Default for IterationPolicy {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            video_min_improvement: DEFAULT_VIDEO_MIN_IMPROVEMENT,
        }
    }
}

impl IterationPolicy {
    /// Same policy with the regeneration count held to `1..=MAX_ITERATIONS`.
    pub fn bounded(self) -> Self {
        Self {
            max_iterations: self.max_iterations.clamp(1, MAX_ITERATIONS),
            ..self
        }
    }
}

impl From<&PipelineConfig> for IterationPolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            video_min_improvement: config.video_min_improvement,
        }
        .bounded()
    }
}

/// Whether a regenerated version is locked in without operator action.
///
/// Images need any improvement; videos need more than
/// `policy.video_min_improvement`. Both must be deployment-ready.
/// Gains within float error of the bar do not count as clearing it.
pub fn should_auto_accept(
    kind: VisualKind,
    previous: &Critique,
    current: &Critique,
    policy: &IterationPolicy,
) -> bool {
    if !current.deployment_ready {
        return false;
    }
    let delta = current.overall_score - previous.overall_score;
    match kind {
        VisualKind::Image => delta > SCORE_EPSILON,
        VisualKind::Video => delta > policy.video_min_improvement + SCORE_EPSILON,
    }
}

/// How an improve-loop run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoopOutcome {
    /// Already accepted, or already complete on an initial run
    Skipped { status: AssetStatus },
    GenerationFailed { error: String },
    /// Generated, but no critique was available so the loop did not engage
    Unjudged,
    DeploymentReady { score: f64, iterations: u32 },
    AutoAccepted { score: f64, iterations: u32 },
    /// Iteration cap reached below the deployment threshold; last version kept
    BudgetExhausted { score: f64, iterations: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    Accepted,
    NoCritique,
    BudgetExhausted,
}

/// Result of a single manual regeneration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegenerateOutcome {
    /// Nothing happened and no provider was called
    NoOp { reason: NoOpReason },
    Regenerated {
        score: Option<f64>,
        auto_accepted: bool,
    },
    GenerationFailed { error: String },
}

enum Attempt {
    Failed(String),
    Unjudged,
    Judged(Critique),
}

enum Step {
    Failed(String),
    Unjudged,
    Judged { critique: Critique, auto_accepted: bool },
}

pub struct IterationController {
    generator: Arc<AssetGenerator>,
    critic: Arc<dyn Critic>,
    policy: IterationPolicy,
    cancel: CancellationToken,
    critique_log: Option<Mutex<CritiqueLogger>>,
}

impl IterationController {
    pub fn new(
        generator: Arc<AssetGenerator>,
        critic: Arc<dyn Critic>,
        policy: IterationPolicy,
    ) -> Self {
        Self {
            generator,
            critic,
            policy: policy.bounded(),
            cancel: CancellationToken::new(),
            critique_log: None,
        }
    }

    /// Abort in-flight video polling when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_critique_log(mut self, logger: CritiqueLogger) -> Self {
        self.critique_log = Some(Mutex::new(logger));
        self
    }

    pub fn policy(&self) -> &IterationPolicy {
        &self.policy
    }

    pub fn generator(&self) -> &Arc<AssetGenerator> {
        &self.generator
    }

    pub fn critic(&self) -> &Arc<dyn Critic> {
        &self.critic
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run the improve loop for one asset: generate, critique, and regenerate
    /// with feedback until deployment-ready, accepted, or out of budget.
    pub async fn run_improve_loop(
        &self,
        campaign: &mut Campaign,
        index: usize,
        kind: VisualKind,
    ) -> Result<LoopOutcome, ControlError> {
        let scene = campaign.scene(index)?.clone();
        let status = current_status(campaign, index, kind)?;
        if matches!(status, AssetStatus::Accepted | AssetStatus::Complete) {
            tracing::debug!(scene = scene.id, %kind, %status, "Skipping improve loop");
            return Ok(LoopOutcome::Skipped { status });
        }
        self.check_source_image(campaign, index, kind)?;

        // A retried failed asset keeps the count its earlier regenerations used
        let iteration = campaign
            .asset(index, kind.into())
            .map(|a| a.iterations())
            .unwrap_or_default();
        tracing::info!(scene = scene.id, %kind, iteration, "Generating asset");
        let mut critique = match self
            .attempt(campaign, index, kind, &scene.visual_prompt, iteration)
            .await?
        {
            Attempt::Failed(error) => return Ok(LoopOutcome::GenerationFailed { error }),
            Attempt::Unjudged => return Ok(LoopOutcome::Unjudged),
            Attempt::Judged(critique) => critique,
        };

        loop {
            let iterations = campaign
                .asset(index, kind.into())
                .map(|a| a.iterations())
                .unwrap_or_default();
            let score = critique.overall_score;

            if critique.deployment_ready {
                tracing::info!(scene = scene.id, %kind, score, iterations, "Asset is deployment-ready");
                return Ok(LoopOutcome::DeploymentReady { score, iterations });
            }
            if iterations >= self.policy.max_iterations {
                tracing::warn!(
                    scene = scene.id,
                    %kind,
                    score,
                    iterations,
                    "Regeneration attempts exhausted; keeping last version"
                );
                return Ok(LoopOutcome::BudgetExhausted { score, iterations });
            }

            match self.regenerate_once(campaign, index, kind).await? {
                Step::Failed(error) => return Ok(LoopOutcome::GenerationFailed { error }),
                Step::Unjudged => return Ok(LoopOutcome::Unjudged),
                Step::Judged {
                    critique: next,
                    auto_accepted,
                } => {
                    if auto_accepted {
                        return Ok(LoopOutcome::AutoAccepted {
                            score: next.overall_score,
                            iterations: iterations + 1,
                        });
                    }
                    critique = next;
                }
            }
        }
    }

    /// One operator-triggered regeneration from the current critique.
    pub async fn regenerate(
        &self,
        campaign: &mut Campaign,
        index: usize,
        kind: VisualKind,
    ) -> Result<RegenerateOutcome, ControlError> {
        let asset = campaign
            .asset(index, kind.into())
            .ok_or(PreconditionError::UnknownScene { index })?;

        let reason = if asset.status() == AssetStatus::Accepted {
            Some(NoOpReason::Accepted)
        } else if asset.status() != AssetStatus::Complete || asset.critique().is_none() {
            Some(NoOpReason::NoCritique)
        } else if asset.iterations() >= self.policy.max_iterations {
            Some(NoOpReason::BudgetExhausted)
        } else {
            None
        };
        if let Some(reason) = reason {
            tracing::info!(scene = index + 1, %kind, ?reason, "Regeneration skipped");
            return Ok(RegenerateOutcome::NoOp { reason });
        }
        self.check_source_image(campaign, index, kind)?;

        Ok(match self.regenerate_once(campaign, index, kind).await? {
            Step::Failed(error) => RegenerateOutcome::GenerationFailed { error },
            Step::Unjudged => RegenerateOutcome::Regenerated {
                score: None,
                auto_accepted: false,
            },
            Step::Judged {
                critique,
                auto_accepted,
            } => RegenerateOutcome::Regenerated {
                score: Some(critique.overall_score),
                auto_accepted,
            },
        })
    }

    /// Operator acceptance: locks the active version. No-op if already accepted.
    pub fn accept(
        &self,
        campaign: &mut Campaign,
        index: usize,
        kind: AssetKind,
    ) -> Result<(), ControlError> {
        campaign.asset_mut(index, kind)?.accept()?;
        tracing::info!(scene = index + 1, %kind, "Asset accepted");
        Ok(())
    }

    fn check_source_image(
        &self,
        campaign: &Campaign,
        index: usize,
        kind: VisualKind,
    ) -> Result<(), PreconditionError> {
        if kind == VisualKind::Video && campaign.source_image(index).is_none() {
            let scene_id = campaign.scene(index)?.id;
            return Err(PreconditionError::MissingSourceImage { scene_id });
        }
        Ok(())
    }

    /// Archive the active version, then generate and judge a feedback-augmented one.
    async fn regenerate_once(
        &self,
        campaign: &mut Campaign,
        index: usize,
        kind: VisualKind,
    ) -> Result<Step, ControlError> {
        let visual_prompt = campaign.scene(index)?.visual_prompt.clone();
        let asset = campaign.asset_mut(index, kind.into())?;
        let Some(previous) = asset.archive_for_regeneration() else {
            return Ok(Step::Unjudged);
        };
        let iteration = asset.iterations();

        tracing::info!(
            scene = index + 1,
            %kind,
            iteration,
            previous_score = previous.overall_score,
            "Regenerating with critique feedback"
        );

        let prompt = augment_prompt(&visual_prompt, &previous, kind.into());
        match self.attempt(campaign, index, kind, &prompt, iteration).await? {
            Attempt::Failed(error) => Ok(Step::Failed(error)),
            Attempt::Unjudged => Ok(Step::Unjudged),
            Attempt::Judged(critique) => {
                let auto_accepted = should_auto_accept(kind, &previous, &critique, &self.policy);
                if auto_accepted {
                    campaign.asset_mut(index, kind.into())?.accept()?;
                    tracing::info!(
                        scene = index + 1,
                        %kind,
                        score = critique.overall_score,
                        delta = critique.overall_score - previous.overall_score,
                        "Auto-accepted improved version"
                    );
                }
                Ok(Step::Judged {
                    critique,
                    auto_accepted,
                })
            }
        }
    }

    /// Generate one version and critique it.
    async fn attempt(
        &self,
        campaign: &mut Campaign,
        index: usize,
        kind: VisualKind,
        prompt: &str,
        iteration: u32,
    ) -> Result<Attempt, ControlError> {
        let scene = campaign.scene(index)?.clone();
        let aspect_ratio = campaign.brief().aspect_ratio;
        let logo = campaign.logo().cloned();
        let source_image = campaign.source_image(index).cloned();

        campaign.asset_mut(index, kind.into())?.begin_generation()?;

        let result = match kind {
            VisualKind::Image => {
                self.generator
                    .generate_image(prompt, logo.as_ref(), aspect_ratio)
                    .await
            }
            VisualKind::Video => {
                self.generator
                    .generate_video(
                        &scene,
                        prompt,
                        source_image.as_ref(),
                        aspect_ratio,
                        &self.cancel,
                    )
                    .await
            }
        };

        let asset = campaign.asset_mut(index, kind.into())?;
        let content = match result {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(scene = scene.id, %kind, iteration, "Generation failed: {}", e);
                asset.fail(&e)?;
                return Ok(Attempt::Failed(e.to_string()));
            }
        };
        asset.complete(content.clone())?;

        let subject = match content {
            ContentRef::Inline(data) => CritiqueSubject::Image(data),
            ContentRef::Remote { uri, .. } => CritiqueSubject::Video { uri },
        };
        let context = campaign.critique_context(Some(index));

        match self.critic.critique(&subject, &context).await {
            Ok(critique) => {
                let critique = critique.with_iteration(iteration);
                tracing::info!(
                    scene = scene.id,
                    %kind,
                    iteration,
                    score = critique.overall_score,
                    ready = critique.deployment_ready,
                    "Critique received"
                );
                self.log_critique(campaign, kind.to_string().as_str(), Some(scene.id), &critique);
                campaign
                    .asset_mut(index, kind.into())?
                    .attach_critique(critique.clone());
                Ok(Attempt::Judged(critique))
            }
            Err(e) => {
                tracing::warn!(scene = scene.id, %kind, iteration, "Critique unavailable: {}", e);
                Ok(Attempt::Unjudged)
            }
        }
    }

    pub(crate) fn log_critique(
        &self,
        campaign: &Campaign,
        subject: &str,
        scene: Option<u32>,
        critique: &Critique,
    ) {
        let Some(log) = &self.critique_log else {
            return;
        };
        let entry = CritiqueLogEntry::new(campaign.id(), subject, scene, critique);
        match log.lock() {
            Ok(mut logger) => {
                if let Err(e) = logger.log(entry) {
                    tracing::warn!("Failed to write critique log: {}", e);
                }
            }
            Err(_) => tracing::warn!("Critique log lock poisoned; entry dropped"),
        }
    }
}

fn current_status(
    campaign: &Campaign,
    index: usize,
    kind: VisualKind,
) -> Result<AssetStatus, PreconditionError> {
    campaign
        .asset(index, kind.into())
        .map(|a| a.status())
        .ok_or(PreconditionError::UnknownScene { index })
}
