// Campaign orchestrator
//
// Runs the fixed pipeline strictly in order, one asset at a time:
//   1. image improve loop per scene
//   2. video improve loop per scene (deferred where the scene has no image)
//   3. voiceover per scene (single shot; operator accept/reject)
//   4. post copy, generated and critiqued once
//   5. report
//
// A failure is local to its (scene, kind) unit and never aborts the run.

use serde::Serialize;

use crate::campaign::{AssetKind, AssetStatus, Campaign, PostCopy, Stage};
use crate::controller::{IterationController, LoopOutcome, VisualKind};
use crate::critic::CritiqueSubject;
use crate::errors::{ControlError, PreconditionError};
use crate::report::CampaignReport;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VoiceoverOutcome {
    Skipped { status: AssetStatus },
    Generated,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CopyOutcome {
    Skipped,
    Generated { score: Option<f64> },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SceneResult {
    Improved(LoopOutcome),
    Voiceover(VoiceoverOutcome),
    /// Not attempted; the asset is unchanged
    Deferred { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneRun {
    pub scene_id: u32,
    pub kind: AssetKind,
    pub result: SceneResult,
}

/// What a full pipeline run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub steps: Vec<SceneRun>,
    pub copy: Option<CopyOutcome>,
    pub cancelled: bool,
    pub report: CampaignReport,
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        let scene_failures = self
            .steps
            .iter()
            .filter(|s| {
                matches!(
                    s.result,
                    SceneResult::Improved(LoopOutcome::GenerationFailed { .. })
                        | SceneResult::Voiceover(VoiceoverOutcome::Failed { .. })
                )
            })
            .count();
        let copy_failure = matches!(self.copy, Some(CopyOutcome::Failed { .. })) as usize;
        scene_failures + copy_failure
    }
}

pub struct CampaignOrchestrator {
    controller: IterationController,
}

impl CampaignOrchestrator {
    pub fn new(controller: IterationController) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &IterationController {
        &self.controller
    }

    fn cancelled(&self) -> bool {
        self.controller.cancellation().is_cancelled()
    }

    /// Run every stage in order and build the report.
    pub async fn run(&self, campaign: &mut Campaign) -> RunSummary {
        let mut steps = Vec::new();
        let mut copy = None;

        'stages: {
            for (stage, kind) in [
                (Stage::Images, VisualKind::Image),
                (Stage::Videos, VisualKind::Video),
            ] {
                self.log_stage(campaign, stage);
                match self.run_visual_stage(campaign, kind).await {
                    Some(runs) => steps.extend(runs),
                    None => break 'stages,
                }
            }

            self.log_stage(campaign, Stage::Voiceovers);
            match self.run_voiceovers(campaign).await {
                Some(runs) => steps.extend(runs),
                None => break 'stages,
            }

            self.log_stage(campaign, Stage::Copy);
            copy = Some(self.run_copy(campaign).await);
        }

        let cancelled = self.cancelled();
        if cancelled {
            tracing::warn!("Pipeline cancelled; reporting on partial campaign");
        }
        self.log_stage(campaign, Stage::Report);
        let report = CampaignReport::build(campaign);

        let summary = RunSummary {
            steps,
            copy,
            cancelled,
            report,
        };
        tracing::info!(
            failures = summary.failures(),
            readiness = ?summary.report.overview.readiness.status(),
            "Pipeline finished"
        );
        summary
    }

    fn log_stage(&self, campaign: &Campaign, stage: Stage) {
        if campaign.stage_gate().is_unlocked(stage) {
            tracing::info!(%stage, "Starting stage");
        } else {
            tracing::info!(%stage, "Starting stage with earlier assets unsettled");
        }
    }

    /// Improve loop for every scene. `None` if cancelled part-way.
    pub async fn run_visual_stage(
        &self,
        campaign: &mut Campaign,
        kind: VisualKind,
    ) -> Option<Vec<SceneRun>> {
        let mut runs = Vec::with_capacity(campaign.scene_count());
        for index in 0..campaign.scene_count() {
            if self.cancelled() {
                return None;
            }
            let scene_id = campaign.scenes()[index].id;
            let result = match self.controller.run_improve_loop(campaign, index, kind).await {
                Ok(outcome) => SceneResult::Improved(outcome),
                Err(ControlError::Precondition(e @ PreconditionError::MissingSourceImage { .. })) => {
                    tracing::info!(scene = scene_id, %kind, "Deferred: {}", e);
                    SceneResult::Deferred {
                        reason: e.to_string(),
                    }
                }
                Err(e) => {
                    tracing::error!(scene = scene_id, %kind, "Improve loop rejected: {}", e);
                    SceneResult::Deferred {
                        reason: e.to_string(),
                    }
                }
            };
            runs.push(SceneRun {
                scene_id,
                kind: kind.into(),
                result,
            });
        }
        if self.cancelled() {
            return None;
        }
        Some(runs)
    }

    /// One voiceover per scene. `None` if cancelled part-way.
    pub async fn run_voiceovers(&self, campaign: &mut Campaign) -> Option<Vec<SceneRun>> {
        let mut runs = Vec::with_capacity(campaign.scene_count());
        for index in 0..campaign.scene_count() {
            if self.cancelled() {
                return None;
            }
            let scene_id = campaign.scenes()[index].id;
            let result = match self.generate_voiceover(campaign, index).await {
                Ok(outcome) => SceneResult::Voiceover(outcome),
                Err(e) => SceneResult::Deferred {
                    reason: e.to_string(),
                },
            };
            runs.push(SceneRun {
                scene_id,
                kind: AssetKind::Voiceover,
                result,
            });
        }
        Some(runs)
    }

    /// Single-shot voiceover. Skips scenes whose voiceover is complete or accepted.
    pub async fn generate_voiceover(
        &self,
        campaign: &mut Campaign,
        index: usize,
    ) -> Result<VoiceoverOutcome, ControlError> {
        let scene = campaign.scene(index)?.clone();
        let asset = campaign.asset_mut(index, AssetKind::Voiceover)?;
        let status = asset.status();
        if status.is_usable() {
            return Ok(VoiceoverOutcome::Skipped { status });
        }
        asset.begin_generation()?;

        let result = self.controller.generator().generate_voiceover(&scene).await;
        let asset = campaign.asset_mut(index, AssetKind::Voiceover)?;
        match result {
            Ok(content) => {
                asset.complete(content)?;
                tracing::info!(scene = scene.id, "Voiceover generated");
                Ok(VoiceoverOutcome::Generated)
            }
            Err(e) => {
                tracing::error!(scene = scene.id, "Voiceover generation failed: {}", e);
                asset.fail(&e)?;
                Ok(VoiceoverOutcome::Failed {
                    error: e.to_string(),
                })
            }
        }
    }

    /// Operator approval of a voiceover.
    pub fn accept_voiceover(&self, campaign: &mut Campaign, index: usize) -> Result<(), ControlError> {
        self.controller.accept(campaign, index, AssetKind::Voiceover)
    }

    /// Operator rejection: discard the voiceover and generate a fresh one.
    pub async fn reject_voiceover(
        &self,
        campaign: &mut Campaign,
        index: usize,
    ) -> Result<VoiceoverOutcome, ControlError> {
        campaign.asset_mut(index, AssetKind::Voiceover)?.reset()?;
        tracing::info!(scene = index + 1, "Voiceover rejected; regenerating");
        self.generate_voiceover(campaign, index).await
    }

    /// Generate and critique the post copy once. A critique failure keeps the
    /// copy without a critique.
    pub async fn run_copy(&self, campaign: &mut Campaign) -> CopyOutcome {
        if campaign.copy().is_some() {
            return CopyOutcome::Skipped;
        }

        let draft = match self.controller.generator().generate_copy(campaign).await {
            Ok(draft) => draft,
            Err(e) => {
                tracing::error!("Post copy generation failed: {}", e);
                return CopyOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        let subject = CritiqueSubject::Copy {
            caption: draft.caption.clone(),
            hashtags: draft.hashtags.clone(),
        };
        let context = campaign.critique_context(None);
        let critique = match self.controller.critic().critique(&subject, &context).await {
            Ok(critique) => {
                let critique = critique.with_iteration(0);
                tracing::info!(score = critique.overall_score, "Post copy critiqued");
                self.controller
                    .log_critique(campaign, "copy", None, &critique);
                Some(critique)
            }
            Err(e) => {
                tracing::warn!("Post copy critique unavailable: {}", e);
                None
            }
        };

        let score = critique.as_ref().map(|c| c.overall_score);
        campaign.set_copy(PostCopy {
            caption: draft.caption,
            hashtags: draft.hashtags,
            critique,
        });
        CopyOutcome::Generated { score }
    }

    /// Rebuild the report from the campaign's current state.
    pub fn report(&self, campaign: &Campaign) -> CampaignReport {
        CampaignReport::build(campaign)
    }
}
