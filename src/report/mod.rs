// Campaign report
//
// One schema, rebuilt from the campaign on every request and never patched.
// The short readiness summary is a projection of the full report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::campaign::{Asset, AssetKind, AssetStatus, Campaign, Scene};
use crate::critic::{Critique, DimensionScores, DEPLOYMENT_THRESHOLD};

pub mod export;
mod readiness;

pub use export::write_report;
pub use readiness::{current_critiques, QualityStatus, Readiness, EXCELLENT_THRESHOLD};

/// Assumed on-screen time per scene.
pub const SECONDS_PER_SCENE: u32 = 15;

const BASE_REACH: f64 = 1000.0;
const BASE_ENGAGEMENT_RATE: f64 = 0.02;
const ENGAGEMENT_QUALITY_BONUS: f64 = 0.03;
const HIGH_QUALITY_SCORE: f64 = 0.8;
const WEAK_SCORE: f64 = 0.6;
const MAX_SUGGESTED_HASHTAGS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub campaign_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub overview: Overview,
    pub scenes: Vec<SceneReport>,
    pub copy: Option<CopyReport>,
    pub content_analysis: ContentAnalysis,
    /// Absent until at least one critique exists
    pub engagement: Option<EngagementEstimate>,
    pub technical: TechnicalDetails,
    pub recommendations: Recommendations,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub product: String,
    pub audience: String,
    pub aspect_ratio: String,
    pub platform: String,
    pub scene_count: usize,
    pub readiness: Readiness,
    pub campaign_created_at: DateTime<Utc>,
}

/// One version of an asset kept in history.
#[derive(Debug, Clone, Serialize)]
pub struct VersionSummary {
    pub iteration: u32,
    pub score: Option<f64>,
    pub deployment_ready: Option<bool>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetReport {
    pub status: AssetStatus,
    pub content: Option<String>,
    pub score: Option<f64>,
    pub scores: Option<DimensionScores>,
    pub deployment_ready: Option<bool>,
    pub strengths: Vec<String>,
    pub issues: Vec<String>,
    pub improvements: Vec<String>,
    pub regenerations: u32,
    pub history: Vec<VersionSummary>,
    pub error: Option<String>,
}

impl AssetReport {
    fn from_asset(asset: &Asset) -> Self {
        let critique = asset.critique();
        Self {
            status: asset.status(),
            content: asset.content().map(|c| c.describe()),
            score: critique.map(|c| c.overall_score),
            scores: critique.map(|c| c.scores),
            deployment_ready: critique.map(|c| c.deployment_ready),
            strengths: critique
                .map(|c| c.feedback.strengths.clone())
                .unwrap_or_default(),
            issues: critique.map(|c| c.feedback.issues.clone()).unwrap_or_default(),
            improvements: critique
                .map(|c| c.feedback.suggestions.clone())
                .unwrap_or_default(),
            regenerations: asset.iterations(),
            history: asset
                .history()
                .iter()
                .map(|entry| VersionSummary {
                    iteration: entry.iteration,
                    score: entry.critique.as_ref().map(|c| c.overall_score),
                    deployment_ready: entry.critique.as_ref().map(|c| c.deployment_ready),
                    content: entry.content.describe(),
                })
                .collect(),
            error: asset.last_error().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceoverReport {
    pub status: AssetStatus,
    pub content: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneReport {
    pub scene_id: u32,
    pub voiceover_line: String,
    pub on_screen_text: String,
    pub image: AssetReport,
    pub video: AssetReport,
    pub voiceover: VoiceoverReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    pub caption: String,
    pub hashtags: Vec<String>,
    pub score: Option<f64>,
    pub scores: Option<DimensionScores>,
    pub strengths: Vec<String>,
    pub issues: Vec<String>,
    pub improvements: Vec<String>,
}

/// Strengths, weaknesses, opportunities, and threats.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentAnalysis {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagementEstimate {
    pub estimated_reach: u64,
    /// Percent, one decimal place
    pub engagement_rate_pct: f64,
    pub target_demographics: Vec<String>,
    pub suggested_hashtags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityTier {
    #[serde(rename = "4K")]
    UltraHd,
    #[serde(rename = "HD")]
    Hd,
    Standard,
}

impl QualityTier {
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_QUALITY_SCORE {
            QualityTier::UltraHd
        } else if score > WEAK_SCORE {
            QualityTier::Hd
        } else {
            QualityTier::Standard
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetReference {
    pub scene_id: u32,
    pub kind: AssetKind,
    pub status: AssetStatus,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechnicalDetails {
    pub aspect_ratio: String,
    pub duration_secs: u32,
    /// `m:ss`
    pub duration: String,
    pub quality_tier: Option<QualityTier>,
    pub assets: Vec<AssetReference>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Recommendations {
    pub immediate: Vec<String>,
    pub retries: Vec<String>,
    pub short_term: Vec<String>,
    pub long_term: Vec<String>,
    pub ab_tests: Vec<String>,
}

/// The degenerate projection: readiness plus asset tallies.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub campaign_id: Uuid,
    pub readiness: Readiness,
    pub scene_count: usize,
    pub accepted_assets: usize,
    pub failed_assets: usize,
}

impl CampaignReport {
    pub fn build(campaign: &Campaign) -> Self {
        let brief = campaign.brief();
        let readiness = Readiness::of(campaign);

        let scenes: Vec<SceneReport> = campaign
            .scenes()
            .iter()
            .enumerate()
            .filter_map(|(i, scene)| scene_report(campaign, i, scene))
            .collect();

        let copy = campaign.copy().map(|copy| {
            let critique = copy.critique.as_ref();
            CopyReport {
                caption: copy.caption.clone(),
                hashtags: copy.hashtags.clone(),
                score: critique.map(|c| c.overall_score),
                scores: critique.map(|c| c.scores),
                strengths: critique
                    .map(|c| c.feedback.strengths.clone())
                    .unwrap_or_default(),
                issues: critique.map(|c| c.feedback.issues.clone()).unwrap_or_default(),
                improvements: critique
                    .map(|c| c.feedback.suggestions.clone())
                    .unwrap_or_default(),
            }
        });

        let copy_critique = campaign.copy().and_then(|c| c.critique.as_ref());
        let platform = brief.aspect_ratio.platform_label();

        let engagement = readiness.mean_score().map(|score| EngagementEstimate {
            estimated_reach: (BASE_REACH * score).round() as u64,
            engagement_rate_pct: ((BASE_ENGAGEMENT_RATE + ENGAGEMENT_QUALITY_BONUS * score)
                * 1000.0)
                .round()
                / 10.0,
            target_demographics: target_demographics(&brief.audience),
            suggested_hashtags: suggest_hashtags(&brief.product),
        });

        let duration_secs = campaign.scene_count() as u32 * SECONDS_PER_SCENE;
        let technical = TechnicalDetails {
            aspect_ratio: brief.aspect_ratio.to_string(),
            duration_secs,
            duration: format!("{}:{:02}", duration_secs / 60, duration_secs % 60),
            quality_tier: readiness.mean_score().map(QualityTier::from_score),
            assets: asset_references(campaign),
        };

        Self {
            campaign_id: campaign.id(),
            generated_at: Utc::now(),
            overview: Overview {
                product: brief.product.clone(),
                audience: brief.audience.clone(),
                aspect_ratio: brief.aspect_ratio.to_string(),
                platform: platform.to_string(),
                scene_count: campaign.scene_count(),
                readiness,
                campaign_created_at: campaign.created_at(),
            },
            content_analysis: content_analysis(&scenes, copy_critique, platform),
            recommendations: recommendations(&scenes, copy_critique, platform),
            scenes,
            copy,
            engagement,
            technical,
        }
    }

    pub fn summary(&self) -> ReportSummary {
        let statuses = self
            .technical
            .assets
            .iter()
            .map(|a| a.status)
            .collect::<Vec<_>>();
        ReportSummary {
            campaign_id: self.campaign_id,
            readiness: self.overview.readiness.clone(),
            scene_count: self.overview.scene_count,
            accepted_assets: statuses
                .iter()
                .filter(|s| **s == AssetStatus::Accepted)
                .count(),
            failed_assets: statuses
                .iter()
                .filter(|s| **s == AssetStatus::Failed)
                .count(),
        }
    }
}

fn scene_report(campaign: &Campaign, index: usize, scene: &Scene) -> Option<SceneReport> {
    let assets = campaign.scene_assets(index)?;
    Some(SceneReport {
        scene_id: scene.id,
        voiceover_line: scene.voiceover.clone(),
        on_screen_text: scene.on_screen_text.clone(),
        image: AssetReport::from_asset(&assets.image),
        video: AssetReport::from_asset(&assets.video),
        voiceover: VoiceoverReport {
            status: assets.voiceover.status(),
            content: assets.voiceover.content().map(|c| c.describe()),
            error: assets.voiceover.last_error().map(str::to_string),
        },
    })
}

fn asset_references(campaign: &Campaign) -> Vec<AssetReference> {
    let mut refs = Vec::new();
    for (i, scene) in campaign.scenes().iter().enumerate() {
        let Some(assets) = campaign.scene_assets(i) else {
            continue;
        };
        for kind in [AssetKind::Image, AssetKind::Video, AssetKind::Voiceover] {
            let asset = assets.get(kind);
            refs.push(AssetReference {
                scene_id: scene.id,
                kind,
                status: asset.status(),
                content: asset.content().map(|c| c.describe()),
            });
        }
    }
    refs
}

fn visual_reports(scene: &SceneReport) -> [(&'static str, &AssetReport); 2] {
    [("image", &scene.image), ("video", &scene.video)]
}

fn content_analysis(
    scenes: &[SceneReport],
    copy: Option<&Critique>,
    platform: &str,
) -> ContentAnalysis {
    let mut analysis = ContentAnalysis::default();
    let scores = || {
        scenes
            .iter()
            .flat_map(|s| visual_reports(s).map(|(_, r)| r.score))
            .flatten()
    };

    if scores().any(|s| s > HIGH_QUALITY_SCORE) {
        analysis.strengths.push("High-quality visual content".to_string());
    }
    if copy.map(|c| c.overall_score > HIGH_QUALITY_SCORE).unwrap_or(false) {
        analysis.strengths.push("Compelling post copy".to_string());
    }

    if scores().any(|s| s < WEAK_SCORE) {
        analysis
            .weaknesses
            .push("Some visual content needs improvement".to_string());
    }
    let failed = scenes
        .iter()
        .flat_map(|s| visual_reports(s).map(|(_, r)| r.status))
        .chain(scenes.iter().map(|s| s.voiceover.status))
        .filter(|s| *s == AssetStatus::Failed)
        .count();
    if failed > 0 {
        analysis
            .weaknesses
            .push(format!("{} asset(s) failed to generate", failed));
    }

    if copy
        .map(|c| c.scores.platform_optimization > DEPLOYMENT_THRESHOLD)
        .unwrap_or(false)
    {
        analysis
            .opportunities
            .push(format!("Strong potential for {} engagement", platform));
    }

    let weak_brand = scenes
        .iter()
        .flat_map(|s| visual_reports(s).map(|(_, r)| r.scores))
        .flatten()
        .any(|scores| scores.brand_alignment < WEAK_SCORE);
    if weak_brand {
        analysis
            .threats
            .push("Inconsistent brand messaging may impact campaign effectiveness".to_string());
    }

    analysis
}

fn recommendations(
    scenes: &[SceneReport],
    copy: Option<&Critique>,
    platform: &str,
) -> Recommendations {
    let mut recs = Recommendations::default();

    for scene in scenes {
        for (label, report) in visual_reports(scene) {
            match report.score {
                Some(score) if score < DEPLOYMENT_THRESHOLD => {
                    let hint = report
                        .improvements
                        .first()
                        .map(|s| format!(": {}", s))
                        .unwrap_or_default();
                    recs.immediate.push(format!(
                        "Improve the {} for scene {} (score {:.2}){}",
                        label, scene.scene_id, score, hint
                    ));
                }
                _ => {}
            }
            if report.status == AssetStatus::Failed {
                recs.retries.push(format!(
                    "Retry {} generation for scene {}{}",
                    label,
                    scene.scene_id,
                    report
                        .error
                        .as_ref()
                        .map(|e| format!(" ({})", e))
                        .unwrap_or_default()
                ));
            }
        }
        if scene.voiceover.status == AssetStatus::Failed {
            recs.retries
                .push(format!("Retry voiceover generation for scene {}", scene.scene_id));
        }
    }

    if copy
        .map(|c| c.scores.platform_optimization > HIGH_QUALITY_SCORE)
        .unwrap_or(false)
    {
        recs.short_term
            .push(format!("Prioritize {} content distribution", platform));
    }
    recs.long_term
        .push("Develop consistent brand voice across campaigns".to_string());
    recs.ab_tests.push("Test different video lengths".to_string());

    recs
}

/// Comma-separated audience description as a list.
fn target_demographics(audience: &str) -> Vec<String> {
    audience
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Hashtags from the longer words of the product description.
fn suggest_hashtags(product: &str) -> Vec<String> {
    product
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
        })
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{}", tag))
        .take(MAX_SUGGESTED_HASHTAGS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_hashtags() {
        let tags = suggest_hashtags("Eco-friendly bamboo toothbrush for the whole family, now");
        assert_eq!(
            tags,
            vec!["#ecofriendly", "#bamboo", "#toothbrush", "#whole", "#family"]
        );
    }

    #[test]
    fn test_target_demographics() {
        assert_eq!(
            target_demographics("Gen Z, college students , ,parents"),
            vec!["Gen Z", "college students", "parents"]
        );
    }

    #[test]
    fn test_quality_tier() {
        assert_eq!(QualityTier::from_score(0.85), QualityTier::UltraHd);
        assert_eq!(QualityTier::from_score(0.8), QualityTier::Hd);
        assert_eq!(QualityTier::from_score(0.6), QualityTier::Standard);
        assert_eq!(
            serde_json::to_value(QualityTier::UltraHd).unwrap(),
            serde_json::json!("4K")
        );
    }
}
