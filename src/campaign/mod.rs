// Campaign aggregate: brief, storyboard scenes, and per-scene assets
//
// The campaign owns every scene and asset. Scenes are fixed once the plan is
// known; assets are mutated only through the iteration controller and the
// orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::critic::{Critique, CritiqueContext, SceneContext};
use crate::errors::PreconditionError;
use crate::providers::InlineData;

mod asset;
pub mod plan;

pub use asset::{Asset, AssetKind, AssetStatus, ContentRef, HistoryEntry};
pub use plan::{generate_plan, MAX_SCENES};

/// Ad format: drives prompts, critique context, and video parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "9:16")]
    Vertical,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Vertical => "9:16",
            AspectRatio::Square => "1:1",
        }
    }

    pub fn platform_label(&self) -> &'static str {
        match self {
            AspectRatio::Vertical => "TikTok/Instagram Reels/YouTube Shorts",
            AspectRatio::Square => "Instagram/Facebook Feed",
        }
    }

    /// How the framing is described to generators and critics.
    pub fn framing(&self) -> &'static str {
        match self {
            AspectRatio::Vertical => "vertical mobile video",
            AspectRatio::Square => "square social feed",
        }
    }

    pub fn format_label(&self) -> &'static str {
        match self {
            AspectRatio::Vertical => "Vertical Video (9:16) for platforms like TikTok/Reels",
            AspectRatio::Square => "Square Video (1:1) for feed posts",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "9:16" | "vertical" => Ok(AspectRatio::Vertical),
            "1:1" | "square" => Ok(AspectRatio::Square),
            other => Err(format!(
                "unsupported aspect ratio '{}': expected 9:16 or 1:1",
                other
            )),
        }
    }
}

/// Operator input for a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignBrief {
    pub product: String,
    pub audience: String,
    pub aspect_ratio: AspectRatio,
    pub scene_count: usize,
}

/// One storyboard unit. Immutable after planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: u32,
    pub voiceover: String,
    pub on_screen_text: String,
    pub visual_prompt: String,
}

/// The three generated assets of one scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneAssets {
    pub image: Asset,
    pub video: Asset,
    pub voiceover: Asset,
}

impl SceneAssets {
    fn new() -> Self {
        Self {
            image: Asset::new(AssetKind::Image),
            video: Asset::new(AssetKind::Video),
            voiceover: Asset::new(AssetKind::Voiceover),
        }
    }

    pub fn get(&self, kind: AssetKind) -> &Asset {
        match kind {
            AssetKind::Image => &self.image,
            AssetKind::Video => &self.video,
            AssetKind::Voiceover => &self.voiceover,
        }
    }

    fn get_mut(&mut self, kind: AssetKind) -> &mut Asset {
        match kind {
            AssetKind::Image => &mut self.image,
            AssetKind::Video => &mut self.video,
            AssetKind::Voiceover => &mut self.voiceover,
        }
    }
}

/// Campaign-level social post copy and its critique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCopy {
    pub caption: String,
    pub hashtags: Vec<String>,
    pub critique: Option<Critique>,
}

/// Pipeline stages in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Images,
    Videos,
    Voiceovers,
    Copy,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Images => "images",
            Stage::Videos => "videos",
            Stage::Voiceovers => "voiceovers",
            Stage::Copy => "copy",
            Stage::Report => "report",
        })
    }
}

/// Which stages are open, derived from asset statuses.
///
/// A stage unlocks once every asset of the previous stage is terminal
/// (complete, accepted, or failed). Export needs every asset usable and a
/// critiqued post copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageGate {
    pub images_settled: bool,
    pub videos_settled: bool,
    pub voiceovers_settled: bool,
    pub copy_settled: bool,
    pub export_ready: bool,
}

impl StageGate {
    pub fn is_unlocked(&self, stage: Stage) -> bool {
        match stage {
            Stage::Images => true,
            Stage::Videos => self.images_settled,
            Stage::Voiceovers => self.videos_settled,
            Stage::Copy => self.voiceovers_settled,
            Stage::Report => self.copy_settled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    id: Uuid,
    brief: CampaignBrief,
    logo: Option<InlineData>,
    scenes: Vec<Scene>,
    assets: Vec<SceneAssets>,
    copy: Option<PostCopy>,
    created_at: DateTime<Utc>,
}

impl Campaign {
    /// Create a campaign with one fresh asset set per scene.
    pub fn new(brief: CampaignBrief, scenes: Vec<Scene>, logo: Option<InlineData>) -> Self {
        let assets = scenes.iter().map(|_| SceneAssets::new()).collect();
        Self {
            id: Uuid::new_v4(),
            brief,
            logo,
            scenes,
            assets,
            copy: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn brief(&self) -> &CampaignBrief {
        &self.brief
    }

    pub fn logo(&self) -> Option<&InlineData> {
        self.logo.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn scene(&self, index: usize) -> Result<&Scene, PreconditionError> {
        self.scenes
            .get(index)
            .ok_or(PreconditionError::UnknownScene { index })
    }

    pub fn scene_assets(&self, index: usize) -> Option<&SceneAssets> {
        self.assets.get(index)
    }

    pub fn asset(&self, index: usize, kind: AssetKind) -> Option<&Asset> {
        self.assets.get(index).map(|a| a.get(kind))
    }

    pub(crate) fn asset_mut(
        &mut self,
        index: usize,
        kind: AssetKind,
    ) -> Result<&mut Asset, PreconditionError> {
        self.assets
            .get_mut(index)
            .map(|a| a.get_mut(kind))
            .ok_or(PreconditionError::UnknownScene { index })
    }

    /// Inline bytes of the scene's usable image, the animation source for video.
    pub fn source_image(&self, index: usize) -> Option<&InlineData> {
        let image = &self.assets.get(index)?.image;
        if !image.status().is_usable() {
            return None;
        }
        image.content().and_then(ContentRef::as_inline)
    }

    pub fn copy(&self) -> Option<&PostCopy> {
        self.copy.as_ref()
    }

    pub(crate) fn set_copy(&mut self, copy: PostCopy) {
        self.copy = Some(copy);
    }

    /// Critic context for a scene, or for the whole campaign when `index` is None.
    pub fn critique_context(&self, index: Option<usize>) -> CritiqueContext {
        let scene = index.and_then(|i| self.scenes.get(i)).map(|s| SceneContext {
            scene_id: s.id,
            scene_count: self.scenes.len(),
            visual_prompt: s.visual_prompt.clone(),
            voiceover: s.voiceover.clone(),
            on_screen_text: s.on_screen_text.clone(),
        });
        CritiqueContext {
            product: self.brief.product.clone(),
            audience: self.brief.audience.clone(),
            aspect_ratio: self.brief.aspect_ratio,
            scene,
        }
    }

    fn all_assets(&self, kind: AssetKind, pred: impl Fn(AssetStatus) -> bool) -> bool {
        self.assets.iter().all(|a| pred(a.get(kind).status()))
    }

    pub fn stage_gate(&self) -> StageGate {
        let images_settled = self.all_assets(AssetKind::Image, AssetStatus::is_terminal);
        let videos_settled =
            images_settled && self.all_assets(AssetKind::Video, AssetStatus::is_terminal);
        let voiceovers_settled =
            videos_settled && self.all_assets(AssetKind::Voiceover, AssetStatus::is_terminal);
        let copy_critiqued = self
            .copy
            .as_ref()
            .map(|c| c.critique.is_some())
            .unwrap_or(false);
        let copy_settled = voiceovers_settled && self.copy.is_some();

        let export_ready = copy_critiqued
            && [AssetKind::Image, AssetKind::Video, AssetKind::Voiceover]
                .into_iter()
                .all(|kind| self.all_assets(kind, AssetStatus::is_usable));

        StageGate {
            images_settled,
            videos_settled,
            voiceovers_settled,
            copy_settled,
            export_ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critic::{DimensionScores, Feedback};

    fn brief() -> CampaignBrief {
        CampaignBrief {
            product: "Cold brew coffee".into(),
            audience: "Remote workers".into(),
            aspect_ratio: AspectRatio::Vertical,
            scene_count: 2,
        }
    }

    fn scenes(n: u32) -> Vec<Scene> {
        (1..=n)
            .map(|id| Scene {
                id,
                voiceover: format!("Line {}", id),
                on_screen_text: format!("Text {}", id),
                visual_prompt: format!("Visual {}", id),
            })
            .collect()
    }

    fn finish(campaign: &mut Campaign, index: usize, kind: AssetKind, ok: bool) {
        let asset = campaign.asset_mut(index, kind).unwrap();
        asset.begin_generation().unwrap();
        if ok {
            asset
                .complete(ContentRef::Inline(InlineData::new("image/png", "AAAA")))
                .unwrap();
        } else {
            asset.fail("boom").unwrap();
        }
    }

    #[test]
    fn test_aspect_ratio_parse_and_display() {
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Vertical);
        assert_eq!("square".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
        assert!("16:9".parse::<AspectRatio>().is_err());
        assert_eq!(AspectRatio::Square.to_string(), "1:1");
        assert_eq!(
            serde_json::to_value(AspectRatio::Vertical).unwrap(),
            serde_json::json!("9:16")
        );
    }

    #[test]
    fn test_new_campaign_has_one_asset_set_per_scene() {
        let campaign = Campaign::new(brief(), scenes(3), None);
        assert_eq!(campaign.scene_count(), 3);
        for i in 0..3 {
            assert_eq!(
                campaign.asset(i, AssetKind::Video).unwrap().status(),
                AssetStatus::Ready
            );
        }
        assert!(campaign.asset(3, AssetKind::Image).is_none());
        assert_eq!(
            campaign.scene(7).unwrap_err(),
            PreconditionError::UnknownScene { index: 7 }
        );
    }

    #[test]
    fn test_source_image_requires_usable_image() {
        let mut campaign = Campaign::new(brief(), scenes(2), None);
        assert!(campaign.source_image(0).is_none());

        finish(&mut campaign, 0, AssetKind::Image, true);
        finish(&mut campaign, 1, AssetKind::Image, false);
        assert!(campaign.source_image(0).is_some());
        assert!(campaign.source_image(1).is_none());
    }

    #[test]
    fn test_stage_gate_follows_terminal_statuses() {
        let mut campaign = Campaign::new(brief(), scenes(2), None);
        let gate = campaign.stage_gate();
        assert!(gate.is_unlocked(Stage::Images));
        assert!(!gate.is_unlocked(Stage::Videos));

        finish(&mut campaign, 0, AssetKind::Image, true);
        assert!(!campaign.stage_gate().is_unlocked(Stage::Videos));

        // A failed image still settles the stage
        finish(&mut campaign, 1, AssetKind::Image, false);
        let gate = campaign.stage_gate();
        assert!(gate.is_unlocked(Stage::Videos));
        assert!(!gate.is_unlocked(Stage::Voiceovers));

        for i in 0..2 {
            finish(&mut campaign, i, AssetKind::Video, true);
            finish(&mut campaign, i, AssetKind::Voiceover, true);
        }
        let gate = campaign.stage_gate();
        assert!(gate.is_unlocked(Stage::Copy));
        assert!(!gate.is_unlocked(Stage::Report));

        campaign.set_copy(PostCopy {
            caption: "Sip smarter".into(),
            hashtags: vec!["#coldbrew".into()],
            critique: Some(Critique::from_scores(
                DimensionScores::uniform(0.8),
                Feedback::default(),
            )),
        });
        let gate = campaign.stage_gate();
        assert!(gate.is_unlocked(Stage::Report));
        // Scene 2 image failed, so nothing can be exported yet
        assert!(!gate.export_ready);
    }

    #[test]
    fn test_critique_context_for_scene_and_campaign() {
        let campaign = Campaign::new(brief(), scenes(2), None);
        let scene_ctx = campaign.critique_context(Some(1));
        let scene = scene_ctx.scene.unwrap();
        assert_eq!(scene.scene_id, 2);
        assert_eq!(scene.scene_count, 2);
        assert_eq!(scene.visual_prompt, "Visual 2");

        let campaign_ctx = campaign.critique_context(None);
        assert!(campaign_ctx.scene.is_none());
        assert_eq!(campaign_ctx.product, "Cold brew coffee");
    }
}
