// Storyboard planning
//
// Turns a brief into the fixed list of scenes. Malformed output is a hard
// failure: a campaign is never built from a partially parsed plan.

use serde::Deserialize;

use super::{CampaignBrief, Scene};
use crate::errors::{GenerationError, PreconditionError};
use crate::providers::json::parse_json_object;
use crate::providers::{TextProvider, TextRequest};

/// Largest storyboard a brief may ask for.
pub const MAX_SCENES: usize = 10;

#[derive(Debug, Deserialize)]
struct PlanResponse {
    storyboard: Storyboard,
}

#[derive(Debug, Deserialize)]
struct Storyboard {
    scenes: Vec<RawScene>,
}

#[derive(Debug, Deserialize)]
struct RawScene {
    voiceover: String,
    #[serde(default)]
    on_screen_text: String,
    visual_prompt: String,
}

/// Ask the text model for a storyboard and validate it.
pub async fn generate_plan(
    provider: &dyn TextProvider,
    brief: &CampaignBrief,
) -> Result<Vec<Scene>, GenerationError> {
    if brief.scene_count == 0 || brief.scene_count > MAX_SCENES {
        return Err(PreconditionError::InvalidSceneCount {
            requested: brief.scene_count,
            max: MAX_SCENES,
        }
        .into());
    }

    tracing::info!(
        scenes = brief.scene_count,
        format = %brief.aspect_ratio,
        "Generating campaign plan"
    );

    let request = TextRequest::new(plan_prompt(brief)).json();
    let text = provider.generate_text(&request).await?;
    let scenes = parse_plan(&text)?;

    if scenes.len() != brief.scene_count {
        tracing::warn!(
            requested = brief.scene_count,
            returned = scenes.len(),
            "Plan scene count differs from the brief"
        );
    }
    Ok(scenes)
}

fn plan_prompt(brief: &CampaignBrief) -> String {
    format!(
        "You are a world-class marketing creative director. Create a complete social ad campaign as a single, valid JSON object.\n\n\
        Product: {product}\n\
        Primary audience: {audience}\n\
        Ad Format: {format}\n\
        Total scenes desired: {count}\n\n\
        The JSON object must have a \"storyboard\" key, which is an object containing a \"scenes\" array.\n\
        Each scene in the array must be an object with these exact keys: \"id\" (1-based index), \
        \"voiceover\" (a short, punchy line), \"on_screen_text\" (a few words, max 9), and \
        \"visual_prompt\" (a rich, descriptive prompt for an image generation model, including camera shots, \
        lighting, and mood, suitable for the chosen ad format).\n",
        product = brief.product,
        audience = brief.audience,
        format = brief.aspect_ratio.format_label(),
        count = brief.scene_count,
    )
}

/// Parse and validate. Scene ids are assigned by position (1-based).
fn parse_plan(text: &str) -> Result<Vec<Scene>, GenerationError> {
    let response: PlanResponse = parse_json_object(text)
        .map_err(|e| GenerationError::Malformed(format!("plan is not valid JSON: {}", e)))?;

    let raw = response.storyboard.scenes;
    if raw.is_empty() {
        return Err(GenerationError::Malformed(
            "plan contains no scenes".to_string(),
        ));
    }
    if raw.len() > MAX_SCENES {
        return Err(GenerationError::Malformed(format!(
            "plan contains {} scenes, more than the maximum of {}",
            raw.len(),
            MAX_SCENES
        )));
    }

    raw.into_iter()
        .enumerate()
        .map(|(i, scene)| {
            if scene.visual_prompt.trim().is_empty() {
                return Err(GenerationError::Malformed(format!(
                    "scene {} has an empty visual prompt",
                    i + 1
                )));
            }
            Ok(Scene {
                id: i as u32 + 1,
                voiceover: scene.voiceover.trim().to_string(),
                on_screen_text: scene.on_screen_text.trim().to_string(),
                visual_prompt: scene.visual_prompt.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::AspectRatio;
    use crate::errors::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedText {
        reply: String,
        calls: AtomicU32,
    }

    impl FixedText {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl TextProvider for FixedText {
        async fn generate_text(&self, request: &TextRequest) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(request.prompt.contains("Total scenes desired"));
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn brief(scene_count: usize) -> CampaignBrief {
        CampaignBrief {
            product: "Solar lantern".into(),
            audience: "Campers".into(),
            aspect_ratio: AspectRatio::Square,
            scene_count,
        }
    }

    #[tokio::test]
    async fn test_generate_plan_parses_scenes() {
        let provider = FixedText::new(
            r#"{"storyboard": {"scenes": [
                {"id": 7, "voiceover": " Light the night. ", "on_screen_text": "Glow on", "visual_prompt": "Lantern in a tent"},
                {"id": 7, "voiceover": "Charge by day.", "visual_prompt": "Lantern on a backpack"}
            ]}}"#,
        );
        let scenes = generate_plan(&provider, &brief(2)).await.unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].id, 1);
        assert_eq!(scenes[1].id, 2);
        assert_eq!(scenes[0].voiceover, "Light the night.");
        assert_eq!(scenes[1].on_screen_text, "");
    }

    #[tokio::test]
    async fn test_malformed_plan_is_hard_failure() {
        let provider = FixedText::new("{\"storyboard\": {\"scenes\": \"oops\"}}");
        let err = generate_plan(&provider, &brief(2)).await.unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));

        let provider = FixedText::new("{\"storyboard\": {\"scenes\": []}}");
        let err = generate_plan(&provider, &brief(2)).await.unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_oversized_plan_is_rejected() {
        let scene = r#"{"voiceover": "Go", "visual_prompt": "Lantern at dusk"}"#;
        let scenes = vec![scene; MAX_SCENES + 1].join(",");
        let provider = FixedText::new(&format!(r#"{{"storyboard": {{"scenes": [{scenes}]}}}}"#));

        let err = generate_plan(&provider, &brief(MAX_SCENES)).await.unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
        assert!(err.to_string().contains("more than the maximum"));
    }

    #[tokio::test]
    async fn test_empty_visual_prompt_rejected() {
        let provider = FixedText::new(
            r#"{"storyboard": {"scenes": [{"voiceover": "Hi", "visual_prompt": "  "}]}}"#,
        );
        let err = generate_plan(&provider, &brief(1)).await.unwrap_err();
        assert!(err.to_string().contains("empty visual prompt"));
    }

    #[tokio::test]
    async fn test_scene_count_checked_before_any_call() {
        let provider = FixedText::new("{}");
        for count in [0, MAX_SCENES + 1] {
            let err = generate_plan(&provider, &brief(count)).await.unwrap_err();
            assert!(matches!(
                err,
                GenerationError::Precondition(PreconditionError::InvalidSceneCount { .. })
            ));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
