// LLM-backed critic
//
// Sends the asset (inline image bytes, or a description for video and copy)
// to a text model with a JSON response format and parses the judgment.

use async_trait::async_trait;
use std::sync::Arc;

use super::{Critic, Critique, CritiqueContext, CritiqueSubject, DimensionScores, Feedback};
use crate::errors::CritiqueError;
use crate::providers::json::parse_json_object;
use crate::providers::{TextProvider, TextRequest};

const OUTPUT_REQUIREMENTS: &str = r#"**OUTPUT REQUIREMENTS:**
Return valid JSON only:
{
  "overallScore": 0.85,
  "scores": {
    "brandAlignment": 0.9,
    "visualQuality": 0.8,
    "messageClarity": 0.9,
    "safetyEthics": 1.0,
    "platformOptimization": 0.85
  },
  "feedback": {
    "strengths": ["what works well"],
    "issues": ["specific problems found, empty if none"],
    "suggestions": ["how to improve"]
  },
  "deploymentReady": true
}"#;

pub struct LlmCritic {
    provider: Arc<dyn TextProvider>,
}

impl LlmCritic {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Critic for LlmCritic {
    async fn critique(
        &self,
        subject: &CritiqueSubject,
        context: &CritiqueContext,
    ) -> Result<Critique, CritiqueError> {
        let prompt = critique_prompt(subject, context);
        let mut request = TextRequest::new(prompt).json();
        if let CritiqueSubject::Image(data) = subject {
            request = request.with_attachment(data.clone());
        }

        tracing::debug!(
            subject = subject.label(),
            provider = self.provider.name(),
            "Requesting critique"
        );

        let text = self.provider.generate_text(&request).await?;
        parse_critique_response(&text)
    }
}

/// Raw JSON shape from the judge. Its `overallScore` and `deploymentReady`
/// are ignored and recomputed from the dimension scores.
#[derive(Debug, serde::Deserialize)]
struct RawCritique {
    scores: DimensionScores,
    #[serde(default)]
    feedback: Feedback,
}

fn parse_critique_response(text: &str) -> Result<Critique, CritiqueError> {
    let raw: RawCritique =
        parse_json_object(text).map_err(|e| CritiqueError::Malformed(e.to_string()))?;
    let scores = raw.scores.clamped()?;
    Ok(Critique::from_scores(scores, raw.feedback))
}

fn critique_prompt(subject: &CritiqueSubject, context: &CritiqueContext) -> String {
    match subject {
        CritiqueSubject::Image(_) => image_prompt(context),
        CritiqueSubject::Video { .. } => video_prompt(context),
        CritiqueSubject::Copy { caption, hashtags } => copy_prompt(caption, hashtags, context),
    }
}

fn scene_position(context: &CritiqueContext) -> (u32, usize) {
    context
        .scene
        .as_ref()
        .map(|s| (s.scene_id, s.scene_count))
        .unwrap_or((1, 1))
}

fn image_prompt(context: &CritiqueContext) -> String {
    let scene = context.scene.clone().unwrap_or_default();
    let (id, count) = scene_position(context);
    format!(
        "You are a visual content quality expert evaluating an AI-generated marketing image.\n\n\
        **SCENE CONTEXT:**\n\
        - Original Prompt: {prompt}\n\
        - Voiceover: \"{voiceover}\"\n\
        - Scene {id} of {count}\n\
        - Product: {product}\n\
        - Audience: {audience}\n\n\
        **EVALUATION CRITERIA:**\n\n\
        1. **Brand Alignment (0-1)**: Logo placement appropriate? Professional and consistent visual style? Appropriate for product?\n\
        2. **Visual Quality (0-1)**: Clear, professional, no artifacts or glitches? Good composition, lighting, and focus?\n\
        3. **Message Clarity (0-1)**: Product clearly visible and identifiable? Visual supports the voiceover message?\n\
        4. **Safety/Ethics (0-1)**: No inappropriate content, stereotypes, or misleading visuals? Safe for all audiences?\n\
        5. **Platform Optimization (0-1)**: Framing suitable for {framing}? Attention-grabbing?\n\n\
        {output}\n",
        prompt = scene.visual_prompt,
        voiceover = scene.voiceover,
        product = context.product,
        audience = context.audience,
        framing = context.aspect_ratio.framing(),
        output = OUTPUT_REQUIREMENTS,
    )
}

fn video_prompt(context: &CritiqueContext) -> String {
    let scene = context.scene.clone().unwrap_or_default();
    let (id, count) = scene_position(context);
    format!(
        "You are a video content quality expert evaluating an AI-generated marketing video clip.\n\n\
        **VIDEO CONTEXT:**\n\
        - Scene {id} of {count}\n\
        - Visual Concept: {prompt}\n\
        - Voiceover: \"{voiceover}\"\n\
        - On-Screen Text: \"{on_screen}\"\n\
        - Platform: {platform}\n\n\
        **EVALUATION CRITERIA:**\n\n\
        1. **Brand Alignment (0-1)**: Professional and consistent visual style? Motion and pacing appropriate for product marketing?\n\
        2. **Visual Quality (0-1)**: Smooth motion? No glitches or artifacts? Professional production value and transitions?\n\
        3. **Message Clarity (0-1)**: Visual action enhances the message? Text overlay readable and timed well? Clear storytelling?\n\
        4. **Safety/Ethics (0-1)**: No inappropriate motion, misleading sequences, or unsafe content? Suitable for all audiences?\n\
        5. **Platform Optimization (0-1)**: Duration appropriate (3-8 seconds)? Strong hook in the first second?\n\n\
        **ASSESSMENT GUIDELINES:**\n\
        - Video should be 3-8 seconds for optimal platform performance\n\
        - Motion should be dynamic but not chaotic\n\
        - Text overlays must be readable at mobile size\n\n\
        {output}\n",
        prompt = scene.visual_prompt,
        voiceover = scene.voiceover,
        on_screen = scene.on_screen_text,
        platform = context.aspect_ratio.platform_label(),
        output = OUTPUT_REQUIREMENTS,
    )
}

fn copy_prompt(caption: &str, hashtags: &[String], context: &CritiqueContext) -> String {
    format!(
        "You are a social media copywriting expert evaluating post copy for a video ad campaign.\n\n\
        **CAMPAIGN CONTEXT:**\n\
        - Product: {product}\n\
        - Audience: {audience}\n\
        - Platform: {platform}\n\n\
        **POST COPY TO EVALUATE:**\n\
        Caption:\n{caption}\n\n\
        Hashtags: {hashtags}\n\n\
        **EVALUATION CRITERIA:**\n\n\
        1. **Brand Alignment (0-1)**: Professional tone appropriate for product/audience? Authentic and trustworthy?\n\
        2. **Visual Quality (0-1)**: For text, rate formatting, emoji usage, and readability.\n\
        3. **Message Clarity (0-1)**: Clear value proposition? Strong hook in first line? Effective CTA?\n\
        4. **Safety/Ethics (0-1)**: No misleading claims, spam tactics, or false promises?\n\
        5. **Platform Optimization (0-1)**: Length appropriate for platform? 3-5 relevant hashtags?\n\n\
        {output}\n",
        product = context.product,
        audience = context.audience,
        platform = context.aspect_ratio.platform_label(),
        caption = caption,
        hashtags = hashtags.join(" "),
        output = OUTPUT_REQUIREMENTS,
    )
}
