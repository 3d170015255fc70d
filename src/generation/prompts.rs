// Prompt builders for asset generation
//
// Critique feedback reaches later generations only through `augment_prompt`.

use crate::campaign::{AspectRatio, AssetKind, Campaign};
use crate::critic::Critique;

pub fn image_prompt(visual_prompt: &str, with_logo: bool, aspect_ratio: AspectRatio) -> String {
    let mut prompt = format!(
        "Generate a photorealistic image based on this description: \"{}\". Compose it for {} ({}).",
        visual_prompt,
        aspect_ratio.framing(),
        aspect_ratio
    );
    if with_logo {
        prompt.push_str(
            " The second image provided is a logo. Please place this logo naturally and \
             realistically onto the main product described in the scene.",
        );
    }
    prompt
}

pub fn video_prompt(visual_prompt: &str) -> String {
    format!(
        "Animate this image according to the following description: \"{}\"",
        visual_prompt
    )
}

pub fn copy_prompt(campaign: &Campaign) -> String {
    let brief = campaign.brief();
    let platform = match brief.aspect_ratio {
        AspectRatio::Vertical => {
            "vertical video platforms like TikTok, Instagram Reels, and YouTube Shorts"
        }
        AspectRatio::Square => "feed-based platforms like Instagram and Facebook",
    };

    let storyboard = campaign
        .scenes()
        .iter()
        .map(|scene| {
            format!(
                "Scene {}:\n- Visuals: {}\n- Voiceover: {}\n- On-screen text: {}",
                scene.id, scene.visual_prompt, scene.voiceover, scene.on_screen_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a social media marketing expert specializing in creating viral short-form video content.\n\
        Based on the following ad campaign details, generate a compelling post copy and relevant hashtags.\n\n\
        **Campaign Details:**\n\
        - **Product:** {product}\n\
        - **Target Audience:** {audience}\n\
        - **Platform:** {platform}\n\n\
        **Video Storyboard Summary:**\n\
        {storyboard}\n\n\
        **Instructions:**\n\
        1. Write a captivating and concise caption for the post. It should grab attention, explain \
        the value proposition, and have a clear call-to-action.\n\
        2. Provide a list of 5-7 highly relevant and trending hashtags.\n\n\
        Please format your response as a single, valid JSON object with two keys: \"caption\" \
        (a string) and \"hashtags\" (an array of strings).\n",
        product = brief.product,
        audience = brief.audience,
        platform = platform,
        storyboard = storyboard,
    )
}

/// Original prompt plus the critique's suggestions and issues to avoid.
pub fn augment_prompt(original: &str, critique: &Critique, kind: AssetKind) -> String {
    let improvements = critique.feedback.suggestions.join(". ");
    let issues = if critique.feedback.issues.is_empty() {
        String::new()
    } else {
        format!(
            "Avoid these issues: {}.",
            critique.feedback.issues.join(", ")
        )
    };
    let focus = match kind {
        AssetKind::Video => {
            "Apply these improvements focusing on smooth motion, professional transitions, \
             and engaging visual storytelling."
        }
        _ => {
            "Apply these improvements while maintaining the core concept. Focus on enhancing \
             visual quality, composition, and brand professionalism."
        }
    };

    format!(
        "{}\n\n**CRITICAL IMPROVEMENTS REQUIRED:**\n{}\n\n{}\n\n{}",
        original, improvements, issues, focus
    )
}
