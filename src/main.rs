// adforge - campaign asset generation with critique-driven regeneration
// Main entry point

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use adforge::campaign::{generate_plan, AspectRatio, Campaign, CampaignBrief};
use adforge::config::{load_config, Config};
use adforge::controller::{IterationController, IterationPolicy};
use adforge::critic::LlmCritic;
use adforge::generation::{AssetGenerator, PollSettings, Providers};
use adforge::logging::{init_tracing, CritiqueLogger};
use adforge::orchestrator::CampaignOrchestrator;
use adforge::providers::{ElevenLabsClient, GeminiClient, InlineData};
use adforge::report::write_report;

#[derive(Parser)]
#[command(name = "adforge")]
#[command(about = "Generate a multi-scene video ad campaign with automated critique")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.adforge/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct BriefArgs {
    /// Product description
    #[arg(short, long)]
    product: String,

    /// Primary audience (comma-separated segments)
    #[arg(short, long)]
    audience: String,

    /// Ad format: 9:16 or 1:1
    #[arg(short, long, default_value = "9:16")]
    format: AspectRatio,

    /// Number of scenes (1-10)
    #[arg(short, long, default_value = "3")]
    scenes: usize,
}

impl BriefArgs {
    fn into_brief(self) -> CampaignBrief {
        CampaignBrief {
            product: self.product,
            audience: self.audience,
            aspect_ratio: self.format,
            scene_count: self.scenes,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Plan, generate, critique, and report on a full campaign
    Generate {
        #[command(flatten)]
        brief: BriefArgs,

        /// Brand logo placed into every scene image (png, jpg, or webp)
        #[arg(short, long)]
        logo: Option<PathBuf>,

        /// Where to write the JSON report
        #[arg(short, long, default_value = "campaign-report.json")]
        report: PathBuf,
    },

    /// Print the storyboard plan for a brief without generating assets
    Plan {
        #[command(flatten)]
        brief: BriefArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan { brief } => plan(&config, brief.into_brief()).await,
        Commands::Generate {
            brief,
            logo,
            report,
        } => generate(&config, brief.into_brief(), logo.as_deref(), &report).await,
    }
}

async fn plan(config: &Config, brief: CampaignBrief) -> Result<()> {
    let gemini = GeminiClient::new(&config.gemini)?;
    let scenes = generate_plan(&gemini, &brief).await?;
    println!("{}", serde_json::to_string_pretty(&scenes)?);
    Ok(())
}

async fn generate(
    config: &Config,
    brief: CampaignBrief,
    logo: Option<&Path>,
    report_path: &Path,
) -> Result<()> {
    let logo = logo.map(load_logo).transpose()?;

    let gemini = Arc::new(GeminiClient::new(&config.gemini)?);
    let speech = Arc::new(ElevenLabsClient::new(&config.speech)?);

    let scenes = generate_plan(gemini.as_ref(), &brief)
        .await
        .context("Failed to generate campaign plan")?;
    let mut campaign = Campaign::new(brief, scenes, logo);
    tracing::info!(
        campaign = %campaign.id(),
        scenes = campaign.scene_count(),
        "Campaign planned"
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling... in-flight video operations will be abandoned");
            ctrl_c.cancel();
        }
    });

    let orchestrator = build_orchestrator(config, gemini, speech, cancel)?;
    let summary = orchestrator.run(&mut campaign).await;

    write_report(&summary.report, report_path)?;

    let short = summary.report.summary();
    println!("{}", serde_json::to_string_pretty(&short)?);
    println!("Report written to {}", report_path.display());

    if summary.cancelled {
        bail!("Run cancelled before all stages completed");
    }
    Ok(())
}

fn build_orchestrator(
    config: &Config,
    gemini: Arc<GeminiClient>,
    speech: Arc<ElevenLabsClient>,
    cancel: CancellationToken,
) -> Result<CampaignOrchestrator> {
    let providers = Providers {
        text: gemini.clone(),
        image: gemini.clone(),
        video: gemini.clone(),
        speech,
    };
    let poll = PollSettings {
        interval: config.pipeline.poll_interval(),
        max_wait: config.pipeline.video_max_wait(),
    };
    let generator = Arc::new(AssetGenerator::new(
        providers,
        config.speech.voice_id.clone(),
        poll,
    ));
    let critic = Arc::new(LlmCritic::new(gemini));

    let mut controller =
        IterationController::new(generator, critic, IterationPolicy::from(&config.pipeline))
            .with_cancellation(cancel);
    if let Some(path) = &config.pipeline.critique_log {
        controller = controller.with_critique_log(CritiqueLogger::new(path.clone())?);
    }

    Ok(CampaignOrchestrator::new(controller))
}

fn load_logo(path: &Path) -> Result<InlineData> {
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => bail!("Unsupported logo format: {} (use png, jpg, or webp)", path.display()),
    };
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read logo {}", path.display()))?;
    Ok(InlineData::from_bytes(mime, &bytes))
}
