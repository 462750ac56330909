//! adgen-narration - Narration quality gate CLI
//!
//! Subcommands:
//! - `storyboard <FILE>` - synthesize and validate every scene narration
//! - `validate <AUDIO> --text <TEXT>` - score an existing clip
//! - `voices` - list supported voices
//!
//! Reports are printed as JSON on stdout (or written with `--report`);
//! logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adgen_common::config::{ensure_directory, OutputRootResolver};
use adgen_narration::pipeline::{build_controller, build_validator};
use adgen_narration::workflow::Storyboard;
use adgen_narration::{QualityGateConfig, StoryboardRunner, Voice};
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for adgen-narration
#[derive(Parser, Debug)]
#[command(name = "adgen-narration")]
#[command(about = "Validated narration synthesis for ad storyboards")]
#[command(version)]
struct Cli {
    /// TOML config file (default: ADGEN_CONFIG, then <config_dir>/adgen/narration.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize and validate every narration in a storyboard JSON file
    Storyboard(StoryboardArgs),
    /// Score an existing audio file against its script
    Validate(ValidateArgs),
    /// List supported voices
    Voices,
}

#[derive(Args, Debug)]
struct StoryboardArgs {
    /// Storyboard JSON: {"scenes": [{"name": "...", "narration": "..."}]}
    file: PathBuf,

    /// Audio output root (default: ADGEN_OUTPUT_DIR, then config, then generated/audio)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    voice: Option<Voice>,

    #[arg(long)]
    min_quality_score: Option<f32>,

    #[arg(long)]
    max_retry_attempts: Option<u32>,

    /// Accept the first synthesized clip without validation
    #[arg(long)]
    no_validation: bool,

    /// Scenes processed concurrently
    #[arg(long)]
    concurrency: Option<usize>,

    /// Write the JSON report here instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Audio file to score
    audio: PathBuf,

    /// Script the clip should speak
    #[arg(long)]
    text: String,

    #[arg(long)]
    min_quality_score: Option<f32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Voices = cli.command {
        for voice in Voice::ALL {
            println!("{}", voice);
        }
        return Ok(());
    }

    let config = QualityGateConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config.logging.level);

    info!("Starting adgen-narration {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Storyboard(args) => run_storyboard(config, args).await,
        Command::Validate(args) => run_validate(config, args).await,
        Command::Voices => Ok(()),
    }
}

/// Initialize tracing: RUST_LOG wins, else the configured level
fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("adgen_narration={level},adgen_common={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_storyboard(mut config: QualityGateConfig, args: StoryboardArgs) -> Result<()> {
    // CLI overrides
    if let Some(voice) = args.voice {
        config.voice = voice;
    }
    if let Some(score) = args.min_quality_score {
        config.min_quality_score = score;
    }
    if let Some(attempts) = args.max_retry_attempts {
        config.max_retry_attempts = attempts;
    }
    if args.no_validation {
        config.enable_quality_validation = false;
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrent_units = concurrency;
    }
    config.validate().context("Invalid configuration")?;

    let api_key = config
        .resolve_api_key()
        .ok_or_else(|| anyhow!("No API key configured. Set OPENAI_API_KEY or api_key in narration.toml"))?;

    let output_root = OutputRootResolver::new().resolve(args.output_dir.as_deref(), config.output_dir.as_deref());
    ensure_directory(&output_root)
        .with_context(|| format!("Failed to create output directory {}", output_root.display()))?;

    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read storyboard {}", args.file.display()))?;
    let storyboard = Storyboard::from_json(&content)
        .with_context(|| format!("Failed to parse storyboard {}", args.file.display()))?;

    let controller = build_controller(&config, &api_key).context("Failed to initialize speech synthesis")?;
    let runner = StoryboardRunner::new(Arc::new(controller), config.max_concurrent_units);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    let report = runner
        .run(
            &storyboard,
            &config.voice_params(),
            &config.retry_policy(),
            &output_root,
            &cancel,
        )
        .await;

    if report.cancelled {
        warn!("Storyboard run was cancelled; report is partial");
    }

    emit_json(&report, args.report.as_deref()).await
}

async fn run_validate(config: QualityGateConfig, args: ValidateArgs) -> Result<()> {
    let min_score = args.min_quality_score.unwrap_or(config.min_quality_score);
    if !(0.0..=1.0).contains(&min_score) {
        return Err(anyhow!("--min-quality-score must be within [0, 1]"));
    }

    let api_key = config.resolve_api_key();
    let validator = build_validator(&config, api_key.as_deref());
    let verdict = validator.validate(&args.audio, &args.text, min_score).await;

    emit_json(&verdict, None).await
}

async fn emit_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, cancelling");
        },
        _ = terminate => {
            info!("Received terminate signal, cancelling");
        },
    }
}
