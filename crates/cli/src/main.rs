use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubedigest_core::{
    load_config, load_config_from_env, run_digest, validate_config, Config, DigestReport,
    GeminiClient, MarkdownDirSink, SanitizedConfig, SummarizeAndVerify, YouTubePlaylistSource,
};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "tubedigest.toml";

/// Exit code when items failed and `pipeline.fail_on_item_error` is set
const EXIT_ITEM_FAILURES: i32 = 2;

/// Summarize a YouTube playlist into fact-checked Markdown notes.
#[derive(Debug, Parser)]
#[command(name = "tubedigest", version)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, env = "TUBEDIGEST_CONFIG")]
    config: Option<PathBuf>,

    /// Playlist to digest (overrides youtube.playlist_id)
    #[arg(long)]
    playlist_id: Option<String>,

    /// Directory for the Markdown files (overrides output.dir)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Videos processed at once (overrides pipeline.max_concurrent)
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(playlist_id) = &self.playlist_id {
            config.youtube.playlist_id = playlist_id.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(max_concurrent) = self.max_concurrent {
            config.pipeline.max_concurrent = max_concurrent;
        }
    }
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None if PathBuf::from(DEFAULT_CONFIG_FILE).exists() => {
            info!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
            load_config(&PathBuf::from(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_FILE))?
        }
        None => {
            info!("No config file, using defaults and environment");
            load_config_from_env().context("Failed to load config from environment")?
        }
    };

    args.apply_overrides(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn exit_code(config: &Config, report: &DigestReport) -> i32 {
    let failed = !report.failures.is_empty() || !report.write_failures.is_empty();
    if failed && config.pipeline.fail_on_item_error {
        EXIT_ITEM_FAILURES
    } else {
        0
    }
}

async fn run() -> Result<i32> {
    // .env is optional
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(args.json_logs);

    if let Ok(path) = dotenv {
        info!("Loaded environment from {:?}", path);
    }

    let config = load(&args)?;
    info!("Configuration loaded: {:?}", SanitizedConfig::from(&config));

    let youtube_key = config
        .youtube
        .resolve_api_key()
        .context("YouTube API key is not configured")?;
    let gemini_key = config
        .llm
        .resolve_api_key()
        .context("Gemini API key is not configured")?;

    let source = YouTubePlaylistSource::new(&config.youtube, youtube_key)
        .context("Failed to create YouTube client")?;
    let gemini = Arc::new(
        GeminiClient::new(gemini_key, config.llm.model.clone()).with_api_base(&config.llm.api_base),
    );
    info!("Using model {}", config.llm.model);

    let processor = Arc::new(SummarizeAndVerify::new(
        Arc::clone(&gemini),
        config.prompt.clone(),
        config.llm.summarize,
        config.llm.validate,
    ));
    let sink = Arc::new(
        MarkdownDirSink::create(&config.output.dir)
            .await
            .context("Failed to create output directory")?,
    );

    let report = run_digest(&config, &source, gemini.as_ref(), processor, sink)
        .await
        .context("Digest run failed")?;

    info!(
        "Processed {} of {} videos in {} ms",
        report.results.len(),
        report.total_items,
        report.duration_ms()
    );
    for failure in &report.failures {
        warn!("Video {} ({}) failed: {}", failure.item_id, failure.key, failure.reason);
    }
    for failure in &report.write_failures {
        warn!("Could not write {}: {}", failure.name, failure.reason);
    }

    Ok(exit_code(&config, &report))
}
