//! `plume` command line interface.

use anyhow::Context;
use clap::{Parser, Subcommand};
use plume_core::config::Config;
use plume_core::pipeline::{Orchestrator, PipelineEvent, RunStatus, TopicRequest, WritingStyle};
use plume_core::summary;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plume", version, about = "Topic in, published article out")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Research, write, illustrate and publish an article on a topic
    Create {
        /// The topic to write about
        topic: String,
        /// Writing style: professional, casual, technical or accessible
        #[arg(long, default_value = "professional")]
        style: String,
        /// Who the article is for
        #[arg(long)]
        audience: Option<String>,
        /// Target platform, repeatable ("file", "medium")
        #[arg(long = "platform", default_values_t = vec!["file".to_string()])]
        platforms: Vec<String>,
        /// Directory for file publishing
        #[arg(long, default_value = "output")]
        output_dir: String,
        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,
        /// Override the configured log level for this run
        #[arg(long)]
        log_level: Option<String>,
    },
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::from_env().context("invalid configuration")?;
    let level_override = match &cli.command {
        Command::Create { log_level, .. } => log_level.clone(),
        Command::Config => None,
    };
    init_logging(level_override.as_deref().unwrap_or(&config.log_level));

    match cli.command {
        Command::Create {
            topic,
            style,
            audience,
            platforms,
            output_dir,
            json,
            log_level: _,
        } => create(config, topic, style, audience, platforms, output_dir, json).await,
        Command::Config => show_config(&config),
    }
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn create(
    config: Config,
    topic: String,
    style: String,
    audience: Option<String>,
    platforms: Vec<String>,
    output_dir: String,
    json: bool,
) -> anyhow::Result<()> {
    config
        .validate_required()
        .context("missing credentials, run `plume config` to see what is set")?;

    let style: WritingStyle = style
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("invalid --style")?;

    let mut request = TopicRequest::new(topic)
        .with_style(style)
        .with_platforms(platforms)
        .with_output_dir(output_dir);
    if let Some(audience) = audience {
        request = request.with_audience(audience);
    }

    let (tx, rx) = mpsc::channel::<PipelineEvent>(32);
    let progress = tokio::spawn(log_events(rx));

    let mut orchestrator = Orchestrator::from_config(&config).with_event_channel(tx);
    let report = orchestrator.run(request).await?;
    drop(orchestrator);
    let _ = progress.await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", summary::summarize(&report));
    }

    if report.status == RunStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn log_events(mut rx: mpsc::Receiver<PipelineEvent>) {
    while let Some(event) = rx.recv().await {
        if let Some(stage) = &event.stage {
            tracing::debug!(seq = event.seq, kind = ?event.kind, stage = %stage, "pipeline event");
        } else {
            tracing::debug!(seq = event.seq, kind = ?event.kind, "pipeline event");
        }
    }
}

fn show_config(config: &Config) -> anyhow::Result<()> {
    println!("provider:          {}", config.model.provider.display_name());
    println!("model:             {}", config.model.model);
    println!(
        "api key ({}): {}",
        config.model.provider.api_key_env(),
        presence(std::env::var(config.model.provider.api_key_env()).ok().as_deref())
    );
    println!("max sources:       {}", config.max_research_sources);
    println!("max retries:       {}", config.max_retries);
    println!(
        "searxng url:       {}",
        config.searxng_url.as_deref().unwrap_or("(public instances)")
    );
    println!(
        "unsplash key:      {}",
        presence(config.unsplash_access_key.as_deref())
    );
    println!(
        "medium token:      {}",
        presence(config.medium_access_token.as_deref())
    );
    Ok(())
}

fn presence(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if !v.trim().is_empty() => "set",
        _ => "not set",
    }
}
