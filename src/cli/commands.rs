//! CLI commands implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::ProgressBar;

use crate::config::{ModelConfig, Settings};
use crate::embedding::{EmbeddingBackend, OllamaEmbedder, StubEmbedder};
use crate::llm::{Annotator, LlmBackend, OllamaBackend, StubBackend};
use crate::pipeline::AnnotationPipeline;
use crate::telegram::{ChannelConfig, ChannelFetcher};

#[derive(Parser)]
#[command(name = "infocus")]
#[command(about = "Telegram channel news annotation pipeline")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base URL of the Ollama-compatible model server
    #[arg(long, global = true, env = "INFOCUS_ENDPOINT")]
    endpoint: Option<String>,

    /// Use deterministic stub backends (no model server required)
    #[arg(long, global = true)]
    offline: bool,

    /// Use the Mistral 7B model preset instead of the default
    #[arg(long, global = true)]
    mistral: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch posts from channels and annotate them
    Annotate {
        /// Channel usernames to fetch (e.g. "durov")
        channels: Vec<String>,
        /// Annotate literal texts instead of (or besides) fetched posts
        #[arg(short, long)]
        text: Vec<String>,
        /// Number of most recent posts to fetch per channel
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Write JSON output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch posts from a channel and print them as JSON
    Fetch {
        /// Channel username (e.g. "durov")
        channel: String,
        /// Number of most recent posts to fetch
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// List models available at the endpoint
    Models,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(endpoint) = cli.endpoint.clone() {
        settings.endpoint = endpoint;
    }
    if cli.offline {
        settings.offline = true;
    }

    let config = if cli.mistral {
        ModelConfig::for_mistral()
    } else {
        ModelConfig::default()
    };

    match cli.command {
        Commands::Annotate {
            channels,
            text,
            limit,
            output,
        } => cmd_annotate(&settings, config, channels, text, limit, output).await,
        Commands::Fetch { channel, limit } => cmd_fetch(channel, limit).await,
        Commands::Models => cmd_models(&settings).await,
    }
}

async fn cmd_annotate(
    settings: &Settings,
    config: ModelConfig,
    channels: Vec<String>,
    texts: Vec<String>,
    limit: usize,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if channels.is_empty() && texts.is_empty() {
        anyhow::bail!("specify at least one channel or --text");
    }

    let mut posts = texts;
    if !channels.is_empty() {
        let fetcher = ChannelFetcher::new();
        for name in &channels {
            let channel = ChannelConfig::new(name.clone(), limit)?;
            let messages = fetcher.fetch_channel_messages(&channel).await?;
            eprintln!(
                "{} {} posts from @{}",
                style("Fetched").green().bold(),
                messages.len(),
                channel.username()
            );
            posts.extend(messages.into_iter().map(|m| m.text));
        }
    }

    let (backend, embedder): (Arc<dyn LlmBackend>, Arc<dyn EmbeddingBackend>) =
        if settings.offline {
            (Arc::new(StubBackend::default()), Arc::new(StubEmbedder))
        } else {
            (
                Arc::new(OllamaBackend::new(&settings.endpoint)),
                Arc::new(OllamaEmbedder::new(&settings.endpoint)),
            )
        };
    let annotator = Annotator::new(backend, config.clone());
    let pipeline = AnnotationPipeline::new(annotator, embedder, config);

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Annotating {} posts", posts.len()));
    spinner.enable_steady_tick(Duration::from_millis(120));
    let annotated = pipeline.annotate_posts(&posts).await?;
    spinner.finish_and_clear();

    let json = serde_json::to_string_pretty(&annotated)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            eprintln!(
                "{} {} annotated posts to {}",
                style("Wrote").green().bold(),
                annotated.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn cmd_fetch(channel: String, limit: usize) -> anyhow::Result<()> {
    let channel = ChannelConfig::new(channel, limit)?;
    let fetcher = ChannelFetcher::new();
    let messages = fetcher.fetch_channel_messages(&channel).await?;
    println!("{}", serde_json::to_string_pretty(&messages)?);
    Ok(())
}

async fn cmd_models(settings: &Settings) -> anyhow::Result<()> {
    let backend = OllamaBackend::new(&settings.endpoint);
    if !backend.is_available().await {
        anyhow::bail!(
            "Ollama not available at {}. Make sure Ollama is running: ollama serve",
            settings.endpoint
        );
    }
    for name in backend.list_models().await? {
        println!("{}", name);
    }
    Ok(())
}
