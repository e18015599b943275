//! InFocus - Telegram channel news annotation pipeline.
//!
//! A tool for fetching posts from public Telegram channels and annotating
//! them with a local LLM: title, tags, summary, and an embedding vector.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if infocus::cli::is_verbose() {
        "infocus=info"
    } else {
        "infocus=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    infocus::cli::run().await
}
