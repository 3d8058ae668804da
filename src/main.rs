use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use aws_news_digest::config::Config;
use aws_news_digest::fetcher::run_aggregation;
use aws_news_digest::routes::{self, AppState};
use clap::{Parser, Subcommand};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aws-news-digest")]
#[command(about = "Aggregate AWS RSS feeds into news.json and browse it")]
struct Cli {
    /// Path to the TOML configuration
    #[arg(long, default_value = "feeds.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every feed once and rewrite the news document
    Aggregate {
        /// Override the output path from the config
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Serve the news document as a filterable page
    Serve {
        /// Override the document path from the config
        #[arg(long)]
        news: Option<PathBuf>,
        /// Override the listen address from the config
        #[arg(long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aws_news_digest=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    info!("Loaded {} feeds from configuration", config.feeds.len());
    for name in config.unmapped_feeds() {
        warn!("Feed '{}' has no viewer category and will only appear under 'all'", name);
    }

    match cli.command {
        Command::Aggregate { output } => {
            if let Some(output) = output {
                config.output = output;
            }
            // Only a failed write ends up here; feed errors are absorbed
            if let Err(e) = run_aggregation(&config).await {
                error!("Error generating news document: {:#}", e);
                return Err(e);
            }
        }
        Command::Serve { news, listen } => {
            let news_path = news.unwrap_or_else(|| config.output.clone());
            let listen = listen.unwrap_or_else(|| config.listen.clone());

            if !news_path.exists() {
                warn!("{} does not exist yet; run `aggregate` first", news_path.display());
            }
            let state = Arc::new(AppState::new(news_path.clone()));

            let app = routes::router(state)
                .route_service("/news.json", ServeFile::new(&news_path))
                .nest_service("/static", ServeDir::new("static"))
                .layer(TraceLayer::new_for_http());

            let listener = tokio::net::TcpListener::bind(&listen).await?;
            info!("Viewer starting on http://{}", listen);

            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
