use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use match_coach::api::state::AppState;
use match_coach::api::{build_router, ApiError};
use match_coach::config::AppConfig;
use match_coach::models::Platform;
use match_coach::pipeline::{CoachPipeline, CoachReport, PipelineError, SummaryQuery};

#[derive(Parser)]
#[command(name = "match-coach")]
#[command(about = "League of Legends match summaries with AI coaching")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Summarize one player and print the report as JSON
    Lookup {
        /// Summoner display name
        #[arg(long)]
        summoner: Option<String>,

        /// Platform token, e.g. na1 or euw1
        #[arg(long)]
        platform: Option<String>,
    },

    /// List supported platforms and their regions
    Platforms,
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// JSON printed by `lookup`, plus a failure summary when the run failed.
///
/// Reports and error bodies share one shape on stdout.
fn render_lookup(
    outcome: Result<CoachReport, PipelineError>,
) -> serde_json::Result<(String, Option<String>)> {
    match outcome {
        Ok(report) => Ok((serde_json::to_string_pretty(&report)?, None)),
        Err(e) => {
            let (status, body) = ApiError::from(e).to_parts();
            let failure = format!("{} ({})", body.error, status);
            Ok((serde_json::to_string_pretty(&body)?, Some(failure)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    init_tracing(&config.log_level, cli.json_logs);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            tracing::info!("Starting match-coach v{}", env!("CARGO_PKG_VERSION"));
            let pipeline = CoachPipeline::from_config(&config)?;
            let addr = format!("{}:{}", config.server.host, config.server.port);
            let state = AppState {
                config: Arc::new(config),
                pipeline: Arc::new(pipeline),
            };

            let app = build_router(state);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Lookup { summoner, platform } => {
            let pipeline = CoachPipeline::from_config(&config)?;
            let query = SummaryQuery { summoner, platform };

            let (output, failure) = render_lookup(pipeline.run(&query).await)?;
            println!("{}", output);
            if let Some(failure) = failure {
                anyhow::bail!("lookup failed with {}", failure);
            }
        }
        Commands::Platforms => {
            for platform in Platform::ALL {
                println!("{:<6} {}", platform.as_str(), platform.region());
            }
        }
    }

    Ok(())
}
