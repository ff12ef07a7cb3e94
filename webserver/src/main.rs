//! Webserver entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use pipeline::{HttpModelProvider, JobRunner, JobStore, MemoryStore, RateLimiter, SinkWriter};
use webserver::{build_router, spawn_limiter_sweep, AppState};

#[derive(Parser, Debug)]
#[command(name = "webserver", about = "Admin generation pipeline API")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Max generation submissions per client per window
    #[arg(long, default_value_t = 5)]
    generation_limit: u32,

    /// Max job polls per client per window
    #[arg(long, default_value_t = 60)]
    read_limit: u32,

    /// Rate-limit window in seconds
    #[arg(long, default_value_t = 60)]
    window_secs: u64,

    /// Directory for file-sink artifacts
    #[arg(long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    shared::logging::init_tracing_with_level(args.log_level.as_deref());

    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
        warn!("OPENAI_API_KEY not set; provider calls will fail authentication");
        String::new()
    });

    let provider = Arc::new(HttpModelProvider::new(api_key));
    let sink = SinkWriter::new(Arc::new(MemoryStore::new()), args.output_dir.clone());
    let runner = JobRunner::new(JobStore::new(), provider, sink);

    let window = Duration::from_secs(args.window_secs);
    let state = AppState::new(
        runner,
        RateLimiter::new(args.generation_limit, window),
        RateLimiter::new(args.read_limit, window),
    );

    spawn_limiter_sweep(
        vec![
            Arc::clone(&state.generation_limiter),
            Arc::clone(&state.read_limiter),
        ],
        Duration::from_secs(60),
    );

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Listening on {addr}");
    axum::serve(listener, router)
        .await
        .context("server terminated")?;
    Ok(())
}
