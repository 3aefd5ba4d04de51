/// emotion-net progress monitor
///
/// Serves the training progress document over HTTP so a dashboard (or curl)
/// can poll it while `emotion-net train` runs in another process.
///
/// Run with:
///   cargo run --bin monitor -- --progress training_progress.json
///
/// Routes:
///   GET /                  → 303 to /progress
///   GET /progress          → the progress document as JSON
///   GET /progress/summary  → one-line text summary
///   GET /health            → liveness probe

mod routes;
mod state;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use clap::Parser;
use emotion_net::progress::JsonFileStore;
use tiny_http::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

use state::MonitorState;

#[derive(Debug, Parser)]
#[command(name = "monitor", about = "Serve training progress over HTTP")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,

    /// Progress document written by `emotion-net train`.
    #[arg(long, default_value = "training_progress.json")]
    progress: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let server = Server::http(&args.addr).map_err(|e| anyhow!("cannot bind {}: {e}", args.addr))?;
    info!(addr = %args.addr, progress = %args.progress.display(), "monitor listening");

    let shared_state = Arc::new(Mutex::new(MonitorState::new(JsonFileStore::new(args.progress))));

    for request in server.incoming_requests() {
        let state = shared_state.clone();
        std::thread::spawn(move || routes::dispatch(request, state));
    }
    Ok(())
}
