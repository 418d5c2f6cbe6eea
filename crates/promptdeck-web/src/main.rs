//! Prompt registry API server.
//!
//! Loads the definition directory once at startup, then serves the HTTP
//! API until the process exits. Host, port, and the two data locations
//! come from flags, with `PROMPTDECK_*` environment variables as
//! fallback.
//!
//! # Usage
//!
//! ```sh
//! promptdeck-web --prompts-dir ./prompts --port 5000
//! PROMPTDECK_PORT=8080 PROMPTDECK_PROMPTS_DIR=/srv/prompts promptdeck-web
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use promptdeck_web::{AppState, build_router, serve};
use tracing::info;

/// Prompt registry API server.
#[derive(Parser)]
#[command(name = "promptdeck-web")]
struct Args {
    /// Host to bind (fallback: PROMPTDECK_HOST, default 127.0.0.1)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (fallback: PROMPTDECK_PORT, default 5000)
    #[arg(long)]
    port: Option<u16>,

    /// Directory of prompt definition documents
    /// (fallback: PROMPTDECK_PROMPTS_DIR, default "prompts")
    #[arg(long)]
    prompts_dir: Option<PathBuf>,

    /// Usage log file (fallback: PROMPTDECK_USAGE_LOG,
    /// default "prompt_usage.jsonl")
    #[arg(long)]
    usage_log: Option<PathBuf>,
}

/// Environment variable value, else the default.
fn env_or(env_var: &str, default: &str) -> String {
    std::env::var(env_var).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let host = args.host.unwrap_or_else(|| env_or("PROMPTDECK_HOST", "127.0.0.1"));
    let port = match args.port {
        Some(port) => port,
        None => match env_or("PROMPTDECK_PORT", "5000").parse() {
            Ok(port) => port,
            Err(e) => {
                eprintln!("Error: PROMPTDECK_PORT is not a valid port: {e}");
                process::exit(1);
            }
        },
    };
    let prompts_dir = args
        .prompts_dir
        .unwrap_or_else(|| PathBuf::from(env_or("PROMPTDECK_PROMPTS_DIR", "prompts")));
    let usage_log = args
        .usage_log
        .unwrap_or_else(|| PathBuf::from(env_or("PROMPTDECK_USAGE_LOG", "prompt_usage.jsonl")));

    let bind_addr: SocketAddr = match format!("{host}:{port}").parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Error: invalid bind address {host}:{port}: {e}");
            process::exit(1);
        }
    };

    // Load once, serve many: the registry is immutable after this point.
    let state = AppState::load(&prompts_dir, &usage_log);
    info!(
        "Loaded {} prompt ids from {} ({} skipped)",
        state.registry.len(),
        prompts_dir.display(),
        state.registry.skipped
    );

    if let Err(e) = serve(build_router(state), bind_addr).await {
        eprintln!("Error: server failed: {e}");
        process::exit(1);
    }
}
