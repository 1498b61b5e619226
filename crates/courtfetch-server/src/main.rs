use anyhow::{Context, Result};
use clap::Parser;
use courtfetch_server::config::ServerConfig;
use courtfetch_server::{open_state, web};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Court case fetcher and judgment downloader", long_about = None)]
struct Args {
    /// Address to bind, e.g. 127.0.0.1:5000
    #[arg(long)]
    listen: Option<String>,
    /// SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,
    /// Directory for generated judgment files
    #[arg(long)]
    pdf_dir: Option<PathBuf>,
}

use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = ServerConfig::from_env();
    if let Some(listen) = args.listen {
        cfg.listen = listen;
    }
    if let Some(db) = args.db {
        cfg.db_path = db;
    }
    if let Some(dir) = args.pdf_dir {
        cfg.pdf_dir = dir;
    }

    init_logging(&cfg.log_level);

    tracing::info!(event = "server_start", config = ?cfg);

    let state = open_state(&cfg)?;
    let app = web::build_app(state);
    let listener = tokio::net::TcpListener::bind(&cfg.listen)
        .await
        .with_context(|| format!("bind {}", cfg.listen))?;
    axum::serve(listener, app).await.context("serve http")
}
