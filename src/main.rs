use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_kiosk::{Config, Kiosk};

#[derive(Parser, Debug)]
#[command(name = "voice-kiosk", about = "Push-to-talk voice kiosk")]
struct Args {
    /// Config file (TOML); KIOSK__* environment variables override it
    #[arg(short, long, default_value = "config/voice-kiosk.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let kiosk = Kiosk::from_config(&cfg)?;
    kiosk.controller.greet().await;

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {}", addr);

    let controller = kiosk.controller.clone();
    axum::serve(listener, kiosk.router())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down, releasing the capture device");
            controller.teardown().await;
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
