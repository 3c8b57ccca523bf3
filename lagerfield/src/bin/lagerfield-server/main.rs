use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lagerfield::{
    AppConfig,
    api::{self, AppState},
    config::{DEVELOPMENT_JWT_SECRET, MediaBackend},
};
use log::{info, warn};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "lagerfield-server")]
#[command(version)]
#[command(about = "HTTP API for the Lagerfield Capital site")]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "LAGERFIELD_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if config.auth.jwt_secret == DEVELOPMENT_JWT_SECRET {
        warn!("JWT_SECRET is not set; using the development secret");
    }
    if config.media.backend == MediaBackend::Local {
        tokio::fs::create_dir_all(&config.media.upload_dir)
            .await
            .with_context(|| format!("failed to create {}", config.media.upload_dir.display()))?;
    }

    let store = config
        .connect_store()
        .await
        .context("failed to connect to the document store")?;
    store.ping().await.context("document store did not answer PING")?;
    let media = config.media_store().context("failed to configure media storage")?;
    let addr = config.socket_addr()?;

    let app = api::router(AppState::new(config, store, media))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening at http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down");
        })
        .await?;
    Ok(())
}
