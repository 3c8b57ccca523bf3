mod output;
mod theme;

use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use lagerfield::{
    AppConfig,
    media::CloudinaryMediaStore,
    migration::{BlobRelocator, ImageMigration, MigrationReport, default_targets},
};

use output::OutputManager;

#[derive(Parser)]
#[command(name = "migrate-images")]
#[command(version)]
#[command(
    about = "Move locally stored uploads to the cloud image host",
    long_about = r#"Uploads every file still referenced as /api/uploads/<file> by a team member,
insight, service or the site settings to the cloud image host, rewrites the
record to the returned URL and removes the local copy.

Configuration comes from the environment (a .env file is loaded first):
  REDIS_URL, LAGERFIELD_PREFIX, UPLOAD_DIR, CLOUD_FOLDER_ROOT,
  CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY, CLOUDINARY_API_SECRET
"#
)]
struct Cli {}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    Cli::parse();
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let output = OutputManager::detect();
    match run().await {
        Ok(report) => {
            output.report(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            output.error(&format!("Migration failed: {err:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<MigrationReport> {
    let config = AppConfig::load(None).context("failed to load configuration")?;
    let cloudinary = config
        .cloudinary()
        .context("cloud image host credentials are required")?;
    let store = config
        .connect_store()
        .await
        .context("failed to connect to the document store")?;

    let relocator = BlobRelocator::new(
        config.media.upload_dir.clone(),
        Arc::new(CloudinaryMediaStore::new(cloudinary)),
    );
    let targets = default_targets(&config.media.folder_root);
    ImageMigration::new(store, relocator)
        .run(&targets)
        .await
        .context("migration aborted")
}
