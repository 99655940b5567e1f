//! gpai-tr: import, inspect and edit a stored transcript

use anyhow::Result;
use clap::Parser;
use gpai_common::config::{resolve_root_folder, GpaiConfig, ROOT_FOLDER_ENV};
use gpai_common::db::{init_database, SqliteTranscriptStore, TranscriptStore};
use gpai_tr::cli::{self, Cli};
use gpai_tr::TranscriptRepository;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting GPAi transcript tool (gpai-tr) v{}", env!("CARGO_PKG_VERSION"));

    let args = Cli::parse();

    let config = GpaiConfig::load_or_default(args.config.as_deref())?;
    let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, Some(&config));
    let db_path = config.database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let store: Arc<dyn TranscriptStore> = Arc::new(SqliteTranscriptStore::new(pool));
    let repository = TranscriptRepository::new(store, &config.sync);
    repository.wait_until_loaded().await;

    let mut stdout = std::io::stdout();
    cli::run(&args.command, &repository, &config.gpa, &mut stdout).await
}
