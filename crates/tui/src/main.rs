mod app;
mod form;
mod theme;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

use gameshelf_core::{
    config::{self, AppConfig},
    FileSlots, GameStore, Preferences,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    info!(data_dir = %config.data_dir.display(), "Starting GameShelf");

    let slots = FileSlots::new(&config.data_dir);
    let store = GameStore::load(slots.clone()).context("failed to load collection")?;
    let preferences = Preferences::load(slots).context("failed to load preferences")?;

    let mut app = app::GameShelfApp::new(store, preferences, config);
    app.run().await
}

// The terminal UI owns stdout, so logs only go to the file.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("gameshelf.log");

    let env_filter = EnvFilter::from_default_env();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
