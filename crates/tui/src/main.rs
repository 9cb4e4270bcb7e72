mod app;
mod table_view;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use qvalve_core::{
    config::{self, AppConfig},
    listing, ServerTable,
};
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    info!(base_url = %config.base_url, listing = %config.listing_path.display(), "starting");

    let (table, status) = match listing::load_listing(&config.listing_path) {
        Ok(servers) => {
            let table = listing::build_table(servers, &config.filters);
            let status = format!("Loaded {} servers", table.len());
            (table, status)
        }
        Err(err) => {
            error!(?err, "Server listing load failed");
            (
                ServerTable::default(),
                format!("Failed to load server listing: {err:#}"),
            )
        }
    };

    let mut app = app::QvalveApp::new(&config, table, status)?;
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("qvalve.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal belongs to the UI, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
