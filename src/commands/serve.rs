//! Serve command - Run the HTTP API

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use dashboard_api::config::Config;
use dashboard_api::server;

pub fn execute(config: Config) -> Result<()> {
    println!(
        "{} http://{} (data: {})",
        "Serving:".green(),
        config.address(),
        config.data_dir.display()
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(server::serve(config))
}
