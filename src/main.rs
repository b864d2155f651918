use anyhow::Context;
use clap::Parser;

mod app;
mod cli;
mod config;
mod logs;
mod render;
mod store;

use crate::{app::App, cli::Cli, config::AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logs::init_logger()?;

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Invalid configuration")?;

    let mut app = App::new(config, cli.json)?;
    let result = app.run(cli.command).await;
    app.shutdown().await;
    if let Err(e) = &result {
        log::debug!("Command failed: {:#}", e);
    }
    result
}
