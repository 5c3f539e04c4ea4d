pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod http;
pub mod rating;
pub mod services;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

use crate::cli::Command;
use crate::config::AppConfig;
use crate::services::server::ServerService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve(port: u16) -> Result<()> {
    let config = AppConfig::from_env()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let service = ServerService::new(port, config);
        service.run().await
    })
}

/// Creates the schema in `path_override`, or in the configured path when absent
pub fn handle_setup(path_override: Option<&str>) -> Result<()> {
    let config = AppConfig::from_env()?;
    let path = path_override.unwrap_or(&config.store.database_path);

    let pool = database::create_pool(path)?;
    let mut conn = database::get_connection(&pool)?;
    database::setup::initialize_schema(&mut conn)?;

    log::info!("Schema ready in {}", path);
    Ok(())
}
