pub mod cli;
pub mod config;
pub mod gateway;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;

use cli::Args;
use config::AppConfig;
use gateway::Gateway;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = Arc::new(AppConfig::from_args(&args)?);

    info!("--- Core Configuration ---");
    info!("Server Address: {}", config.server_addr);
    info!("Model: {}", config.model);
    info!("Generation API: {}", config.base_url);
    info!("System Prompt Mode: {}", config.system_prompt_mode);
    info!("Static Directory: {}", config.static_dir);
    info!("TLS Enabled: {}", config.tls.is_some());
    info!("-------------------------");

    let gateway = Gateway::from_config(&config);
    info!("Starting server on: {}", config.server_addr);
    let server = Server::new(config, gateway);
    server.run().await?;

    Ok(())
}
