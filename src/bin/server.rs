use log::{error, info, warn};
use std::net::SocketAddr;

use rusty_accounts::config::ServerConfig;
use rusty_accounts::core::AppState;
use rusty_accounts::handlers::routes;

#[tokio::main]
async fn main() {
    // Initialize env
    let dotenv_result = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match dotenv_result {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Load config from .env
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, token_ttl={}h, development_mode={}",
        config.host, config.port, config.token_ttl_hours, config.development_mode
    );
    if config.development_mode {
        warn!("Development mode is enabled; do not use this configuration in production");
    }

    // Seed roles and the admin account
    let state = match AppState::bootstrap(&config).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            std::process::exit(1);
        }
    };

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    // Start the server
    info!("Starting Rusty Accounts server on {}", addr);
    warp::serve(routes(state)).run(addr).await;
}
