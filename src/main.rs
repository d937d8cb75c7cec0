// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database pool and job coordinator, start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use db::JobRepository;
use dotenv::dotenv;
use services::PoolManager;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        // Use configured log level or default
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting search-jobs service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize database pool and the job coordinator on top of it
    let settings = match config.coordinator_settings() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    let pool_manager = PoolManager::new(settings).create_tables(config.create_tables);
    let coordinator = match pool_manager
        .initialize(&config.db_config(), &config.table_names())
        .await
    {
        Ok(coordinator) => coordinator,
        Err(e) => {
            log::error!("Failed to initialize database pool: {}", e);
            std::process::exit(1);
        }
    };

    // 5. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let coordinator_data = web::Data::from(coordinator);

    let server = HttpServer::new(move || {
        App::new()
            // Application state (job coordinator)
            .app_data(coordinator_data.clone())
            // Middleware
            .wrap(Logger::default())
            // Routes
            .configure(handlers::health_config::<JobRepository>)
            .configure(handlers::jobs_config::<JobRepository>)
    })
    .bind(&server_addr);

    let result = match server {
        Ok(server) => server.run().await,
        Err(e) => {
            log::error!("Failed to bind {}: {}", server_addr, e);
            Err(e)
        }
    };

    // 6. Release the coordinator, then close the pool
    pool_manager.shutdown().await;
    log::info!("search-jobs service stopped");

    result
}
