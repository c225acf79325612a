//! pgops MCP server
//!
//! Exposes schema management, CRUD and pgvector operations on one PostgreSQL
//! database as Model Context Protocol tools.

use std::sync::Arc;

use pgops_server::config::Config;
use pgops_server::logging;
use pgops_server::mcp::PgOpsServerHandler;
use pgops_server::postgres::PostgresDriver;
use rust_mcp_sdk::mcp_server::{hyper_server, HyperServerOptions};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets such as DATABASE_URI usually live in .env
    dotenvy::dotenv().ok();

    let config = Config::load("config.yaml")?;
    config.apply_logging_env();
    logging::init()?;

    info!("Connecting to PostgreSQL (access mode: {:?})", config.database.access_mode);
    let driver = PostgresDriver::connect(&config.database).await?;
    info!("Database connection established");

    let handler = PgOpsServerHandler::new(Arc::new(driver));

    info!("Starting pgops MCP server on {}:{}", config.server.host, config.server.port);
    let server = hyper_server::create_server(
        PgOpsServerHandler::server_info(),
        handler,
        HyperServerOptions {
            host: config.server.host.clone(),
            port: config.server.port,
            sse_support: true,
            ..Default::default()
        },
    );

    server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server stopped: {}", e))?;

    Ok(())
}
