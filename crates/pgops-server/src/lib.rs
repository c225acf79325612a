//! pgops server: configuration, logging, the tokio-postgres driver and the
//! MCP tool surface over the engine crates.

pub mod config;
pub mod logging;
pub mod mcp;
pub mod postgres;
pub mod tools;
