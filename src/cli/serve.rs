//! HTTP server startup command

use super::helpers::{load_config, GlobalOptions};
use std::net::SocketAddr;
use std::sync::Arc;
use storygate_core::{
    api::{ApiServer, ApiServerConfig},
    error::{GateError, Result},
    IntakeGate,
};
use tracing::debug;

/// Handle server startup command
pub async fn handle(options: &GlobalOptions, addr: Option<String>) -> Result<()> {
    let config = load_config(options)?;
    let addr = addr.unwrap_or_else(|| config.server.addr.clone());
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| GateError::Validation(format!("Invalid address '{}': {}", addr, e)))?;

    debug!("Starting HTTP API server...");
    let event = config.event.name.clone();
    let gate = Arc::new(IntakeGate::open(config).await?);
    let server = ApiServer::new(ApiServerConfig { addr: socket_addr }, gate);

    println!();
    println!("Storygate intake for {}", event);
    println!();
    println!("   Address: http://{}", socket_addr);
    println!();
    println!("   Endpoints:");
    println!("   • POST /submit  - Submit feedback or a story");
    println!("   • GET  /summary - Analytics summary (JSON)");
    println!("   • GET  /report  - Analytics report (text)");
    println!("   • POST /redeem  - Redeem a reward code");
    println!("   • GET  /health  - Health check");
    println!();

    server.serve().await?;
    Ok(())
}
