mod cli;
mod configure;

use std::error::Error;

use clap::Parser;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;
use zotsave_mcp::ZotsaveMcp;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    match Cli::parse().command {
        Command::Serve => serve().await,
        Command::Configure { force } => configure::run(force).map_err(Into::into),
    }
}

async fn serve() -> Result<(), Box<dyn Error>> {
    init_tracing();
    // Credentials may live in a .env next to the working directory.
    dotenvy::dotenv().ok();
    tracing::info!("starting add-to-zotero MCP server on stdio");
    let service = ZotsaveMcp::new().serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

/// Logs go to stderr; stdout belongs to the MCP transport.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
