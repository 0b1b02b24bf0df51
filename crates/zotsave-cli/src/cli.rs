use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "zotsave", about = "Save web sources to a Zotero library from an MCP-enabled assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the MCP server on stdio (for Claude Desktop and other MCP clients)
    Serve,
    /// Interactive setup: store credentials and register the server with Claude Desktop
    Configure {
        /// Overwrite an existing Claude Desktop entry without asking
        #[arg(long)]
        force: bool,
    },
}
