use std::net::SocketAddr;

use clap::{Parser, Subcommand};

/// CLI for maestro
#[derive(Parser, Debug)]
#[command(name = "maestro", version, about = "Start, stop and restart development services over HTTP")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the orchestrator daemon and its HTTP API
    Serve {
        /// File path to the configuration file (TOML)
        #[arg(short, long)]
        file: Option<String>,

        /// Address to listen on, overrides `server.bind`
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Validate the configuration and list the services it defines
    Check {
        /// File path to the configuration file (TOML)
        #[arg(short, long)]
        file: Option<String>,
    },
}
