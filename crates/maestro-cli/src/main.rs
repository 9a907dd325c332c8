use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod logger;

pub const DEFAULT_FILENAMES: [&str; 2] = ["maestro.toml", ".maestro.toml"];

fn configure_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = config::Cli::parse();
    configure_logger();

    match cli.command {
        config::Commands::Serve { file, bind } => commands::serve::serve(file, bind).await,
        config::Commands::Check { file } => commands::check::check(file),
    }
}
