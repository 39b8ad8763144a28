mod api;
mod bulk;
mod cli;
mod config;
mod error;
mod model;
mod payload;
mod sheet;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use api::client::OpenProjectClient;
use cli::Cli;

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("opbulk={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Config problems stop the run before any request goes out
    let config = config::load_config(cli.config.as_deref())?;
    let client = OpenProjectClient::new(&config)?;

    cli::run(&client, cli.command).await
}
