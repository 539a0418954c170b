// src/main.rs — Wayfarer entry point

use clap::Parser;

use wayfarer::cli::{self, Cli, Commands};
use wayfarer::infra::config::Config;
use wayfarer::infra::logger;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG)
    logger::init_logging("info");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    match cli.command {
        Commands::Serve { port } => cli::serve::run_serve(&config, port).await,
        Commands::Chat { session } => cli::chat::run_chat(&config, session.as_deref()).await,
        Commands::Sessions { action } => cli::sessions::run(&config, action).await,
    }
}
