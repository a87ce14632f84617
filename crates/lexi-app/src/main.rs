use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use lexi_config::Config;
use tokio::signal;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
pub mod state;
pub mod vocabulary;
pub mod waterfall;

#[cfg(test)]
mod tests;

use self::cli::Cli;
use self::state::AppState;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LEXI_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder
            .with_ansi(atty::is(atty::Stream::Stderr))
            .try_init()
    };
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::new(),
    };
    let language = cli
        .language
        .clone()
        .unwrap_or_else(|| config.default_language.clone());

    let state = Arc::new(AppState::new(config).await?);

    tokio::select! {
        result = commands::run(state, cli.command, &language, cli.json) => result,
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
            Ok(())
        }
    }
}
