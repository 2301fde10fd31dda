//! matescan
//!
//! Searches a database of chess games for positions with multiple
//! forced-mate solutions of a fixed length. Move legality and mate
//! detection are delegated to Stockfish; PGN conversion to pgn-extract.

use clap::Parser;
use tracing::info;

use matescan::config::ScanConfig;
use matescan::driver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs share stderr with the progress line, so default to warnings
    // only; RUST_LOG opts into more.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env for the engine/converter path fallbacks
    let _ = dotenvy::dotenv();

    let config = ScanConfig::parse();
    config.validate()?;

    let summary = driver::run(&config).await?;
    info!(games = summary.games, hits = summary.hits, "Scan complete");

    Ok(())
}
