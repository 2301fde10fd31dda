//! Batch driver: stream a game database through the scan pipeline

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::pgn_extract;
use crate::scanner;
use crate::stockfish::StockfishEngine;

/// Totals of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Game lines fed through the pipeline.
    pub games: u64,
    /// Qualifying positions written to the output.
    pub hits: u64,
}

/// A database line is a game record iff it is non-blank, is not a
/// `[`-prefixed tag pair, and carries no `eval` annotation. Everything
/// else is header or separator content and never reaches a subprocess.
fn is_game_line(line: &str) -> bool {
    !line.trim().is_empty() && !line.starts_with('[') && !line.contains("eval")
}

/// Progress and summary are suppressed on request, and always when the
/// results go to stdout so status lines cannot interleave with data.
fn suppress_status(config: &ScanConfig) -> bool {
    config.quiet || config.output == "-"
}

/// Run the full pipeline over the configured game database.
///
/// One engine session is held open across all games; one converter
/// process is spawned per game line. Results are written one FEN per
/// line and flushed after each game, so a partial run leaves partial
/// results behind.
pub async fn run(config: &ScanConfig) -> Result<Summary, ScanError> {
    let quiet = suppress_status(config);

    let mut engine = StockfishEngine::new(
        &config.stockfish_path(),
        config.solutions,
        config.threads,
    )
    .await?;
    info!(
        solutions = config.solutions,
        mate = config.mate,
        threads = config.threads,
        "Engine session ready"
    );

    let input: Box<dyn AsyncRead + Unpin> = if config.file == "-" {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(File::open(&config.file).await?)
    };
    let mut lines = BufReader::new(input).lines();

    let output: Box<dyn AsyncWrite + Unpin> = if config.output == "-" {
        Box::new(tokio::io::stdout())
    } else {
        Box::new(File::create(&config.output).await?)
    };
    let mut output = BufWriter::new(output);

    let converter = config.pgn_extract_path();
    let mut games: u64 = 0;
    let mut hits: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        if !is_game_line(&line) {
            continue;
        }
        games += 1;
        if !quiet {
            eprint!("\rProcessing game {games}: {hits} total hits");
        }

        let moves = pgn_extract::convert(&converter, &line).await?;
        if moves.is_empty() {
            warn!(game = games, "Converter produced no moves, skipping game");
            continue;
        }

        let positions = scanner::scan_game(&mut engine, &moves, config.solutions, config.mate).await?;
        hits += positions.len() as u64;
        for fen in &positions {
            output.write_all(fen.as_bytes()).await?;
            output.write_all(b"\n").await?;
        }
        output.flush().await?;
    }
    output.flush().await?;

    engine.quit().await;

    if !quiet {
        let source = if config.file == "-" {
            "STDIN"
        } else {
            config.file.as_str()
        };
        eprintln!("\n\nProcessed all {games} games in '{source}'.");
        eprintln!(
            "Found {hits} positions with {} or more different mate in {} solutions.",
            config.solutions, config.mate
        );
        eprintln!("Wrote results to '{}'.", config.output);
    }

    Ok(Summary { games, hits })
}
