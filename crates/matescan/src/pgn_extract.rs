//! PGN to UCI conversion via an external pgn-extract process
//!
//! One converter process is spawned per game record, fed the record on
//! stdin and torn down after its report is read. `-Wuci` makes
//! pgn-extract re-emit the game in coordinate notation:
//!
//! ```text
//! [Event "?"]
//! [Site "?"]
//! [Date "????.??.??"]
//! [Round "?"]
//! [White "?"]
//! [Black "?"]
//! [Result "1-0"]
//!
//! d2d4 c7c6 c2c4 e7e6 e2e4 f7f6 e4e5 g7g5 d4d5 f6f5 d5e6 g5g4 h2h3 g4h3 d1h5 1-0
//!
//! 1 game matched out of 1.
//! ```
//!
//! The move list is recovered from that report by line shape rather
//! than by a fixed line offset, so tag-count or banner changes cannot
//! shift the extraction onto the wrong line.

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::ScanError;

/// Convert one PGN game record into its UCI coordinate-move sequence.
///
/// The trailing game-result token is dropped, so the returned list
/// holds exactly the game's half-moves. A record pgn-extract cannot
/// match yields an empty list, never an error.
pub async fn convert(path: &str, game_record: &str) -> Result<Vec<String>, ScanError> {
    let mut process = Command::new(path)
        .arg("-Wuci")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ScanError::Converter(format!("Failed to spawn pgn-extract at {path}: {e}")))?;

    // Write the record, then drop stdin so the converter sees EOF and
    // flushes its report.
    let mut stdin = process.stdin.take().unwrap();
    stdin
        .write_all(game_record.as_bytes())
        .await
        .map_err(|e| ScanError::Converter(format!("Failed to write to pgn-extract: {e}")))?;
    stdin
        .write_all(b"\n")
        .await
        .map_err(|e| ScanError::Converter(format!("Failed to write to pgn-extract: {e}")))?;
    drop(stdin);

    let output = process
        .wait_with_output()
        .await
        .map_err(|e| ScanError::Converter(format!("Failed to read pgn-extract output: {e}")))?;
    let report = String::from_utf8_lossy(&output.stdout);
    debug!(report = %report, "pgn-extract report");

    Ok(extract_moves(&report))
}

/// Pull the coordinate-move tokens out of a `-Wuci` report.
///
/// Tag pairs, blank lines, the processing banner and the `matched`
/// trailer are recognized and skipped; whatever remains is movetext
/// (possibly wrapped across lines). The final result token (`1-0`,
/// `0-1`, `1/2-1/2` or `*`) is not a move and is removed.
fn extract_moves(report: &str) -> Vec<String> {
    let mut moves: Vec<String> = report
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with('[')
                && !line.starts_with("Processing")
                && !line.contains("matched out of")
        })
        .flat_map(str::split_whitespace)
        .map(String::from)
        .collect();

    if matches!(moves.last().map(String::as_str), Some("1-0" | "0-1" | "1/2-1/2" | "*")) {
        moves.pop();
    }
    moves
}
