//! Prefix-replay scan of a single game

use tracing::debug;

use crate::error::ScanError;
use crate::stockfish::StockfishEngine;

/// Replay a game move by move and collect every position that has at
/// least `solutions` distinct mate-in-`mate` continuations.
///
/// Each prefix of the move sequence is set up on the engine and
/// searched; qualifying positions are returned as FENs in the order
/// they occur along the game. A position that qualifies at several
/// prefixes is reported once per prefix. No early termination: the
/// full game is always walked.
pub async fn scan_game(
    engine: &mut StockfishEngine,
    moves: &[String],
    solutions: u32,
    mate: u32,
) -> Result<Vec<String>, ScanError> {
    let mut positions = Vec::new();
    for i in 1..=moves.len() {
        engine.set_position(&moves[..i]).await?;
        let lines = engine.mate_lines(mate).await?;
        if lines.len() >= solutions as usize {
            let fen = engine.current_fen().await?;
            debug!(prefix = i, count = lines.len(), fen = %fen, "Multi-mate position");
            positions.push(fen);
        }
    }
    Ok(positions)
}
