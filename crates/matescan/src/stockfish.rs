//! Stockfish engine session over the UCI text protocol (async I/O)

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::debug;

use crate::error::ScanError;

/// The engine must complete the UCI handshake within this window.
const INIT_TIMEOUT: Duration = Duration::from_secs(30);
/// Upper bound on the gap between two response lines of a running query.
const READ_TIMEOUT: Duration = Duration::from_secs(300);

/// One long-lived engine process, configured once and reused for every
/// position of a run.
///
/// Lifecycle: [`StockfishEngine::new`] spawns and configures,
/// [`set_position`](Self::set_position) / [`mate_lines`](Self::mate_lines) /
/// [`current_fen`](Self::current_fen) query, [`quit`](Self::quit) tears down.
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI.
    ///
    /// `multipv` is the number of principal variations reported per search
    /// and `threads` the engine's own search parallelism; both are pinned
    /// for the session.
    pub async fn new(path: &str, multipv: u32, threads: u32) -> Result<Self, ScanError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| ScanError::Engine(format!("Failed to spawn Stockfish at {path}: {e}")))?;

        let stdin = process.stdin.take().unwrap();
        let stdout = BufReader::new(process.stdout.take().unwrap());

        let mut engine = Self {
            process,
            stdin,
            stdout,
        };

        // The startup banner and the option listing are consumed by the
        // scan for uciok, whatever their length.
        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine
            .send(&format!("setoption name MultiPV value {multipv}"))
            .await?;
        engine
            .send(&format!("setoption name Threads value {threads}"))
            .await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), ScanError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| ScanError::Engine(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| ScanError::Engine(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one response line, failing distinctly when the engine stops
    /// talking and hard when it exits.
    async fn read_line(&mut self, limit: Duration, ctx: &'static str) -> Result<String, ScanError> {
        let mut line = String::new();
        let n = timeout(limit, self.stdout.read_line(&mut line))
            .await
            .map_err(|_| ScanError::Unresponsive(ctx))?
            .map_err(|e| ScanError::Engine(format!("Failed to read from Stockfish: {e}")))?;
        if n == 0 {
            return Err(ScanError::Engine(
                "Stockfish closed its output stream".into(),
            ));
        }
        let trimmed = line.trim_end();
        debug!(line = trimmed, "SF >");
        Ok(trimmed.to_string())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), ScanError> {
        loop {
            if self.read_line(INIT_TIMEOUT, "handshake").await? == expected {
                return Ok(());
            }
        }
    }

    /// Replay a move-sequence prefix from the standard starting position.
    /// Request-only: the engine sends no reply to `position`.
    pub async fn set_position(&mut self, moves: &[String]) -> Result<(), ScanError> {
        self.send(&format!("position startpos moves {}", moves.join(" ")))
            .await
    }

    /// Run a fixed-depth search and collect the first move of every PV
    /// reported at exactly the target depth with a forced mate in `mate`.
    ///
    /// The list is not deduplicated: distinctness of MultiPV lines is the
    /// engine's guarantee, not re-checked here.
    pub async fn mate_lines(&mut self, mate: u32) -> Result<Vec<String>, ScanError> {
        let depth = 2 * mate - 1;
        self.send(&format!("go depth {depth}")).await?;

        let mut firsts = Vec::new();
        loop {
            let line = self.read_line(READ_TIMEOUT, "search").await?;
            if line.starts_with("bestmove") {
                break;
            }
            if !line.starts_with("info") {
                continue;
            }
            if parse_field(&line, "depth") == Some(i64::from(depth))
                && parse_score_mate(&line) == Some(i64::from(mate))
            {
                if let Some(first) = parse_pv_first(&line) {
                    firsts.push(first);
                }
            }
        }
        Ok(firsts)
    }

    /// Ask the engine to describe its current board state and extract the
    /// FEN from the diagram block. The block is consumed through its
    /// trailing `Checkers:` line so later reads start clean.
    pub async fn current_fen(&mut self) -> Result<String, ScanError> {
        self.send("d").await?;

        let mut fen = None;
        loop {
            let line = self.read_line(READ_TIMEOUT, "board report").await?;
            if let Some(rest) = line.strip_prefix("Fen:") {
                fen = Some(rest.trim().to_string());
            }
            if line.starts_with("Checkers:") {
                break;
            }
        }
        fen.ok_or_else(|| ScanError::Engine("Board report carried no Fen: line".into()))
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Parse the integer following a keyword token in an info line.
fn parse_field(line: &str, key: &str) -> Option<i64> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == key && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse a forced-mate score (`score mate <n>`) from an info line.
fn parse_score_mate(line: &str) -> Option<i64> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "score" && parts.get(i + 1) == Some(&"mate") {
            return parts.get(i + 2)?.parse().ok();
        }
    }
    None
}

/// First move of the principal variation in an info line.
fn parse_pv_first(line: &str) -> Option<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "pv" {
            return parts.get(i + 1).map(|m| m.to_string());
        }
    }
    None
}
