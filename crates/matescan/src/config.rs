//! Scanner configuration from CLI arguments and environment variables

use std::env;

use clap::Parser;

use crate::error::ScanError;

/// Search a database of chess games for mate-in-m positions with at least
/// n different solutions.
#[derive(Parser, Clone, Debug)]
#[command(name = "matescan", version, about)]
pub struct ScanConfig {
    /// The file containing all of the games that should be processed ('-' for stdin)
    pub file: String,

    /// Place the output into <FILE> ('-' for stdout)
    #[arg(short, value_name = "FILE", default_value = "positions.fen")]
    pub output: String,

    /// Only save positions with at least <N> different solutions
    #[arg(short = 'n', value_name = "N", default_value_t = 2)]
    pub solutions: u32,

    /// Only save positions that are mate in <MATE>
    #[arg(short = 'm', value_name = "MATE", default_value_t = 1)]
    pub mate: u32,

    /// Run the engine across <THREADS> different threads
    #[arg(short = 't', value_name = "THREADS", default_value_t = 1)]
    pub threads: u32,

    /// Run without informative output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to the Stockfish binary (falls back to $STOCKFISH_PATH)
    #[arg(long, value_name = "PATH")]
    pub stockfish: Option<String>,

    /// Path to the pgn-extract binary (falls back to $PGN_EXTRACT_PATH)
    #[arg(long = "pgn-extract", value_name = "PATH")]
    pub pgn_extract: Option<String>,
}

impl ScanConfig {
    /// Reject parameter values the engine protocol cannot express.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.solutions == 0 {
            return Err(ScanError::Config("-n must be at least 1"));
        }
        if self.mate == 0 {
            return Err(ScanError::Config("-m must be at least 1"));
        }
        if self.threads == 0 {
            return Err(ScanError::Config("-t must be at least 1"));
        }
        Ok(())
    }

    /// Engine binary: flag, then environment, then PATH lookup by name.
    pub fn stockfish_path(&self) -> String {
        self.stockfish
            .clone()
            .or_else(|| env::var("STOCKFISH_PATH").ok())
            .unwrap_or_else(|| "stockfish".to_string())
    }

    /// Converter binary: flag, then environment, then PATH lookup by name.
    pub fn pgn_extract_path(&self) -> String {
        self.pgn_extract
            .clone()
            .or_else(|| env::var("PGN_EXTRACT_PATH").ok())
            .unwrap_or_else(|| "pgn-extract".to_string())
    }
}
