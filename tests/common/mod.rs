use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use matescan::config::ScanConfig;

/// Generate a unique suffix based on timestamp to avoid collisions
/// between concurrently running tests.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}

/// Scratch directory holding one test's mock subprocess scripts,
/// input database and output file.
pub struct TestEnv {
    pub dir: PathBuf,
}

impl TestEnv {
    pub fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("matescan-{name}-{}", unique_suffix()));
        fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    pub fn path(&self, file: &str) -> String {
        self.dir.join(file).to_str().unwrap().to_string()
    }

    /// Write a plain file into the scratch directory.
    pub fn write(&self, file: &str, contents: &str) -> String {
        let path = self.dir.join(file);
        fs::write(&path, contents).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn write_script(&self, file: &str, contents: &str) -> String {
        let path = self.write(file, contents);
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// Mock Stockfish speaking just enough UCI for the scanner.
    ///
    /// `rules` maps a position's move count to the number of mate-in-1
    /// info lines the mock reports for it; every other position
    /// reports none. The `d` diagram encodes the move count in its
    /// `Fen:` line so tests can tell prefixes apart.
    pub fn mock_stockfish(&self, rules: &[(usize, usize)]) -> String {
        let mut arms = String::new();
        for (nmoves, count) in rules {
            arms.push_str(&format!("        {nmoves})\n"));
            for i in 1..=*count {
                arms.push_str(&format!(
                    "          echo \"info depth 1 seldepth 2 multipv {i} \
score mate 1 nodes 30 nps 1000 pv mv{i} reply{i}\"\n"
                ));
            }
            arms.push_str("          ;;\n");
        }

        let script = format!(
            r#"#!/bin/bash
nmoves=0
while IFS= read -r line; do
  case "$line" in
    uci)
      echo "id name Mockfish 1"
      echo "id author matescan test suite"
      echo "uciok"
      ;;
    isready)
      echo "readyok"
      ;;
    setoption*)
      ;;
    "position startpos moves "*)
      rest="${{line#position startpos moves}}"
      set -- $rest
      nmoves=$#
      ;;
    "go depth "*)
      echo "info string mock search started"
      case "$nmoves" in
{arms}        *)
          ;;
      esac
      echo "bestmove a2a3"
      ;;
    d)
      echo ""
      echo " +---+ mock diagram +---+"
      echo ""
      echo "Fen: mock/position/$nmoves w - - 0 $nmoves"
      echo "Key: 8F8F01D4562F59FB"
      echo "Checkers: "
      ;;
    quit)
      exit 0
      ;;
  esac
done
"#
        );
        self.write_script("stockfish", &script)
    }

    /// Mock pgn-extract emitting a fixed `-Wuci` report for any input.
    ///
    /// Every invocation appends to `converter.calls` so tests can
    /// check how many game lines actually reached the converter.
    pub fn mock_pgn_extract(&self, movetext: &str) -> String {
        let calls = self.path("converter.calls");
        let script = format!(
            r#"#!/bin/bash
cat > /dev/null
echo x >> "{calls}"
echo '[Event "?"]'
echo '[Site "?"]'
echo '[Date "????.??.??"]'
echo '[Round "?"]'
echo '[White "?"]'
echo '[Black "?"]'
echo '[Result "1-0"]'
echo ''
echo '{movetext}'
echo ''
echo ''
echo '1 game matched out of 1.'
"#
        );
        self.write_script("pgn-extract", &script)
    }

    /// How many times the mock converter was invoked.
    pub fn converter_calls(&self) -> usize {
        fs::read_to_string(self.dir.join("converter.calls"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }
}

/// Build a ScanConfig pointing at the mock binaries.
pub fn config(
    stockfish: &str,
    converter: &str,
    input: &str,
    output: &str,
    extra: &[&str],
) -> ScanConfig {
    let mut args = vec![
        "matescan",
        "--stockfish",
        stockfish,
        "--pgn-extract",
        converter,
        "-o",
        output,
    ];
    args.extend_from_slice(extra);
    args.push(input);
    ScanConfig::try_parse_from(args).unwrap()
}
