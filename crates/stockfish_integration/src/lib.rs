//! Search/evaluation collaborator boundary. Chess rules live in [`rules`];
//! this module owns the external Stockfish process and the UCI dialogue
//! with it.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    process::{Child, ChildStdin, ChildStdout, Command},
    sync::Mutex,
};
use tracing::{debug, info, warn};

use shared::domain::Evaluation;

pub mod rules;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to spawn engine at '{path}': {source}")]
    Spawn {
        path: String,
        source: std::io::Error,
    },
    #[error("engine i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine closed its output stream")]
    Closed,
    #[error("engine answered out of protocol: {0}")]
    Protocol(String),
    #[error("engine did not answer within {0:?}")]
    Timeout(Duration),
}

/// Best-move and evaluation queries against the shared engine. Implemented
/// by [`StockfishEngine`] in production and by scripted stubs in tests.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Strongest move for the side to play, or `None` when the engine
    /// reports `bestmove (none)`.
    async fn best_move(&self, fen: &str) -> Result<Option<String>, EngineError>;

    /// Score of the position from White's perspective.
    async fn evaluate(&self, fen: &str) -> Result<Evaluation, EngineError>;
}

struct EngineIo {
    // Held for its lifetime; killed on drop.
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl EngineIo {
    async fn send(&mut self, command: &str) -> Result<(), EngineError> {
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn next_line(&mut self) -> Result<String, EngineError> {
        self.stdout.next_line().await?.ok_or(EngineError::Closed)
    }

    async fn wait_for(&mut self, marker: &str) -> Result<(), EngineError> {
        loop {
            if self.next_line().await?.trim().starts_with(marker) {
                return Ok(());
            }
        }
    }

    /// One `position fen` / `go depth` round. Returns the best move (if
    /// any) and the last score the search reported.
    async fn search(
        &mut self,
        fen: &str,
        depth: u32,
    ) -> Result<(Option<String>, Option<Evaluation>), EngineError> {
        // Resync before each query; the engine is stateful per position.
        self.send("isready").await?;
        self.wait_for("readyok").await?;
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut score = None;
        loop {
            let line = self.next_line().await?;
            let line = line.trim();
            if let Some(parsed) = parse_info_score(line) {
                score = Some(parsed);
            }
            if let Some(best) = parse_bestmove(line) {
                return Ok((best, score));
            }
        }
    }

    /// Aborts an in-flight search and consumes its pending `bestmove`
    /// line, so the next query does not pick up a stale answer.
    async fn cancel_search(&mut self) -> Result<(), EngineError> {
        self.send("stop").await?;
        loop {
            let line = self.next_line().await?;
            if parse_bestmove(line.trim()).is_some() {
                return Ok(());
            }
        }
    }
}

/// Handle on a Stockfish child process. One instance is shared
/// process-wide; the mutex serializes queries since each one is a
/// position-then-search dialogue.
pub struct StockfishEngine {
    io: Mutex<EngineIo>,
    depth: u32,
    timeout: Duration,
}

impl StockfishEngine {
    /// Spawns the binary at `path` and performs the UCI handshake.
    pub async fn spawn(path: &str, depth: u32, timeout: Duration) -> Result<Self, EngineError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: path.to_string(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdout unavailable".into()))?;

        let mut io = EngineIo {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        tokio::time::timeout(timeout, async {
            io.send("uci").await?;
            io.wait_for("uciok").await?;
            // Keep the engine small and deterministic; one search at a time.
            io.send("setoption name Threads value 1").await?;
            io.send("setoption name Hash value 64").await?;
            io.send("isready").await?;
            io.wait_for("readyok").await?;
            Ok::<_, EngineError>(())
        })
        .await
        .map_err(|_| EngineError::Timeout(timeout))??;

        info!(%path, depth, "stockfish engine ready");
        Ok(Self {
            io: Mutex::new(io),
            depth,
            timeout,
        })
    }

    async fn query(
        &self,
        fen: &str,
    ) -> Result<(Option<String>, Option<Evaluation>), EngineError> {
        let mut io = self.io.lock().await;
        match tokio::time::timeout(self.timeout, io.search(fen, self.depth)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%fen, timeout = ?self.timeout, "engine query timed out; aborting search");
                // The search is still running and its bestmove line is
                // still pending; resync before releasing the lock or the
                // next query would read the stale answer.
                tokio::time::timeout(self.timeout, io.cancel_search())
                    .await
                    .map_err(|_| EngineError::Timeout(self.timeout))??;
                Err(EngineError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl SearchEngine for StockfishEngine {
    async fn best_move(&self, fen: &str) -> Result<Option<String>, EngineError> {
        let (best, _) = self.query(fen).await?;
        debug!(%fen, best = best.as_deref().unwrap_or("(none)"), "engine best move");
        Ok(best)
    }

    async fn evaluate(&self, fen: &str) -> Result<Evaluation, EngineError> {
        let (_, score) = self.query(fen).await?;
        let score =
            score.ok_or_else(|| EngineError::Protocol("search reported no score".into()))?;
        Ok(white_perspective(score, fen))
    }
}

/// UCI scores come from the side to move; the API reports them from
/// White's perspective, so flip the sign when Black is on turn.
fn white_perspective(score: Evaluation, fen: &str) -> Evaluation {
    if fen.split_whitespace().nth(1) != Some("b") {
        return score;
    }
    match score {
        Evaluation::Cp(v) => Evaluation::Cp(-v),
        Evaluation::Mate(v) => Evaluation::Mate(-v),
    }
}

/// Parses `info ... score cp 31 ...` / `info ... score mate -2 ...` lines.
fn parse_info_score(line: &str) -> Option<Evaluation> {
    if !line.starts_with("info") {
        return None;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let at = tokens.iter().position(|&t| t == "score")?;
    let value: i32 = tokens.get(at + 2)?.parse().ok()?;
    match *tokens.get(at + 1)? {
        "cp" => Some(Evaluation::Cp(value)),
        "mate" => Some(Evaluation::Mate(value)),
        _ => None,
    }
}

/// Parses a `bestmove` line. Outer `None` when the line is not a bestmove
/// line; inner `None` for `bestmove (none)` (no motivated move).
fn parse_bestmove(line: &str) -> Option<Option<String>> {
    let rest = line.strip_prefix("bestmove")?;
    match rest.split_whitespace().next() {
        None | Some("(none)") => Some(None),
        Some(mv) => Some(Some(mv.to_string())),
    }
}
