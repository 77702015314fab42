//! Rules verdicts over FEN strings, backed by shakmaty. Everything here is
//! pure: FEN in, verdict out, no engine involved.

use shakmaty::{
    fen::Fen, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, Outcome, Position,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("invalid UCI move '{uci}': {reason}")]
    InvalidUci { uci: String, reason: String },
    #[error("illegal move '{uci}' in '{fen}'")]
    IllegalMove { uci: String, fen: String },
}

fn parse_position(fen: &str) -> Result<Chess, RulesError> {
    let parsed: Fen = fen.parse().map_err(|e| RulesError::InvalidFen {
        fen: fen.to_string(),
        reason: format!("{e}"),
    })?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| RulesError::InvalidFen {
            fen: fen.to_string(),
            reason: e.to_string(),
        })
}

fn write_fen(pos: Chess) -> String {
    Fen(pos.into_setup(EnPassantMode::Legal)).to_string()
}

/// Whether `uci` is in the legal-move set of `fen`. Unparsable FENs or
/// moves count as illegal rather than erroring, matching the lenient
/// contract of the legality probe.
pub fn is_move_legal(fen: &str, uci: &str) -> bool {
    let Ok(pos) = parse_position(fen) else {
        return false;
    };
    let Ok(parsed) = uci.parse::<UciMove>() else {
        return false;
    };
    parsed.to_move(&pos).is_ok()
}

/// Applies `uci` to `fen` and returns the resulting FEN.
pub fn apply_move(fen: &str, uci: &str) -> Result<String, RulesError> {
    let pos = parse_position(fen)?;
    let parsed = uci
        .parse::<UciMove>()
        .map_err(|e| RulesError::InvalidUci {
            uci: uci.to_string(),
            reason: e.to_string(),
        })?;
    let mv = parsed.to_move(&pos).map_err(|_| RulesError::IllegalMove {
        uci: uci.to_string(),
        fen: fen.to_string(),
    })?;
    let next = pos.play(&mv).map_err(|_| RulesError::IllegalMove {
        uci: uci.to_string(),
        fen: fen.to_string(),
    })?;
    Ok(write_fen(next))
}

/// Checkmate, stalemate, or any other rules-mandated end of game.
pub fn is_game_over(fen: &str) -> Result<bool, RulesError> {
    Ok(parse_position(fen)?.is_game_over())
}

/// Result text for a finished game, `None` while play continues.
pub fn game_result(fen: &str) -> Result<Option<String>, RulesError> {
    let pos = parse_position(fen)?;
    Ok(pos.outcome().map(|outcome| match outcome {
        Outcome::Decisive {
            winner: Color::White,
        } => "White wins".to_string(),
        Outcome::Decisive {
            winner: Color::Black,
        } => "Black wins".to_string(),
        Outcome::Draw => "Draw".to_string(),
    }))
}

/// All legal moves of `fen` in UCI notation.
pub fn legal_moves(fen: &str) -> Result<Vec<String>, RulesError> {
    let pos = parse_position(fen)?;
    Ok(pos
        .legal_moves()
        .iter()
        .map(|mv| mv.to_uci(CastlingMode::Standard).to_string())
        .collect())
}
