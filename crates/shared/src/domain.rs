use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for one game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub Uuid);

impl GameId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for GameId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    White,
    Black,
}

/// One entry of the static endgame catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndgamePosition {
    pub name: String,
    pub description: String,
    pub fen: String,
    pub goal: String,
    pub user_plays: Side,
}

/// Mutable per-game record. The move list is the source of truth;
/// `current_fen` caches the result of replaying it from `starting_fen`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub game_id: GameId,
    pub position_type: String,
    pub starting_fen: String,
    pub current_fen: String,
    pub moves: Vec<String>,
    pub user_plays: Side,
    pub created_at: DateTime<Utc>,
    pub touched_at: DateTime<Utc>,
}

/// Engine score for a position, in the shape Stockfish reports it:
/// centipawns or moves-to-mate, from White's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Evaluation {
    Cp(i32),
    Mate(i32),
}
