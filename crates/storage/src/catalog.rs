use std::collections::BTreeMap;

use shared::domain::{EndgamePosition, Side};

/// Static table of named endgame positions. Built once at startup and
/// never mutated.
pub struct PositionCatalog {
    positions: BTreeMap<String, EndgamePosition>,
}

impl PositionCatalog {
    pub fn new() -> Self {
        let mut positions = BTreeMap::new();
        positions.insert(
            "lucena".to_string(),
            EndgamePosition {
                name: "Lucena Position".to_string(),
                description: "Rook + Pawn vs Rook - winning technique with bridge building"
                    .to_string(),
                fen: "3K4/3P1k2/8/8/8/8/4R3/2r5 w - - 0 1".to_string(),
                goal: "Win by promoting the pawn using the bridge technique".to_string(),
                user_plays: Side::White,
            },
        );
        positions.insert(
            "philidor".to_string(),
            EndgamePosition {
                name: "Philidor Position".to_string(),
                description: "Rook + Pawn vs Rook - drawing technique with passive defense"
                    .to_string(),
                fen: "8/8/8/8/4pk2/R7/7r/4K3 w - - 0 1".to_string(),
                goal: "Draw by maintaining passive rook defense on the back rank".to_string(),
                user_plays: Side::White,
            },
        );
        positions.insert(
            "king_pawn_vs_king".to_string(),
            EndgamePosition {
                name: "King + Pawn vs King".to_string(),
                description: "Opposition and breakthrough technique".to_string(),
                fen: "8/8/8/4k3/8/4K3/4P3/8 w - - 0 1".to_string(),
                goal: "Win by using opposition to advance the pawn to promotion".to_string(),
                user_plays: Side::White,
            },
        );
        Self { positions }
    }

    pub fn lookup(&self, id: &str) -> Option<&EndgamePosition> {
        self.positions.get(id)
    }

    pub fn all(&self) -> &BTreeMap<String, EndgamePosition> {
        &self.positions
    }
}

impl Default for PositionCatalog {
    fn default() -> Self {
        Self::new()
    }
}
