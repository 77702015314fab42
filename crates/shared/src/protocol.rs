use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{EndgamePosition, Evaluation, GameId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsResponse {
    pub success: bool,
    pub positions: BTreeMap<String, EndgamePosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    pub success: bool,
    pub game_id: GameId,
    pub position: EndgamePosition,
    pub current_fen: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    pub game_id: GameId,
    #[serde(rename = "move")]
    pub uci: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResponse {
    pub success: bool,
    pub user_move: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computer_move: Option<String>,
    pub current_fen: String,
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: bool,
    pub current_fen: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub success: bool,
    pub evaluation: Evaluation,
    pub current_fen: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoResponse {
    pub success: bool,
    pub current_fen: String,
    pub moves_remaining: usize,
}

/// Failure envelope shared by every route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_request_uses_move_key() {
        let req: MoveRequest =
            serde_json::from_str(&format!(
                "{{\"game_id\":\"{}\",\"move\":\"e2e4\"}}",
                GameId::fresh()
            ))
            .expect("deserialize");
        assert_eq!(req.uci, "e2e4");
    }

    #[test]
    fn move_response_omits_absent_fields() {
        let resp = MoveResponse {
            success: true,
            user_move: "e2e4".into(),
            computer_move: None,
            current_fen: "8/8/8/4k3/4P3/8/8/4K3 b - - 0 1".into(),
            game_over: false,
            result: None,
        };
        let json = serde_json::to_value(&resp).expect("serialize");
        assert!(json.get("computer_move").is_none());
        assert!(json.get("result").is_none());
    }
}
