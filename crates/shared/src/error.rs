use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidPosition,
    InvalidSession,
    IllegalMove,
    MoveApplication,
    NothingToUndo,
    EngineUnavailable,
    Internal,
}

impl ErrorCode {
    /// Whether the failure was caused by the caller (HTTP 400) or is
    /// internal to the service (HTTP 500).
    pub fn is_client_error(self) -> bool {
        !matches!(self, ErrorCode::EngineUnavailable | ErrorCode::Internal)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_position() -> Self {
        Self::new(ErrorCode::InvalidPosition, "Invalid position type")
    }

    pub fn invalid_session() -> Self {
        Self::new(ErrorCode::InvalidSession, "Invalid game session")
    }

    pub fn illegal_move() -> Self {
        Self::new(ErrorCode::IllegalMove, "Illegal move")
    }

    pub fn move_application() -> Self {
        Self::new(ErrorCode::MoveApplication, "Failed to make move")
    }

    pub fn nothing_to_undo() -> Self {
        Self::new(ErrorCode::NothingToUndo, "No moves to undo")
    }
}
