use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use shared::{
    domain::GameId,
    error::ApiError,
    protocol::{
        ErrorResponse, EvaluateResponse, MoveRequest, MoveResponse, PositionsResponse,
        ResetResponse, StartResponse, UndoResponse,
    },
};

use crate::app_state::AppState;

const MAX_BODY_BYTES: usize = 16 * 1024;

type Rejection = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, Rejection>;

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/positions", get(get_positions))
        .route("/api/start/:position_id", get(start_position))
        .route("/api/move", post(make_move))
        .route("/api/reset/:game_id", get(reset_game))
        .route("/api/evaluate/:game_id", get(evaluate_position))
        .route("/api/undo/:game_id", get(undo_move))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

fn reject(error: ApiError) -> Rejection {
    let status = if error.code.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorResponse::new(error.message)))
}

fn parse_game_id(raw: &str) -> Result<GameId, Rejection> {
    raw.parse().map_err(|_| reject(ApiError::invalid_session()))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_positions(State(state): State<AppState>) -> Json<PositionsResponse> {
    Json(PositionsResponse {
        success: true,
        positions: trainer_api::list_positions(&state.api),
    })
}

async fn start_position(
    State(state): State<AppState>,
    Path(position_id): Path<String>,
) -> ApiResult<StartResponse> {
    let (session, position) =
        trainer_api::start_game(&state.api, &position_id).map_err(reject)?;
    Ok(Json(StartResponse {
        success: true,
        game_id: session.game_id,
        position,
        current_fen: session.current_fen,
    }))
}

async fn make_move(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<MoveResponse> {
    let outcome = trainer_api::apply_user_move(&state.api, req.game_id, &req.uci)
        .await
        .map_err(reject)?;
    Ok(Json(MoveResponse {
        success: true,
        user_move: outcome.user_move,
        computer_move: outcome.computer_move,
        current_fen: outcome.current_fen,
        game_over: outcome.game_over,
        result: outcome.result,
    }))
}

async fn reset_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> ApiResult<ResetResponse> {
    let game_id = parse_game_id(&game_id)?;
    let session = trainer_api::reset_game(&state.api, game_id).map_err(reject)?;
    Ok(Json(ResetResponse {
        success: true,
        current_fen: session.current_fen,
    }))
}

async fn evaluate_position(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> ApiResult<EvaluateResponse> {
    let game_id = parse_game_id(&game_id)?;
    let (evaluation, current_fen) = trainer_api::evaluate_position(&state.api, game_id)
        .await
        .map_err(reject)?;
    Ok(Json(EvaluateResponse {
        success: true,
        evaluation,
        current_fen,
    }))
}

async fn undo_move(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> ApiResult<UndoResponse> {
    let game_id = parse_game_id(&game_id)?;
    let session = trainer_api::undo_last_exchange(&state.api, game_id).map_err(reject)?;
    Ok(Json(UndoResponse {
        success: true,
        current_fen: session.current_fen,
        moves_remaining: session.moves.len(),
    }))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
