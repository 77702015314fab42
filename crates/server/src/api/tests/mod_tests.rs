use super::*;

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{body, body::Body, http::Request};
use serde_json::{json, Value};
use tower::ServiceExt;

use shared::domain::Evaluation;
use stockfish_integration::{EngineError, SearchEngine};
use storage::{PositionCatalog, SessionStore};
use trainer_api::ApiContext;

const KP_START: &str = "8/8/8/4k3/8/4K3/4P3/8 w - - 0 1";

struct ScriptedEngine {
    replies: Mutex<VecDeque<Option<String>>>,
}

#[async_trait]
impl SearchEngine for ScriptedEngine {
    async fn best_move(&self, _fen: &str) -> Result<Option<String>, EngineError> {
        Ok(self
            .replies
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(None))
    }

    async fn evaluate(&self, _fen: &str) -> Result<Evaluation, EngineError> {
        Ok(Evaluation::Cp(17))
    }
}

fn test_app(replies: &[&str]) -> Router {
    let engine = ScriptedEngine {
        replies: Mutex::new(replies.iter().map(|r| Some(r.to_string())).collect()),
    };
    let api = ApiContext {
        catalog: Arc::new(PositionCatalog::new()),
        sessions: SessionStore::new(chrono::Duration::hours(1)),
        engine: Arc::new(engine),
    };
    build_router(AppState { api })
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

async fn start(app: &Router, position_id: &str) -> (String, String) {
    let (status, body) = get_json(app, &format!("/api/start/{position_id}")).await;
    assert_eq!(status, StatusCode::OK);
    (
        body["game_id"].as_str().expect("game_id").to_string(),
        body["current_fen"].as_str().expect("fen").to_string(),
    )
}

#[tokio::test]
async fn healthz_answers_ok() {
    let app = test_app(&[]);
    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn positions_lists_the_whole_catalog() {
    let app = test_app(&[]);
    let (status, body) = get_json(&app, "/api/positions").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let positions = body["positions"].as_object().expect("positions map");
    assert_eq!(positions.len(), 3);
    assert_eq!(positions["lucena"]["user_plays"], json!("white"));
}

#[tokio::test]
async fn start_returns_the_catalog_fen() {
    let app = test_app(&[]);
    let (_, fen) = start(&app, "king_pawn_vs_king").await;
    assert_eq!(fen, KP_START);
}

#[tokio::test]
async fn start_with_unknown_position_is_a_400() {
    let app = test_app(&[]);
    let (status, body) = get_json(&app, "/api/start/najdorf").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Invalid position type"}));
}

#[tokio::test]
async fn move_plays_both_sides() {
    let app = test_app(&["e5d5"]);
    let (game_id, _) = start(&app, "king_pawn_vs_king").await;

    let (status, body) = post_json(
        &app,
        "/api/move",
        json!({"game_id": game_id, "move": "e3d3"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["user_move"], json!("e3d3"));
    assert_eq!(body["computer_move"], json!("e5d5"));
    assert_eq!(body["game_over"], json!(false));
    assert!(body.get("result").is_none());
    assert_ne!(body["current_fen"], json!(KP_START));
}

#[tokio::test]
async fn illegal_move_is_a_400_and_changes_nothing() {
    let app = test_app(&[]);
    let (game_id, _) = start(&app, "king_pawn_vs_king").await;

    // The double push is blocked by white's own king on e3.
    let (status, body) = post_json(
        &app,
        "/api/move",
        json!({"game_id": game_id, "move": "e2e4"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Illegal move"}));

    let (_, reset) = get_json(&app, &format!("/api/reset/{game_id}")).await;
    assert_eq!(reset["current_fen"], json!(KP_START));
}

#[tokio::test]
async fn move_with_unknown_game_id_is_a_400() {
    let app = test_app(&[]);
    let bogus = shared::domain::GameId::fresh();

    let (status, body) = post_json(
        &app,
        "/api/move",
        json!({"game_id": bogus, "move": "e3d3"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid game session"));
}

#[tokio::test]
async fn malformed_game_id_is_a_400() {
    let app = test_app(&[]);
    let (status, body) = get_json(&app, "/api/reset/not-a-game-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid game session"));
}

#[tokio::test]
async fn undo_without_a_full_exchange_is_a_400() {
    let app = test_app(&[]);
    let (game_id, _) = start(&app, "king_pawn_vs_king").await;

    let (status, body) = get_json(&app, &format!("/api/undo/{game_id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "No moves to undo"}));
}

#[tokio::test]
async fn undo_rewinds_to_the_starting_position() {
    let app = test_app(&["e5d5"]);
    let (game_id, _) = start(&app, "king_pawn_vs_king").await;
    post_json(
        &app,
        "/api/move",
        json!({"game_id": game_id, "move": "e3d3"}),
    )
    .await;

    let (status, body) = get_json(&app, &format!("/api/undo/{game_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_fen"], json!(KP_START));
    assert_eq!(body["moves_remaining"], json!(0));
}

#[tokio::test]
async fn reset_restores_the_starting_fen() {
    let app = test_app(&["f7e6"]);
    let (game_id, start_fen) = start(&app, "lucena").await;
    post_json(
        &app,
        "/api/move",
        json!({"game_id": game_id, "move": "e2f2"}),
    )
    .await;

    let (status, body) = get_json(&app, &format!("/api/reset/{game_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_fen"].as_str(), Some(start_fen.as_str()));
}

#[tokio::test]
async fn evaluate_reports_the_engine_score() {
    let app = test_app(&[]);
    let (game_id, fen) = start(&app, "philidor").await;

    let (status, body) = get_json(&app, &format!("/api/evaluate/{game_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evaluation"], json!({"type": "cp", "value": 17}));
    assert_eq!(body["current_fen"].as_str(), Some(fen.as_str()));
}
