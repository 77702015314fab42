//! Move orchestration: threads a session's board state through the rules
//! library and the search engine. All the chess itself is delegated; this
//! crate only does the bookkeeping around it.

use std::{collections::BTreeMap, sync::Arc};

use tracing::{info, warn};

use shared::{
    domain::{EndgamePosition, Evaluation, GameId, GameSession},
    error::{ApiError, ErrorCode},
};
use stockfish_integration::{rules, EngineError, SearchEngine};
use storage::{PositionCatalog, SessionStore};

#[derive(Clone)]
pub struct ApiContext {
    pub catalog: Arc<PositionCatalog>,
    pub sessions: SessionStore,
    pub engine: Arc<dyn SearchEngine>,
}

/// Outcome of one user move, including the engine's reply when one was
/// played. Transient; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub user_move: String,
    pub computer_move: Option<String>,
    pub current_fen: String,
    pub game_over: bool,
    pub result: Option<String>,
}

pub fn list_positions(ctx: &ApiContext) -> BTreeMap<String, EndgamePosition> {
    ctx.catalog.all().clone()
}

pub fn start_game(
    ctx: &ApiContext,
    position_id: &str,
) -> Result<(GameSession, EndgamePosition), ApiError> {
    let position = ctx
        .catalog
        .lookup(position_id)
        .ok_or_else(ApiError::invalid_position)?;
    let session = ctx.sessions.create(position_id, position);
    info!(game_id = %session.game_id, position_id, "started endgame session");
    Ok((session, position.clone()))
}

/// Applies the user's move, then (unless the game just ended) asks the
/// engine for a reply and applies that too. An engine that offers no best
/// move on a live position simply passes the turn.
pub async fn apply_user_move(
    ctx: &ApiContext,
    game_id: GameId,
    uci: &str,
) -> Result<MoveOutcome, ApiError> {
    let session = ctx
        .sessions
        .get(game_id)
        .ok_or_else(ApiError::invalid_session)?;

    if !rules::is_move_legal(&session.current_fen, uci) {
        return Err(ApiError::illegal_move());
    }
    // Should not fail after the legality check; kept as a distinct error
    // so a rules/application disagreement is visible to the caller.
    let after_user =
        rules::apply_move(&session.current_fen, uci).map_err(|_| ApiError::move_application())?;

    commit(ctx, game_id, uci, &after_user)?;

    if rules::is_game_over(&after_user).map_err(internal)? {
        let result = rules::game_result(&after_user).map_err(internal)?;
        info!(%game_id, user_move = uci, result = result.as_deref().unwrap_or("?"), "game over");
        return Ok(MoveOutcome {
            user_move: uci.to_string(),
            computer_move: None,
            current_fen: after_user,
            game_over: true,
            result,
        });
    }

    let Some(reply) = ctx
        .engine
        .best_move(&after_user)
        .await
        .map_err(engine_unavailable)?
    else {
        // No motivated move on a live position; the turn passes back.
        warn!(%game_id, fen = %after_user, "engine offered no reply");
        return Ok(MoveOutcome {
            user_move: uci.to_string(),
            computer_move: None,
            current_fen: after_user,
            game_over: false,
            result: None,
        });
    };

    let after_reply = match rules::apply_move(&after_user, &reply) {
        Ok(fen) => fen,
        Err(error) => {
            warn!(%game_id, reply, %error, "engine reply not applicable; keeping user move only");
            return Ok(MoveOutcome {
                user_move: uci.to_string(),
                computer_move: None,
                current_fen: after_user,
                game_over: false,
                result: None,
            });
        }
    };

    commit(ctx, game_id, &reply, &after_reply)?;

    let game_over = rules::is_game_over(&after_reply).map_err(internal)?;
    let result = if game_over {
        rules::game_result(&after_reply).map_err(internal)?
    } else {
        None
    };

    Ok(MoveOutcome {
        user_move: uci.to_string(),
        computer_move: Some(reply),
        current_fen: after_reply,
        game_over,
        result,
    })
}

/// Removes the last user/engine ply pair and rebuilds `current_fen` by
/// replaying the shortened move list from the start. A replay failure
/// resets the session outright rather than leaving it half-rebuilt.
pub fn undo_last_exchange(ctx: &ApiContext, game_id: GameId) -> Result<GameSession, ApiError> {
    let session = ctx
        .sessions
        .get(game_id)
        .ok_or_else(ApiError::invalid_session)?;

    if session.moves.len() < 2 {
        return Err(ApiError::nothing_to_undo());
    }

    let shortened = session.moves[..session.moves.len() - 2].to_vec();
    let (fen, moves) = match replay(&session.starting_fen, &shortened) {
        Ok(fen) => (fen, shortened),
        Err(error) => {
            warn!(%game_id, %error, "replay failed during undo; resetting session");
            (session.starting_fen.clone(), Vec::new())
        }
    };

    ctx.sessions
        .update(game_id, |s| {
            s.moves = moves.clone();
            s.current_fen = fen.clone();
        })
        .map_err(|_| ApiError::invalid_session())
}

pub fn reset_game(ctx: &ApiContext, game_id: GameId) -> Result<GameSession, ApiError> {
    ctx.sessions
        .update(game_id, |s| {
            s.moves.clear();
            s.current_fen = s.starting_fen.clone();
        })
        .map_err(|_| ApiError::invalid_session())
}

pub async fn evaluate_position(
    ctx: &ApiContext,
    game_id: GameId,
) -> Result<(Evaluation, String), ApiError> {
    let session = ctx
        .sessions
        .get(game_id)
        .ok_or_else(ApiError::invalid_session)?;
    let evaluation = ctx
        .engine
        .evaluate(&session.current_fen)
        .await
        .map_err(engine_unavailable)?;
    Ok((evaluation, session.current_fen))
}

fn commit(ctx: &ApiContext, game_id: GameId, uci: &str, fen: &str) -> Result<(), ApiError> {
    ctx.sessions
        .update(game_id, |s| {
            s.moves.push(uci.to_string());
            s.current_fen = fen.to_string();
        })
        .map(|_| ())
        .map_err(|_| ApiError::invalid_session())
}

fn replay(starting_fen: &str, moves: &[String]) -> Result<String, rules::RulesError> {
    let mut fen = starting_fen.to_string();
    for mv in moves {
        fen = rules::apply_move(&fen, mv)?;
    }
    Ok(fen)
}

fn internal(error: rules::RulesError) -> ApiError {
    ApiError::new(ErrorCode::Internal, error.to_string())
}

fn engine_unavailable(error: EngineError) -> ApiError {
    ApiError::new(
        ErrorCode::EngineUnavailable,
        format!("engine unavailable: {error}"),
    )
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
