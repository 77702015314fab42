use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::debug;

use shared::domain::{EndgamePosition, GameId, GameSession};

mod catalog;

pub use catalog::PositionCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session not found or expired")]
pub struct SessionExpired;

/// In-memory session table. Entries expire after sitting idle for the
/// configured TTL; expiry is enforced on access and by `evict_expired`.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<GameId, GameSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Allocates a fresh session for `position` with an empty move list.
    pub fn create(&self, position_type: &str, position: &EndgamePosition) -> GameSession {
        let now = Utc::now();
        let session = GameSession {
            game_id: GameId::fresh(),
            position_type: position_type.to_string(),
            starting_fen: position.fen.clone(),
            current_fen: position.fen.clone(),
            moves: Vec::new(),
            user_plays: position.user_plays,
            created_at: now,
            touched_at: now,
        };
        let mut table = self.inner.lock().expect("session table poisoned");
        table.insert(session.game_id, session.clone());
        session
    }

    /// Returns a snapshot of the session, refreshing its idle timer.
    /// An expired session behaves as absent and is dropped from the table.
    pub fn get(&self, game_id: GameId) -> Option<GameSession> {
        let now = Utc::now();
        let mut table = self.inner.lock().expect("session table poisoned");
        match table.get_mut(&game_id) {
            Some(session) if now - session.touched_at <= self.ttl => {
                session.touched_at = now;
                Some(session.clone())
            }
            Some(_) => {
                table.remove(&game_id);
                None
            }
            None => None,
        }
    }

    /// Applies `mutate` to the stored session and returns the updated
    /// snapshot. Last writer wins; there is no per-session locking beyond
    /// the table mutex held for the duration of the mutation.
    pub fn update<F>(&self, game_id: GameId, mutate: F) -> Result<GameSession, SessionExpired>
    where
        F: FnOnce(&mut GameSession),
    {
        let now = Utc::now();
        let mut table = self.inner.lock().expect("session table poisoned");
        match table.get_mut(&game_id) {
            Some(session) if now - session.touched_at <= self.ttl => {
                mutate(session);
                session.touched_at = now;
                Ok(session.clone())
            }
            Some(_) => {
                table.remove(&game_id);
                Err(SessionExpired)
            }
            None => Err(SessionExpired),
        }
    }

    /// Drops every session idle longer than the TTL. Returns the number of
    /// sessions removed.
    pub fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let mut table = self.inner.lock().expect("session table poisoned");
        let before = table.len();
        table.retain(|_, session| now - session.touched_at <= self.ttl);
        let evicted = before - table.len();
        if evicted > 0 {
            debug!(evicted, remaining = table.len(), "evicted idle sessions");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("session table poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
