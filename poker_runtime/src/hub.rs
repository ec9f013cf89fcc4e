//! Game hub: every live game, keyed by id, each behind its own mutex.
//!
//! Commands for one game are serialized by that game's lock; different
//! games never contend. When a round ends in a discussion, the hub starts
//! a timer that concludes it after `discussion_delay` without blocking the
//! caller. If the timer's conclusion fails (the final export could not be
//! written), the error is kept for the caller, who retries with
//! `conclude_discussion`.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use poker_engine::resolver::RoundOutcome;
use poker_engine::state::{GameState, TurnInfo};

use crate::config::RuntimeConfig;
use crate::error::{ErrorKind, Result, RuntimeError};
use crate::session::{Receipt, Session};

type SharedSession = Arc<Mutex<Session>>;

pub struct GameHub {
    sessions: DashMap<String, SharedSession>,
    timers: Arc<DashMap<String, JoinHandle<()>>>,
    failures: Arc<DashMap<String, String>>,
    discussion_delay: Duration,
}

impl GameHub {
    pub fn new(discussion_delay: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            timers: Arc::new(DashMap::new()),
            failures: Arc::new(DashMap::new()),
            discussion_delay,
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.discussion_delay)
    }

    pub fn discussion_delay(&self) -> Duration {
        self.discussion_delay
    }

    /// Register a session under its game name.
    pub fn insert(&self, session: Session) -> Result<()> {
        let id = session.game_name().to_string();
        match self.sessions.entry(id.clone()) {
            Entry::Occupied(_) => Err(RuntimeError::DuplicateGame(id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(session)));
                info!(game = %id, "game registered");
                Ok(())
            }
        }
    }

    /// Drop a game and any discussion timer it still has running.
    pub fn remove(&self, game_id: &str) -> bool {
        if let Some((_, timer)) = self.timers.remove(game_id) {
            timer.abort();
        }
        self.failures.remove(game_id);
        let removed = self.sessions.remove(game_id).is_some();
        if removed {
            info!(game = game_id, "game removed");
        }
        removed
    }

    /// Registered game ids, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    fn session(&self, game_id: &str) -> Result<SharedSession> {
        self.sessions
            .get(game_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RuntimeError::UnknownGame(game_id.to_string()))
    }

    pub async fn current_turn_info(&self, game_id: &str) -> Result<TurnInfo> {
        let session = self.session(game_id)?;
        let guard = session.lock().await;
        guard.current_turn()
    }

    /// Read-only copy of a game's full state.
    pub async fn view(&self, game_id: &str) -> Result<GameState> {
        let session = self.session(game_id)?;
        let guard = session.lock().await;
        Ok(guard.state().clone())
    }

    pub async fn launch(&self, game_id: &str) -> Result<Receipt> {
        let session = self.session(game_id)?;
        let mut guard = session.lock().await;
        guard.launch()
    }

    pub async fn pause(&self, game_id: &str) -> Result<Receipt> {
        let session = self.session(game_id)?;
        let mut guard = session.lock().await;
        guard.pause()
    }

    pub async fn resume_from_store(&self, game_id: &str) -> Result<Receipt> {
        let session = self.session(game_id)?;
        let mut guard = session.lock().await;
        guard.resume_from_store()
    }

    /// Cast `card` for whoever's turn it is in `game_id`.
    ///
    /// If the vote closes a round into a discussion, the conclusion is
    /// scheduled and this call returns immediately with the announced mean.
    pub async fn cast_vote(&self, game_id: &str, card: &str) -> Result<Receipt> {
        let session = self.session(game_id)?;
        let receipt = {
            let mut guard = session.lock().await;
            guard.cast_vote(card)?
        };
        if let Some(RoundOutcome::AwaitingDiscussion { mean }) = receipt.result.round {
            info!(
                game = game_id,
                feature = receipt.result.feature.as_deref().unwrap_or(""),
                mean,
                delay = ?self.discussion_delay,
                "discussion opened"
            );
            self.schedule_discussion(game_id, session);
        }
        Ok(receipt)
    }

    fn schedule_discussion(&self, game_id: &str, session: SharedSession) {
        let delay = self.discussion_delay;
        let id = game_id.to_string();
        let timers = Arc::clone(&self.timers);
        let failures = Arc::clone(&self.failures);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = {
                let mut guard = session.lock().await;
                guard.conclude_discussion()
            };
            timers.remove(&id);
            match outcome {
                Ok(receipt) => {
                    failures.remove(&id);
                    info!(
                        game = %id,
                        feature = receipt.result.feature.as_deref().unwrap_or(""),
                        status = %receipt.result.status_after,
                        "discussion concluded"
                    );
                }
                Err(err) => {
                    warn!(game = %id, kind = ?err.kind(), error = %err, "discussion could not be concluded");
                    if err.kind() == ErrorKind::Persistence {
                        failures.insert(id, err.to_string());
                    }
                }
            }
        });
        if let Some(previous) = self.timers.insert(game_id.to_string(), handle) {
            debug!(game = game_id, "replacing stale discussion timer");
            previous.abort();
        }
    }

    /// Conclude the open discussion of `game_id` now, cancelling its timer.
    ///
    /// This is the retry path after `discussion_failure` reports an error.
    pub async fn conclude_discussion(&self, game_id: &str) -> Result<Receipt> {
        let session = self.session(game_id)?;
        if let Some((_, timer)) = self.timers.remove(game_id) {
            timer.abort();
        }
        let outcome = {
            let mut guard = session.lock().await;
            guard.conclude_discussion()
        };
        match &outcome {
            Ok(_) => {
                self.failures.remove(game_id);
            }
            Err(err) if err.kind() == ErrorKind::Persistence => {
                self.failures.insert(game_id.to_string(), err.to_string());
            }
            Err(_) => {}
        }
        outcome
    }

    /// Why the last attempt to conclude `game_id`'s discussion failed, if it did.
    pub fn discussion_failure(&self, game_id: &str) -> Option<String> {
        self.failures.get(game_id).map(|entry| entry.value().clone())
    }

    /// True while a discussion timer for `game_id` has not fired yet.
    pub fn has_pending_discussion(&self, game_id: &str) -> bool {
        self.timers
            .get(game_id)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use poker_engine::domain::{FeatureSpec, GameMode, GameStatus};

    fn session(name: &str) -> Session {
        let roster = vec!["alice".to_string(), "bob".to_string()];
        let backlog = vec![FeatureSpec {
            name: "login".to_string(),
            description: String::new(),
        }];
        let store = Arc::new(MemoryStore::new());
        Session::create(name, "alice", &roster, GameMode::Average, backlog, store).unwrap()
    }

    #[tokio::test]
    async fn test_registration_and_lookup() {
        let hub = GameHub::new(Duration::from_secs(1));
        hub.insert(session("b-game")).unwrap();
        hub.insert(session("a-game")).unwrap();

        let err = hub.insert(session("a-game")).unwrap_err();
        assert!(matches!(err, RuntimeError::DuplicateGame(_)));
        assert_eq!(hub.list(), ["a-game", "b-game"]);

        let err = hub.current_turn_info("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert!(hub.remove("b-game"));
        assert!(!hub.remove("b-game"));
        assert_eq!(hub.list(), ["a-game"]);
    }

    #[tokio::test]
    async fn test_votes_follow_turn_order() {
        let hub = GameHub::new(Duration::from_secs(1));
        hub.insert(session("g")).unwrap();
        hub.launch("g").await.unwrap();

        assert_eq!(hub.current_turn_info("g").await.unwrap().current_participant, "alice");
        hub.cast_vote("g", "8").await.unwrap();
        assert_eq!(hub.current_turn_info("g").await.unwrap().current_participant, "bob");

        let receipt = hub.cast_vote("g", "8").await.unwrap();
        assert_eq!(receipt.result.round, Some(RoundOutcome::Validated { difficulty: 8.0 }));
        assert_eq!(hub.view("g").await.unwrap().status(), GameStatus::Finished);
        assert!(!hub.has_pending_discussion("g"));
    }
}
