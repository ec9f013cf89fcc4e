//! Session: one game, its engine, and the store its effects go to.
//!
//! Persist-before-commit order for every command:
//!   1. engine.preview(command)  rejected commands stop here, nothing changes
//!   2. store write of the effect (snapshot or backlog), if any
//!   3. engine.commit(next)      only if step 2 succeeded
//!
//! A failed write therefore leaves the game exactly as it was before the
//! command, and the caller gets a persistence error.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use poker_engine::deck::CardValue;
use poker_engine::domain::{FeatureSpec, GameMode};
use poker_engine::engine::PokerEngine;
use poker_engine::error::GameError;
use poker_engine::hashing::canonical_hash;
use poker_engine::snapshot::GameSnapshot;
use poker_engine::state::{GameState, TurnInfo};
use poker_engine::transitions::{Command, Effect, TransitionResult};

use crate::error::Result;
use crate::store::GameStore;

/// What a committed command did, and where its effect was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub result: TransitionResult,
    pub written: Option<PathBuf>,
}

pub struct Session {
    engine: PokerEngine,
    store: Arc<dyn GameStore>,
}

impl Session {
    pub fn new(engine: PokerEngine, store: Arc<dyn GameStore>) -> Self {
        Self { engine, store }
    }

    /// Create a game in status `new` loaded with `backlog`.
    pub fn create(
        name: &str,
        admin: &str,
        participants: &[String],
        mode: GameMode,
        backlog: Vec<FeatureSpec>,
        store: Arc<dyn GameStore>,
    ) -> Result<Self> {
        let engine = PokerEngine::create(name, admin, participants, mode, backlog)?;
        info!(
            game = name,
            admin,
            mode = %mode,
            features = engine.state().registry.len(),
            "game created"
        );
        Ok(Self::new(engine, store))
    }

    pub fn game_name(&self) -> &str {
        self.engine.game_name()
    }

    pub fn state(&self) -> &GameState {
        self.engine.state()
    }

    pub fn state_hash(&self) -> String {
        canonical_hash(self.engine.state())
    }

    pub fn current_turn(&self) -> Result<TurnInfo> {
        Ok(self.engine.turn_info()?)
    }

    /// Run one command through preview, effect write, commit.
    pub fn execute(&mut self, command: &Command) -> Result<Receipt> {
        let game = self.engine.game_name().to_string();
        let (next, result) = match self.engine.preview(command) {
            Ok(preview) => preview,
            Err(err) => {
                warn!(game = %game, command = command.name(), error = %err, "command rejected");
                return Err(err.into());
            }
        };

        let written = match &result.effect {
            Some(Effect::PersistSnapshot(snapshot)) => Some(self.write(&game, || {
                self.store.save_snapshot(snapshot)
            })?),
            Some(Effect::ExportBacklog(entries)) => Some(self.write(&game, || {
                self.store.save_backlog(&game, entries)
            })?),
            None => None,
        };

        self.engine.commit(next);
        info!(
            game = %game,
            command = result.command,
            status_before = %result.status_before,
            status_after = %result.status_after,
            participant = result.voter.as_deref().unwrap_or(""),
            feature = result.feature.as_deref().unwrap_or(""),
            outcome = result.round.as_ref().map(|r| r.label()).unwrap_or(""),
            "transition committed"
        );
        Ok(Receipt { result, written })
    }

    fn write<F>(&self, game: &str, save: F) -> Result<PathBuf>
    where
        F: FnOnce() -> Result<PathBuf>,
    {
        match save() {
            Ok(path) => {
                info!(game, path = %path.display(), "effect persisted");
                Ok(path)
            }
            Err(err) => {
                warn!(game, error = %err, "effect write failed, transition dropped");
                Err(err)
            }
        }
    }

    pub fn launch(&mut self) -> Result<Receipt> {
        self.execute(&Command::Launch)
    }

    /// Cast a raw card for the participant whose turn it is.
    pub fn cast_vote(&mut self, raw: &str) -> Result<Receipt> {
        let value = CardValue::parse(raw)?;
        self.execute(&Command::CastVote(value))
    }

    pub fn conclude_discussion(&mut self) -> Result<Receipt> {
        self.execute(&Command::ConcludeDiscussion)
    }

    pub fn pause(&mut self) -> Result<Receipt> {
        self.execute(&Command::Pause)
    }

    pub fn resume(&mut self, snapshot: GameSnapshot) -> Result<Receipt> {
        self.execute(&Command::Resume(snapshot))
    }

    /// Resume from the last snapshot the store holds for this game.
    pub fn resume_from_store(&mut self) -> Result<Receipt> {
        let snapshot = self.store.load_snapshot(self.engine.game_name())?.ok_or_else(|| {
            GameError::precondition(format!(
                "saved state not found for game {:?}",
                self.engine.game_name()
            ))
        })?;
        self.resume(snapshot)
    }
}
