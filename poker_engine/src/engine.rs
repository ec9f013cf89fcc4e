/// Planning Poker Kernel: Engine
///
/// Stateful wrapper around the pure transition layer. Callers that need
/// persist-before-commit use `preview` + `commit`; everyone else uses
/// `apply`.

use crate::deck::CardValue;
use crate::domain::{FeatureSpec, GameMode};
use crate::error::GameError;
use crate::state::{create_initial_state, GameState, TurnInfo};
use crate::transitions::{apply_command, Command, TransitionResult};

pub struct PokerEngine {
    state: GameState,
}

impl PokerEngine {
    pub fn new(state: GameState) -> Self {
        Self { state }
    }

    /// Create a game in status `new` with the given backlog.
    pub fn create(
        name: &str,
        admin: &str,
        participants: &[String],
        mode: GameMode,
        backlog: Vec<FeatureSpec>,
    ) -> Result<Self, GameError> {
        let mut engine = Self::new(create_initial_state(name, admin, participants, mode)?);
        engine.apply(&Command::ImportFeatures(backlog))?;
        Ok(engine)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn game_name(&self) -> &str {
        &self.state.game.name
    }

    /// Compute the outcome of `command` without committing it.
    pub fn preview(&self, command: &Command) -> Result<(GameState, TransitionResult), GameError> {
        apply_command(&self.state, command)
    }

    /// Replace the current state with one produced by `preview`.
    pub fn commit(&mut self, next: GameState) {
        self.state = next;
    }

    /// Apply and commit in one step.
    pub fn apply(&mut self, command: &Command) -> Result<TransitionResult, GameError> {
        let (next, result) = self.preview(command)?;
        self.state = next;
        Ok(result)
    }

    /// Apply an ordered sequence of commands, stopping at the first error.
    pub fn apply_sequence(&mut self, commands: &[Command]) -> Result<&GameState, GameError> {
        for command in commands {
            self.apply(command)?;
        }
        Ok(&self.state)
    }

    /// Parse a raw card and cast it for the participant whose turn it is.
    pub fn cast_card(&mut self, raw: &str) -> Result<TransitionResult, GameError> {
        let value = CardValue::parse(raw)?;
        self.apply(&Command::CastVote(value))
    }

    pub fn turn_info(&self) -> Result<TurnInfo, GameError> {
        self.state.turn_info()
    }
}
