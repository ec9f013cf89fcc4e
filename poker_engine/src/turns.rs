/// Planning Poker Kernel: Turn Sequencer
///
/// Roster order is fixed when the game is created; participants added on
/// resume are appended. The index always satisfies `index < roster.len()`.

use serde::{Deserialize, Serialize};

use crate::domain::Participant;
use crate::error::GameError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSequencer {
    roster: Vec<Participant>,
    index: usize,
}

impl TurnSequencer {
    pub fn new(roster: Vec<Participant>) -> Self {
        Self { roster, index: 0 }
    }

    pub fn current_participant(&self) -> Result<&Participant, GameError> {
        if self.roster.is_empty() {
            return Err(GameError::precondition("roster is empty"));
        }
        Ok(&self.roster[self.index % self.roster.len()])
    }

    /// Move to the next participant. Returns true when the round just
    /// completed, i.e. the index wrapped back to 0.
    pub fn advance(&mut self) -> Result<bool, GameError> {
        if self.roster.is_empty() {
            return Err(GameError::precondition("cannot advance an empty roster"));
        }
        self.index = (self.index + 1) % self.roster.len();
        Ok(self.index == 0)
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn contains(&self, pseudo: &str) -> bool {
        self.roster.iter().any(|p| p.pseudo == pseudo)
    }

    /// Append a participant at the end of the turn order. Returns false
    /// if the pseudo is already seated.
    pub fn add(&mut self, participant: Participant) -> bool {
        if self.contains(&participant.pseudo) {
            return false;
        }
        self.roster.push(participant);
        true
    }
}
