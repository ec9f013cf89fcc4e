/// Planning Poker Kernel: Game Aggregate
///
/// A `GameState` owns everything about one game: identity, backlog,
/// ledger, turn order and per-feature round records.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{
    Discussion, Feature, FeatureSpec, Game, GameMode, GameStatus, Participant, RoundRecord,
};
use crate::error::GameError;
use crate::ledger::VoteLedger;
use crate::registry::FeatureRegistry;
use crate::turns::TurnSequencer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub game: Game,
    pub registry: FeatureRegistry,
    pub ledger: VoteLedger,
    pub turns: TurnSequencer,
    pub rounds: BTreeMap<String, RoundRecord>,
    pub discussion: Option<Discussion>,
}

/// What the presentation layer needs to render the voting screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnInfo {
    pub game_name: String,
    pub status: GameStatus,
    pub current_participant: String,
    pub current_feature: Option<FeatureSpec>,
    pub turn_index: usize,
    pub discussion_mean: Option<f64>,
}

/// Create a fresh game in status `new`, without any backlog.
///
/// The admin is seated last if the roster does not already list them.
pub fn create_initial_state(
    name: &str,
    admin: &str,
    participants: &[String],
    mode: GameMode,
) -> Result<GameState, GameError> {
    if name.trim().is_empty() {
        return Err(GameError::validation("game name must not be empty"));
    }
    if admin.trim().is_empty() {
        return Err(GameError::validation("admin pseudo must not be empty"));
    }

    let mut seen = BTreeSet::new();
    let mut roster = Vec::with_capacity(participants.len() + 1);
    for pseudo in participants {
        if pseudo.trim().is_empty() {
            return Err(GameError::validation("participant pseudo must not be empty"));
        }
        if !seen.insert(pseudo.as_str()) {
            return Err(GameError::validation(format!(
                "participant {pseudo:?} is listed twice"
            )));
        }
        roster.push(if pseudo == admin {
            Participant::admin(pseudo.as_str())
        } else {
            Participant::new(pseudo.as_str())
        });
    }
    if !seen.contains(admin) {
        roster.push(Participant::admin(admin));
    }

    Ok(GameState {
        game: Game {
            name: name.to_string(),
            admin: admin.to_string(),
            mode,
            status: GameStatus::New,
        },
        registry: FeatureRegistry::new(),
        ledger: VoteLedger::new(),
        turns: TurnSequencer::new(roster),
        rounds: BTreeMap::new(),
        discussion: None,
    })
}

impl GameState {
    pub fn status(&self) -> GameStatus {
        self.game.status
    }

    /// The feature under estimation, if any.
    pub fn current_feature(&self) -> Option<&Feature> {
        self.registry.next_pending()
    }

    pub fn round_record(&self, feature: &str) -> RoundRecord {
        self.rounds.get(feature).copied().unwrap_or_default()
    }

    pub fn turn_info(&self) -> Result<TurnInfo, GameError> {
        let participant = self.turns.current_participant()?;
        Ok(TurnInfo {
            game_name: self.game.name.clone(),
            status: self.game.status,
            current_participant: participant.pseudo.clone(),
            current_feature: self.current_feature().map(|f| FeatureSpec {
                name: f.name.clone(),
                description: f.description.clone(),
            }),
            turn_index: self.turns.index(),
            discussion_mean: self.discussion.as_ref().map(|d| d.mean),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_admin_is_seated_last_when_missing() {
        let state =
            create_initial_state("retro", "alice", &names(&["bob", "carol"]), GameMode::Strict)
                .unwrap();
        let roster: Vec<_> = state.turns.roster().iter().map(|p| p.pseudo.as_str()).collect();
        assert_eq!(roster, ["bob", "carol", "alice"]);
        assert!(state.turns.roster()[2].is_admin);
        assert_eq!(state.status(), GameStatus::New);
    }

    #[test]
    fn test_admin_keeps_listed_position() {
        let state =
            create_initial_state("retro", "bob", &names(&["alice", "bob"]), GameMode::Average)
                .unwrap();
        assert_eq!(state.turns.len(), 2);
        assert!(state.turns.roster()[1].is_admin);
        assert!(!state.turns.roster()[0].is_admin);
    }

    #[test]
    fn test_rejects_duplicate_and_blank_pseudos() {
        assert!(create_initial_state("g", "a", &names(&["b", "b"]), GameMode::Strict).is_err());
        assert!(create_initial_state("g", "a", &names(&[" "]), GameMode::Strict).is_err());
        assert!(create_initial_state("", "a", &[], GameMode::Strict).is_err());
    }

    #[test]
    fn test_turn_info_without_backlog() {
        let state = create_initial_state("g", "a", &[], GameMode::Strict).unwrap();
        let info = state.turn_info().unwrap();
        assert_eq!(info.current_participant, "a");
        assert!(info.current_feature.is_none());
    }
}
