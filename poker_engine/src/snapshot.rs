/// Planning Poker Kernel: Snapshot and Export Records
///
/// File-facing shapes for the paused-game snapshot and the validated
/// backlog export. Field names are camelCase on disk.

use serde::{Deserialize, Serialize};

use crate::deck::{mean_of, CardValue};
use crate::domain::{GameMode, GameStatus};
use crate::state::GameState;

/// One vote as written to files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEntry {
    pub participant: String,
    pub vote: CardValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSnapshot {
    pub name: String,
    pub description: String,
    pub validated: bool,
    #[serde(default)]
    pub votes: Vec<VoteEntry>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub first_round_finished: bool,
}

/// Paused game, as written on pause and read on resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub game_name: String,
    pub status: GameStatus,
    /// Absent in files written before the mode was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<GameMode>,
    pub features: Vec<FeatureSnapshot>,
    pub participants: Vec<String>,
}

/// One validated feature in the final backlog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogEntry {
    pub name: String,
    pub description: String,
    pub mean_difficulty: f64,
    pub votes: Vec<VoteEntry>,
}

fn vote_entries(state: &GameState, feature: &str) -> Vec<VoteEntry> {
    state
        .ledger
        .votes_for(feature, &state.game.name)
        .into_iter()
        .map(|r| VoteEntry {
            participant: r.participant.clone(),
            vote: r.value,
        })
        .collect()
}

/// Full game state in snapshot form: every feature with its votes,
/// plus the roster in turn order.
pub fn snapshot_of(state: &GameState) -> GameSnapshot {
    GameSnapshot {
        game_name: state.game.name.clone(),
        status: state.game.status,
        mode: Some(state.game.mode),
        features: state
            .registry
            .iter()
            .map(|f| FeatureSnapshot {
                name: f.name.clone(),
                description: f.description.clone(),
                validated: f.validated,
                votes: vote_entries(state, &f.name),
                first_round_finished: state.round_record(&f.name).first_round_finished,
            })
            .collect(),
        participants: state
            .turns
            .roster()
            .iter()
            .map(|p| p.pseudo.clone())
            .collect(),
    }
}

/// Validated features with their vote history, in registry order.
pub fn export_backlog(state: &GameState) -> Vec<BacklogEntry> {
    state
        .registry
        .validated()
        .map(|f| {
            let votes = vote_entries(state, &f.name);
            let mean_difficulty = f
                .difficulty
                .unwrap_or_else(|| mean_of(votes.iter().map(|v| &v.vote)));
            BacklogEntry {
                name: f.name.clone(),
                description: f.description.clone(),
                mean_difficulty,
                votes,
            }
        })
        .collect()
}
