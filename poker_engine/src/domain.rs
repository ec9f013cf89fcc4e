/// Planning Poker Kernel: Core Domain Types
///
/// Pure data. Behaviour lives in the registry, ledger, sequencer and
/// transition modules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deck::CardValue;

// ── Core Domain Types ──────────────────────────────────────────────

/// A player, identified by a unique display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub pseudo: String,
    pub is_admin: bool,
}

impl Participant {
    pub fn new(pseudo: impl Into<String>) -> Self {
        Self {
            pseudo: pseudo.into(),
            is_admin: false,
        }
    }

    pub fn admin(pseudo: impl Into<String>) -> Self {
        Self {
            pseudo: pseudo.into(),
            is_admin: true,
        }
    }
}

/// One backlog item under estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub description: String,
    pub validated: bool,
    pub difficulty: Option<f64>, // mean of the validating round
}

/// Import record for a backlog item, as found in the backlog JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureSpec {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Unanimity on every round, indefinitely.
    #[default]
    Strict,
    /// Unanimity on the first round of a feature, mean on the next.
    #[serde(alias = "moyenne")]
    Average,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Strict => "strict",
            GameMode::Average => "average",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GameMode {
    type Err = crate::error::GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(GameMode::Strict),
            "average" | "moyenne" => Ok(GameMode::Average),
            other => Err(crate::error::GameError::validation(format!(
                "unknown game mode {other:?}"
            ))),
        }
    }
}

/// Game lifecycle: new → waiting → finished, waiting ⇄ paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    New,
    #[serde(alias = "en_attente")]
    Waiting,
    Paused,
    #[serde(alias = "fin")]
    Finished,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::New => "new",
            GameStatus::Waiting => "waiting",
            GameStatus::Paused => "paused",
            GameStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and configuration of one estimation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub name: String,
    pub admin: String,
    pub mode: GameMode,
    pub status: GameStatus,
}

/// One cast vote. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub participant: String,
    pub feature: String,
    pub game: String,
    pub value: CardValue,
    pub mode: GameMode,
    pub feature_validated: bool, // feature flag when the vote was cast
}

/// Per-(game, feature) round bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundRecord {
    pub first_round_finished: bool,
    pub completed_rounds: u32,
}

/// Mean announced for an averaged round, awaiting the discussion delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub feature: String,
    pub mean: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accepts_legacy_literals() {
        let s: GameStatus = serde_json::from_str(r#""en_attente""#).unwrap();
        assert_eq!(s, GameStatus::Waiting);
        let s: GameStatus = serde_json::from_str(r#""fin""#).unwrap();
        assert_eq!(s, GameStatus::Finished);
        assert_eq!(serde_json::to_string(&GameStatus::Paused).unwrap(), r#""paused""#);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Moyenne".parse::<GameMode>().unwrap(), GameMode::Average);
        assert_eq!("strict".parse::<GameMode>().unwrap(), GameMode::Strict);
        assert!("median".parse::<GameMode>().is_err());
    }
}
