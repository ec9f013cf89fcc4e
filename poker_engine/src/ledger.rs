/// Planning Poker Kernel: Vote Ledger
///
/// Append-only record of cast votes, keyed by (participant, feature, game).
/// Records are never edited; the only removal is a bulk clear of one
/// (feature, game) pair when a round is thrown away.

use serde::{Deserialize, Serialize};

use crate::deck::CardValue;
use crate::domain::{Feature, Game, VoteRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteLedger {
    records: Vec<VoteRecord>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote. Abstentions are skipped and return `None`.
    ///
    /// The record copies the feature's validated flag and the game mode
    /// as they are right now.
    pub fn cast_vote(
        &mut self,
        participant: &str,
        feature: &Feature,
        game: &Game,
        value: CardValue,
    ) -> Option<&VoteRecord> {
        if value == CardValue::Abstain {
            return None;
        }
        self.records.push(VoteRecord {
            participant: participant.to_string(),
            feature: feature.name.clone(),
            game: game.name.clone(),
            value,
            mode: game.mode,
            feature_validated: feature.validated,
        });
        self.records.last()
    }

    /// All votes for the pair, in insertion order.
    pub fn votes_for(&self, feature: &str, game: &str) -> Vec<&VoteRecord> {
        self.records
            .iter()
            .filter(|r| r.feature == feature && r.game == game)
            .collect()
    }

    /// Delete every vote for the pair. Returns how many were removed.
    pub fn clear(&mut self, feature: &str, game: &str) -> usize {
        let before = self.records.len();
        self.records
            .retain(|r| !(r.feature == feature && r.game == game));
        before - self.records.len()
    }

    /// True if an identical vote is already recorded (resume idempotency).
    pub fn contains(&self, participant: &str, feature: &str, game: &str, value: CardValue) -> bool {
        self.records.iter().any(|r| {
            r.participant == participant
                && r.feature == feature
                && r.game == game
                && r.value == value
        })
    }

    pub fn records(&self) -> &[VoteRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GameMode, GameStatus};

    fn game() -> Game {
        Game {
            name: "sprint-12".to_string(),
            admin: "alice".to_string(),
            mode: GameMode::Strict,
            status: GameStatus::Waiting,
        }
    }

    fn feature(name: &str) -> Feature {
        Feature {
            name: name.to_string(),
            description: String::new(),
            validated: false,
            difficulty: None,
        }
    }

    #[test]
    fn test_abstain_is_not_recorded() {
        let mut ledger = VoteLedger::new();
        assert!(ledger
            .cast_vote("alice", &feature("login"), &game(), CardValue::Abstain)
            .is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_pause_is_recorded_with_snapshot_fields() {
        let mut ledger = VoteLedger::new();
        let mut f = feature("login");
        f.validated = true;
        let rec = ledger
            .cast_vote("bob", &f, &game(), CardValue::Pause)
            .cloned()
            .unwrap();
        assert_eq!(rec.value, CardValue::Pause);
        assert!(rec.feature_validated);
        assert_eq!(rec.mode, GameMode::Strict);
    }

    #[test]
    fn test_clear_only_touches_one_pair() {
        let mut ledger = VoteLedger::new();
        let g = game();
        ledger.cast_vote("alice", &feature("login"), &g, CardValue::Estimate(5));
        ledger.cast_vote("bob", &feature("login"), &g, CardValue::Estimate(8));
        ledger.cast_vote("alice", &feature("search"), &g, CardValue::Estimate(3));

        assert_eq!(ledger.clear("login", &g.name), 2);
        assert!(ledger.votes_for("login", &g.name).is_empty());
        assert_eq!(ledger.votes_for("search", &g.name).len(), 1);
    }

    #[test]
    fn test_votes_for_keeps_insertion_order() {
        let mut ledger = VoteLedger::new();
        let g = game();
        for (who, v) in [("carol", 13), ("alice", 1), ("bob", 2)] {
            ledger.cast_vote(who, &feature("login"), &g, CardValue::Estimate(v));
        }
        let who: Vec<&str> = ledger
            .votes_for("login", &g.name)
            .iter()
            .map(|r| r.participant.as_str())
            .collect();
        assert_eq!(who, ["carol", "alice", "bob"]);
    }
}
