/// Planning Poker Kernel: Round Resolver
///
/// Pure decision on a completed round. Applying the outcome (flags,
/// ledger clears, status changes) is done by the transition layer.
///
/// Rules, in order:
///   1. every participant played PAUSE             → Paused
///   2. one distinct value, and it is an estimate  → Validated
///   3. strict mode                                → Discarded
///   4. average mode, feature's first round        → Discarded
///   5. average mode, later round                  → AwaitingDiscussion
///      (mean of the estimates, 0 when there are none)

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::deck::{mean_of, CardValue};
use crate::domain::{GameMode, RoundRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RoundOutcome {
    Validated { difficulty: f64 },
    Discarded { cleared: usize },
    AwaitingDiscussion { mean: f64 },
    Paused,
}

impl RoundOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RoundOutcome::Validated { .. } => "validated",
            RoundOutcome::Discarded { .. } => "discarded",
            RoundOutcome::AwaitingDiscussion { .. } => "awaiting_discussion",
            RoundOutcome::Paused => "paused",
        }
    }
}

/// True if every cast value is the same estimate.
pub fn is_unanimous(votes: &[CardValue]) -> bool {
    let distinct: BTreeSet<&CardValue> = votes.iter().collect();
    distinct.len() == 1 && votes[0].as_estimate().is_some()
}

/// Decide a completed round. `votes` are the values cast this round
/// (abstentions are never recorded, so may be shorter than the roster).
pub fn resolve_round(
    votes: &[CardValue],
    roster_size: usize,
    mode: GameMode,
    record: &RoundRecord,
) -> RoundOutcome {
    if roster_size > 0 && votes.len() == roster_size && votes.iter().all(CardValue::is_pause) {
        return RoundOutcome::Paused;
    }

    if is_unanimous(votes) {
        return RoundOutcome::Validated {
            difficulty: mean_of(votes),
        };
    }

    match mode {
        GameMode::Strict => RoundOutcome::Discarded {
            cleared: votes.len(),
        },
        GameMode::Average if !record.first_round_finished => RoundOutcome::Discarded {
            cleared: votes.len(),
        },
        GameMode::Average => RoundOutcome::AwaitingDiscussion {
            mean: mean_of(votes),
        },
    }
}
