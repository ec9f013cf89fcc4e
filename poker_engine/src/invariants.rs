/// Planning Poker Kernel: Invariant Checks
///
/// Run after every transition. A failure means the kernel produced an
/// inconsistent state; the transition is rejected and nothing is committed.

use std::collections::BTreeSet;

use crate::domain::GameStatus;
use crate::error::GameError;
use crate::state::GameState;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every check. Returns the first failure.
pub fn check_invariants(state: &GameState) -> Result<(), GameError> {
    check_roster(state)?;
    check_turn_index(state)?;
    check_unique_features(state)?;
    check_difficulty_matches_flag(state)?;
    check_vote_refs(state)?;
    check_discussion(state)?;
    check_round_votes(state)?;
    check_finished_has_no_pending(state)?;
    Ok(())
}

fn violation(check: &'static str, detail: String) -> GameError {
    GameError::Invariant { check, detail }
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

/// Roster is non-empty, pseudos are unique, the admin is seated.
fn check_roster(state: &GameState) -> Result<(), GameError> {
    let roster = state.turns.roster();
    if roster.is_empty() {
        return Err(violation("roster", "roster is empty".to_string()));
    }
    let mut seen = BTreeSet::new();
    for p in roster {
        if !seen.insert(p.pseudo.as_str()) {
            return Err(violation("roster", format!("{:?} is seated twice", p.pseudo)));
        }
    }
    if !roster.iter().any(|p| p.pseudo == state.game.admin && p.is_admin) {
        return Err(violation(
            "roster",
            format!("admin {:?} is not seated", state.game.admin),
        ));
    }
    Ok(())
}

fn check_turn_index(state: &GameState) -> Result<(), GameError> {
    if state.turns.index() >= state.turns.len() {
        return Err(violation(
            "turn_index",
            format!(
                "index {} out of range for roster of {}",
                state.turns.index(),
                state.turns.len()
            ),
        ));
    }
    Ok(())
}

fn check_unique_features(state: &GameState) -> Result<(), GameError> {
    let mut seen = BTreeSet::new();
    for f in state.registry.iter() {
        if !seen.insert(f.name.as_str()) {
            return Err(violation(
                "unique_features",
                format!("feature {:?} is registered twice", f.name),
            ));
        }
    }
    Ok(())
}

/// A feature carries a difficulty exactly when it is validated.
fn check_difficulty_matches_flag(state: &GameState) -> Result<(), GameError> {
    for f in state.registry.iter() {
        if f.validated != f.difficulty.is_some() {
            return Err(violation(
                "difficulty_matches_flag",
                format!(
                    "feature {:?} validated={} difficulty={:?}",
                    f.name, f.validated, f.difficulty
                ),
            ));
        }
    }
    Ok(())
}

/// Every vote belongs to this game, a seated participant and a known feature.
fn check_vote_refs(state: &GameState) -> Result<(), GameError> {
    for r in state.ledger.records() {
        if r.game != state.game.name {
            return Err(violation(
                "vote_refs",
                format!("vote for foreign game {:?}", r.game),
            ));
        }
        if !state.turns.contains(&r.participant) {
            return Err(violation(
                "vote_refs",
                format!("vote by unseated participant {:?}", r.participant),
            ));
        }
        if state.registry.get(&r.feature).is_none() {
            return Err(violation(
                "vote_refs",
                format!("vote on unknown feature {:?}", r.feature),
            ));
        }
    }
    Ok(())
}

/// An open discussion targets the current feature of a running game.
fn check_discussion(state: &GameState) -> Result<(), GameError> {
    let Some(d) = &state.discussion else {
        return Ok(());
    };
    if state.game.status != GameStatus::Waiting {
        return Err(violation(
            "discussion",
            format!("discussion open while game is {}", state.game.status),
        ));
    }
    match state.current_feature() {
        Some(f) if f.name == d.feature => Ok(()),
        _ => Err(violation(
            "discussion",
            format!("discussion on {:?} is not the current feature", d.feature),
        )),
    }
}

/// Votes on a pending feature come from the round in progress only:
/// at most one per seat already played, none on features not reached.
fn check_round_votes(state: &GameState) -> Result<(), GameError> {
    let current = state.current_feature().map(|f| f.name.as_str());
    let discussed = state.discussion.as_ref().map(|d| d.feature.as_str());
    for f in state.registry.iter().filter(|f| !f.validated) {
        let name = Some(f.name.as_str());
        if name == discussed {
            continue;
        }
        let cast = state.ledger.votes_for(&f.name, &state.game.name).len();
        let allowed = if name == current { state.turns.index() } else { 0 };
        if cast > allowed {
            return Err(violation(
                "round_votes",
                format!(
                    "pending feature {:?} holds {cast} votes, at most {allowed} expected",
                    f.name
                ),
            ));
        }
    }
    Ok(())
}

fn check_finished_has_no_pending(state: &GameState) -> Result<(), GameError> {
    if state.game.status == GameStatus::Finished && state.registry.pending_count() > 0 {
        return Err(violation(
            "finished_has_no_pending",
            format!(
                "{} features still pending in a finished game",
                state.registry.pending_count()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureSpec, GameMode};
    use crate::state::create_initial_state;

    fn base() -> GameState {
        let mut state = create_initial_state("g", "alice", &[], GameMode::Strict).unwrap();
        state
            .registry
            .import_from(&[FeatureSpec {
                name: "login".to_string(),
                description: String::new(),
            }])
            .unwrap();
        state
    }

    #[test]
    fn test_fresh_state_passes() {
        assert!(check_invariants(&base()).is_ok());
    }

    #[test]
    fn test_finished_with_pending_fails() {
        let mut state = base();
        state.game.status = GameStatus::Finished;
        let err = check_invariants(&state).unwrap_err();
        assert!(matches!(
            err,
            GameError::Invariant {
                check: "finished_has_no_pending",
                ..
            }
        ));
    }

    #[test]
    fn test_stale_votes_on_pending_feature_fail() {
        let mut state = base();
        let feature = state.registry.get("login").cloned().unwrap();
        let game = state.game.clone();
        state
            .ledger
            .cast_vote("alice", &feature, &game, crate::deck::CardValue::Pause);
        assert!(matches!(
            check_invariants(&state),
            Err(GameError::Invariant {
                check: "round_votes",
                ..
            })
        ));
    }

    #[test]
    fn test_stray_discussion_fails() {
        let mut state = base();
        state.discussion = Some(crate::domain::Discussion {
            feature: "login".to_string(),
            mean: 1.0,
        });
        // game is still new
        assert!(matches!(
            check_invariants(&state),
            Err(GameError::Invariant {
                check: "discussion",
                ..
            })
        ));
    }
}
