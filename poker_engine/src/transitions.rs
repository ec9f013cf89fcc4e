/// Planning Poker Kernel: Centralized Transition Logic
///
/// ALL state-mutation logic lives here.
/// `apply_command` clones the input state and mutates the clone, so a
/// rejected command never leaves a partially applied state behind.
///
/// Transition table (game status):
///   new      --Launch-----------------> waiting
///   new      --Resume-----------------> waiting
///   waiting  --Pause / pause round----> paused
///   paused   --Resume-----------------> waiting
///   waiting  --no pending feature-----> finished
///
/// Side effects that must reach storage are returned as an `Effect`;
/// the caller commits the new state only once the effect is durable.

use crate::deck::{mean_of, CardValue};
use crate::domain::{
    Discussion, Feature, FeatureSpec, GameStatus, Participant, VoteRecord,
};
use crate::error::GameError;
use crate::invariants::check_invariants;
use crate::resolver::{resolve_round, RoundOutcome};
use crate::snapshot::{export_backlog, snapshot_of, BacklogEntry, GameSnapshot};
use crate::state::GameState;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ImportFeatures(Vec<FeatureSpec>),
    Launch,
    CastVote(CardValue),
    ConcludeDiscussion,
    Tick,
    Pause,
    Resume(GameSnapshot),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ImportFeatures(_) => "import_features",
            Command::Launch => "launch",
            Command::CastVote(_) => "cast_vote",
            Command::ConcludeDiscussion => "conclude_discussion",
            Command::Tick => "tick",
            Command::Pause => "pause",
            Command::Resume(_) => "resume",
        }
    }
}

/// Output that must be written to storage before the transition counts.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    PersistSnapshot(GameSnapshot),
    ExportBacklog(Vec<BacklogEntry>),
}

/// Structured outcome of one command.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub command: &'static str,
    pub status_before: GameStatus,
    pub status_after: GameStatus,
    pub voter: Option<String>,
    pub feature: Option<String>,
    pub vote: Option<VoteRecord>,
    pub round: Option<RoundOutcome>,
    pub effect: Option<Effect>,
}

impl TransitionResult {
    fn new(command: &'static str, status: GameStatus) -> Self {
        Self {
            command,
            status_before: status,
            status_after: status,
            voter: None,
            feature: None,
            vote: None,
            round: None,
            effect: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply `command` to `state` and return `(new_state, result)`.
/// The input state is never mutated.
pub fn apply_command(
    state: &GameState,
    command: &Command,
) -> Result<(GameState, TransitionResult), GameError> {
    let mut next = state.clone();
    let mut result = TransitionResult::new(command.name(), state.game.status);

    match command {
        Command::ImportFeatures(items) => apply_import(&mut next, items)?,
        Command::Launch => apply_launch(&mut next, &mut result)?,
        Command::CastVote(value) => apply_cast_vote(&mut next, &mut result, *value)?,
        Command::ConcludeDiscussion => apply_conclude_discussion(&mut next, &mut result)?,
        Command::Tick => apply_tick(&mut next, &mut result)?,
        Command::Pause => apply_pause(&mut next, &mut result)?,
        Command::Resume(snapshot) => apply_resume(&mut next, &mut result, snapshot)?,
    }

    result.status_after = next.game.status;
    check_invariants(&next)?;
    Ok((next, result))
}

// ---------------------------------------------------------------------------
// Individual transition handlers (private)
// ---------------------------------------------------------------------------

fn require_status(
    state: &GameState,
    expected: GameStatus,
    action: &'static str,
) -> Result<(), GameError> {
    if state.game.status != expected {
        return Err(GameError::InvalidTransition {
            from: state.game.status,
            action,
        });
    }
    Ok(())
}

fn require_no_discussion(state: &GameState) -> Result<(), GameError> {
    match &state.discussion {
        Some(d) => Err(GameError::precondition(format!(
            "discussion on {:?} is still open",
            d.feature
        ))),
        None => Ok(()),
    }
}

fn apply_import(state: &mut GameState, items: &[FeatureSpec]) -> Result<(), GameError> {
    require_status(state, GameStatus::New, "import features into")?;
    let summary = state.registry.import_from(items)?;
    for name in &summary.reset {
        state.ledger.clear(name, &state.game.name);
        state.rounds.remove(name);
    }
    Ok(())
}

fn apply_launch(state: &mut GameState, result: &mut TransitionResult) -> Result<(), GameError> {
    require_status(state, GameStatus::New, "launch")?;
    state.game.status = GameStatus::Waiting;
    state.turns.reset();
    finish_if_done(state, result);
    Ok(())
}

fn apply_cast_vote(
    state: &mut GameState,
    result: &mut TransitionResult,
    value: CardValue,
) -> Result<(), GameError> {
    require_status(state, GameStatus::Waiting, "cast a vote in")?;
    require_no_discussion(state)?;

    let feature = state
        .current_feature()
        .cloned()
        .ok_or_else(|| GameError::precondition("no feature is pending"))?;
    let voter = state.turns.current_participant()?.pseudo.clone();

    result.vote = state
        .ledger
        .cast_vote(&voter, &feature, &state.game, value)
        .cloned();
    result.voter = Some(voter);
    result.feature = Some(feature.name.clone());

    if state.turns.advance()? {
        let outcome = close_round(state, &feature)?;
        let stop = matches!(
            outcome,
            RoundOutcome::Paused | RoundOutcome::AwaitingDiscussion { .. }
        );
        if outcome == RoundOutcome::Paused {
            result.effect = Some(Effect::PersistSnapshot(snapshot_of(state)));
        }
        result.round = Some(outcome);
        if stop {
            return Ok(());
        }
    }

    finish_if_done(state, result);
    Ok(())
}

/// Resolve the round that just completed on `feature` and apply the outcome.
fn close_round(state: &mut GameState, feature: &Feature) -> Result<RoundOutcome, GameError> {
    let game = state.game.name.clone();
    let votes: Vec<CardValue> = state
        .ledger
        .votes_for(&feature.name, &game)
        .iter()
        .map(|r| r.value)
        .collect();
    let record = state.round_record(&feature.name);
    let outcome = resolve_round(&votes, state.turns.len(), state.game.mode, &record);
    state.turns.reset();

    match &outcome {
        RoundOutcome::Paused => {
            // the pause round is a signal, not an estimate
            state.ledger.clear(&feature.name, &game);
            state.game.status = GameStatus::Paused;
            return Ok(outcome);
        }
        RoundOutcome::Validated { difficulty } => {
            state.registry.mark_validated(&feature.name, *difficulty)?;
        }
        RoundOutcome::Discarded { .. } => {
            state.ledger.clear(&feature.name, &game);
        }
        RoundOutcome::AwaitingDiscussion { mean } => {
            state.discussion = Some(Discussion {
                feature: feature.name.clone(),
                mean: *mean,
            });
        }
    }

    let record = state.rounds.entry(feature.name.clone()).or_default();
    record.first_round_finished = true;
    record.completed_rounds += 1;
    Ok(outcome)
}

fn apply_conclude_discussion(
    state: &mut GameState,
    result: &mut TransitionResult,
) -> Result<(), GameError> {
    require_status(state, GameStatus::Waiting, "conclude a discussion in")?;
    let discussion = state
        .discussion
        .take()
        .ok_or_else(|| GameError::precondition("no discussion is open"))?;
    state
        .registry
        .mark_validated(&discussion.feature, discussion.mean)?;
    result.feature = Some(discussion.feature);
    result.round = Some(RoundOutcome::Validated {
        difficulty: discussion.mean,
    });
    finish_if_done(state, result);
    Ok(())
}

fn apply_tick(state: &mut GameState, result: &mut TransitionResult) -> Result<(), GameError> {
    require_status(state, GameStatus::Waiting, "tick")?;
    finish_if_done(state, result);
    Ok(())
}

fn apply_pause(state: &mut GameState, result: &mut TransitionResult) -> Result<(), GameError> {
    require_status(state, GameStatus::Waiting, "pause")?;
    require_no_discussion(state)?;

    // a partially collected round is withdrawn
    if let Some(feature) = state.current_feature().map(|f| f.name.clone()) {
        state.ledger.clear(&feature, &state.game.name);
        result.feature = Some(feature);
    }
    state.turns.reset();
    state.game.status = GameStatus::Paused;
    result.effect = Some(Effect::PersistSnapshot(snapshot_of(state)));
    Ok(())
}

fn apply_resume(
    state: &mut GameState,
    result: &mut TransitionResult,
    snapshot: &GameSnapshot,
) -> Result<(), GameError> {
    match state.game.status {
        GameStatus::New | GameStatus::Paused => {}
        from => {
            return Err(GameError::InvalidTransition {
                from,
                action: "resume",
            })
        }
    }
    if snapshot.game_name != state.game.name {
        return Err(GameError::validation(format!(
            "snapshot belongs to game {:?}, not {:?}",
            snapshot.game_name, state.game.name
        )));
    }
    validate_snapshot(state, snapshot)?;

    if let Some(mode) = snapshot.mode {
        state.game.mode = mode;
    }
    for pseudo in &snapshot.participants {
        state.turns.add(Participant::new(pseudo.as_str()));
    }

    for fs in &snapshot.features {
        state.registry.insert(Feature {
            name: fs.name.clone(),
            description: fs.description.clone(),
            validated: false,
            difficulty: None,
        });
        let feature = state
            .registry
            .get(&fs.name)
            .cloned()
            .ok_or_else(|| GameError::precondition(format!("unknown feature {:?}", fs.name)))?;

        if fs.first_round_finished {
            state
                .rounds
                .entry(fs.name.clone())
                .or_default()
                .first_round_finished = true;
        }
        // votes on a pending feature belong to a round that never closed
        if !fs.validated {
            continue;
        }

        for entry in &fs.votes {
            let known = state
                .ledger
                .contains(&entry.participant, &fs.name, &state.game.name, entry.vote);
            if !known {
                state
                    .ledger
                    .cast_vote(&entry.participant, &feature, &state.game, entry.vote);
            }
        }

        let difficulty = mean_of(fs.votes.iter().map(|v| &v.vote));
        state.registry.mark_validated(&fs.name, difficulty)?;
    }

    state.turns.reset();
    state.discussion = None;
    state.game.status = GameStatus::Waiting;
    finish_if_done(state, result);
    Ok(())
}

/// Reject a snapshot before anything is merged.
fn validate_snapshot(state: &GameState, snapshot: &GameSnapshot) -> Result<(), GameError> {
    for pseudo in &snapshot.participants {
        if pseudo.trim().is_empty() {
            return Err(GameError::validation("snapshot lists a blank participant"));
        }
    }
    for fs in &snapshot.features {
        if fs.name.trim().is_empty() {
            return Err(GameError::validation("snapshot lists a feature with no name"));
        }
        for entry in &fs.votes {
            let seated = state.turns.contains(&entry.participant)
                || snapshot.participants.contains(&entry.participant);
            if !seated {
                return Err(GameError::validation(format!(
                    "vote on {:?} by unknown participant {:?}",
                    fs.name, entry.participant
                )));
            }
        }
    }
    Ok(())
}

/// Finish the game once nothing is left to estimate.
fn finish_if_done(state: &mut GameState, result: &mut TransitionResult) {
    if state.game.status == GameStatus::Waiting
        && state.discussion.is_none()
        && state.registry.next_pending().is_none()
    {
        state.game.status = GameStatus::Finished;
        result.effect = Some(Effect::ExportBacklog(export_backlog(state)));
    }
}
