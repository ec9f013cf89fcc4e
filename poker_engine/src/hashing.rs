/// Planning Poker Kernel: Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing of a game.
///
/// Rules:
///   - Features in registry order, votes in ledger order
///   - Roster in turn order
///   - Round records sorted by feature name (BTreeMap order)
///   - UTF-8 JSON, no whitespace

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::state::GameState;
use crate::ENGINE_VERSION;

/// Canonical serialization of a game to UTF-8 JSON bytes.
/// `engine_version` is the first field.
pub fn canonical_serialize(state: &GameState) -> Vec<u8> {
    build_canonical_value(state).to_string().into_bytes()
}

/// SHA-256 of the canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &GameState) -> String {
    hex_digest(&canonical_serialize(state))
}

pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn build_canonical_value(state: &GameState) -> Value {
    let roster: Vec<Value> = state
        .turns
        .roster()
        .iter()
        .map(|p| json!({ "pseudo": p.pseudo, "is_admin": p.is_admin }))
        .collect();

    let features: Vec<Value> = state
        .registry
        .iter()
        .map(|f| {
            json!({
                "name": f.name,
                "description": f.description,
                "validated": f.validated,
                "difficulty": f.difficulty,
            })
        })
        .collect();

    let votes: Vec<Value> = state
        .ledger
        .records()
        .iter()
        .map(|r| {
            json!({
                "participant": r.participant,
                "feature": r.feature,
                "value": r.value,
                "mode": r.mode,
                "feature_validated": r.feature_validated,
            })
        })
        .collect();

    let mut rounds = Map::new();
    for (name, record) in &state.rounds {
        rounds.insert(
            name.clone(),
            json!({
                "first_round_finished": record.first_round_finished,
                "completed_rounds": record.completed_rounds,
            }),
        );
    }

    // -- top-level (strict field order) ---
    let mut root = Map::new();
    root.insert("engine_version".to_string(), Value::from(ENGINE_VERSION));
    root.insert("game".to_string(), Value::String(state.game.name.clone()));
    root.insert("admin".to_string(), Value::String(state.game.admin.clone()));
    root.insert("mode".to_string(), Value::from(state.game.mode.as_str()));
    root.insert("status".to_string(), Value::from(state.game.status.as_str()));
    root.insert("roster".to_string(), Value::Array(roster));
    root.insert("turn_index".to_string(), Value::from(state.turns.index()));
    root.insert("features".to_string(), Value::Array(features));
    root.insert("votes".to_string(), Value::Array(votes));
    root.insert("rounds".to_string(), Value::Object(rounds));
    root.insert(
        "discussion".to_string(),
        match &state.discussion {
            Some(d) => json!({ "feature": d.feature, "mean": d.mean }),
            None => Value::Null,
        },
    );
    Value::Object(root)
}
