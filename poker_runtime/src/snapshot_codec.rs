//! Snapshot Codec: JSON encoder/decoder for game snapshots and backlog exports.
//!
//! - `encode_snapshot` / `decode_snapshot`: GameSnapshot ⇄ JSON
//! - `encode_backlog` / `decode_backlog`:   validated backlog ⇄ JSON
//! - `export_*_to_file` / `import_snapshot_from_file`: file I/O
//! - `snapshot_hash`: SHA-256 of the encoded snapshot (lowercase hex)
//!
//! Writes are all-or-nothing: temp file, fsync, rename.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use poker_engine::hashing::hex_digest;
use poker_engine::snapshot::{BacklogEntry, GameSnapshot};

use crate::error::{Result, RuntimeError};

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Encode a snapshot as indented JSON. Field order is fixed by the type.
pub fn encode_snapshot(snapshot: &GameSnapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).map_err(|source| RuntimeError::Malformed {
        what: "game snapshot",
        source,
    })
}

pub fn encode_backlog(entries: &[BacklogEntry]) -> Result<String> {
    serde_json::to_string_pretty(entries).map_err(|source| RuntimeError::Malformed {
        what: "backlog export",
        source,
    })
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decode a snapshot. Missing required fields or an unknown card fail
/// the whole document.
pub fn decode_snapshot(json: &str) -> Result<GameSnapshot> {
    serde_json::from_str(json).map_err(|source| RuntimeError::Malformed {
        what: "game snapshot",
        source,
    })
}

pub fn decode_backlog(json: &str) -> Result<Vec<BacklogEntry>> {
    serde_json::from_str(json).map_err(|source| RuntimeError::Malformed {
        what: "backlog export",
        source,
    })
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Write `bytes` to `path` atomically. Creates parent directories.
///
/// Either the previous content or the new content is visible afterwards,
/// never a truncated mix.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let inner = || -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)
    };
    inner().map_err(|source| RuntimeError::persistence(path, source))
}

pub fn export_snapshot_to_file(snapshot: &GameSnapshot, path: &Path) -> Result<()> {
    let json = encode_snapshot(snapshot)?;
    write_atomic(path, json.as_bytes())
}

pub fn export_backlog_to_file(entries: &[BacklogEntry], path: &Path) -> Result<()> {
    let json = encode_backlog(entries)?;
    write_atomic(path, json.as_bytes())
}

/// Read a snapshot file. Returns `None` if no file exists at `path`.
pub fn import_snapshot_from_file(path: &Path) -> Result<Option<GameSnapshot>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(RuntimeError::persistence(path, source)),
    };
    decode_snapshot(&content).map(Some)
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// SHA-256 of the encoded snapshot. Matches the hash of the file bytes
/// written by `export_snapshot_to_file`.
pub fn snapshot_hash(snapshot: &GameSnapshot) -> Result<String> {
    let json = encode_snapshot(snapshot)?;
    Ok(hex_digest(json.as_bytes()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use poker_engine::deck::CardValue;
    use poker_engine::domain::{GameMode, GameStatus};
    use poker_engine::snapshot::{FeatureSnapshot, VoteEntry};

    fn make_snapshot() -> GameSnapshot {
        GameSnapshot {
            game_name: "sprint-7".to_string(),
            status: GameStatus::Paused,
            mode: Some(GameMode::Strict),
            features: vec![
                FeatureSnapshot {
                    name: "login".to_string(),
                    description: "sign in with email".to_string(),
                    validated: true,
                    votes: vec![
                        VoteEntry {
                            participant: "alice".to_string(),
                            vote: CardValue::Estimate(3),
                        },
                        VoteEntry {
                            participant: "bob".to_string(),
                            vote: CardValue::Estimate(3),
                        },
                    ],
                    first_round_finished: true,
                },
                FeatureSnapshot {
                    name: "search".to_string(),
                    description: "full text".to_string(),
                    validated: false,
                    votes: Vec::new(),
                    first_round_finished: false,
                },
            ],
            participants: vec!["alice".to_string(), "bob".to_string()],
        }
    }

    // ── Roundtrip encode → decode → encode ──────────────────────────

    #[test]
    fn roundtrip_produces_identical_json() {
        let snap = make_snapshot();
        let json1 = encode_snapshot(&snap).unwrap();
        let decoded = decode_snapshot(&json1).unwrap();
        assert_eq!(decoded, snap);
        assert_eq!(json1, encode_snapshot(&decoded).unwrap());
    }

    // ── File content and hash parity ────────────────────────────────

    #[test]
    fn file_hash_matches_in_memory_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("etat_partie.json");
        let snap = make_snapshot();

        export_snapshot_to_file(&snap, &path).unwrap();

        let file_bytes = fs::read(&path).unwrap();
        assert_eq!(hex_digest(&file_bytes), snapshot_hash(&snap).unwrap());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(import_snapshot_from_file(&path).unwrap(), Some(snap));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            import_snapshot_from_file(&dir.path().join("absent.json")).unwrap(),
            None
        );
    }

    // ── Malformed documents ─────────────────────────────────────────

    #[test]
    fn corrupted_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"{ not valid json !!!}").unwrap();

        match import_snapshot_from_file(&path) {
            Err(RuntimeError::Malformed { what, .. }) => assert_eq!(what, "game snapshot"),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn off_deck_vote_is_malformed() {
        let json = r#"{"gameName":"g","status":"paused","participants":["a"],
            "features":[{"name":"f","description":"","validated":true,
                         "votes":[{"participant":"a","vote":4}]}]}"#;
        assert!(matches!(
            decode_snapshot(json),
            Err(RuntimeError::Malformed { .. })
        ));
    }

    #[test]
    fn backlog_wire_shape() {
        let entries = vec![BacklogEntry {
            name: "login".to_string(),
            description: "sign in".to_string(),
            mean_difficulty: 3.0,
            votes: vec![VoteEntry {
                participant: "alice".to_string(),
                vote: CardValue::Estimate(3),
            }],
        }];
        let value: serde_json::Value =
            serde_json::from_str(&encode_backlog(&entries).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "name": "login",
                "description": "sign in",
                "meanDifficulty": 3.0,
                "votes": [{"participant": "alice", "vote": 3}]
            }])
        );
        assert_eq!(decode_backlog(&value.to_string()).unwrap(), entries);
    }

    #[test]
    fn write_into_unwritable_location_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").unwrap();
        let err = write_atomic(&blocker.join("etat_partie.json"), b"{}").unwrap_err();
        assert!(matches!(err, RuntimeError::Persistence { .. }));
    }
}
