//! Durable storage for game snapshots and validated backlogs.
//!
//! Directory layout of `FileStore`:
//!   <root>/<game slug>/etat_partie.json     last snapshot written on pause
//!   <root>/<game slug>/backlog_valide.json  export written on finish

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::debug;

use poker_engine::snapshot::{BacklogEntry, GameSnapshot};

use crate::error::Result;
use crate::snapshot_codec;

pub const SNAPSHOT_FILE: &str = "etat_partie.json";
pub const BACKLOG_FILE: &str = "backlog_valide.json";

/// Where sessions write their effects. Every write is all-or-nothing.
pub trait GameStore: Send + Sync {
    /// Persist `snapshot` and return the location written.
    fn save_snapshot(&self, snapshot: &GameSnapshot) -> Result<PathBuf>;

    /// Last snapshot written for `game`, if any.
    fn load_snapshot(&self, game: &str) -> Result<Option<GameSnapshot>>;

    fn save_backlog(&self, game: &str, entries: &[BacklogEntry]) -> Result<PathBuf>;
}

/// Map a game name onto a single safe path component.
pub fn slugify(game: &str) -> String {
    let slug: String = game
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if slug.is_empty() {
        "_".to_string()
    } else {
        slug
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn game_dir(&self, game: &str) -> PathBuf {
        self.root.join(slugify(game))
    }

    pub fn snapshot_path(&self, game: &str) -> PathBuf {
        self.game_dir(game).join(SNAPSHOT_FILE)
    }

    pub fn backlog_path(&self, game: &str) -> PathBuf {
        self.game_dir(game).join(BACKLOG_FILE)
    }
}

impl GameStore for FileStore {
    fn save_snapshot(&self, snapshot: &GameSnapshot) -> Result<PathBuf> {
        let path = self.snapshot_path(&snapshot.game_name);
        let sha256 = snapshot_codec::snapshot_hash(snapshot)?;
        snapshot_codec::export_snapshot_to_file(snapshot, &path)?;
        debug!(
            game = %snapshot.game_name,
            path = %path.display(),
            sha256 = %sha256,
            "snapshot written"
        );
        Ok(path)
    }

    fn load_snapshot(&self, game: &str) -> Result<Option<GameSnapshot>> {
        snapshot_codec::import_snapshot_from_file(&self.snapshot_path(game))
    }

    fn save_backlog(&self, game: &str, entries: &[BacklogEntry]) -> Result<PathBuf> {
        let path = self.backlog_path(game);
        snapshot_codec::export_backlog_to_file(entries, &path)?;
        debug!(game, path = %path.display(), features = entries.len(), "backlog written");
        Ok(path)
    }
}

/// In-process store, keyed by game name.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: DashMap<String, GameSnapshot>,
    backlogs: DashMap<String, Vec<BacklogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backlog(&self, game: &str) -> Option<Vec<BacklogEntry>> {
        self.backlogs.get(game).map(|entry| entry.value().clone())
    }
}

impl GameStore for MemoryStore {
    fn save_snapshot(&self, snapshot: &GameSnapshot) -> Result<PathBuf> {
        self.snapshots
            .insert(snapshot.game_name.clone(), snapshot.clone());
        Ok(PathBuf::from(format!("memory://{}/{SNAPSHOT_FILE}", snapshot.game_name)))
    }

    fn load_snapshot(&self, game: &str) -> Result<Option<GameSnapshot>> {
        Ok(self.snapshots.get(game).map(|entry| entry.value().clone()))
    }

    fn save_backlog(&self, game: &str, entries: &[BacklogEntry]) -> Result<PathBuf> {
        self.backlogs.insert(game.to_string(), entries.to_vec());
        Ok(PathBuf::from(format!("memory://{game}/{BACKLOG_FILE}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poker_engine::domain::GameStatus;

    fn empty_snapshot(game: &str) -> GameSnapshot {
        GameSnapshot {
            game_name: game.to_string(),
            status: GameStatus::Paused,
            mode: None,
            features: Vec::new(),
            participants: vec!["alice".to_string()],
        }
    }

    #[test]
    fn test_slug_is_one_path_component() {
        assert_eq!(slugify("sprint-42"), "sprint-42");
        assert_eq!(slugify("Q3 planning"), "Q3_planning");
        assert_eq!(slugify("../etc"), "___etc");
        assert_eq!(slugify("   "), "_");
    }

    #[test]
    fn test_file_store_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let path = store.save_snapshot(&empty_snapshot("Q3 planning")).unwrap();
        assert_eq!(path, dir.path().join("Q3_planning").join(SNAPSHOT_FILE));
        assert!(path.exists());
        assert_eq!(
            store.load_snapshot("Q3 planning").unwrap(),
            Some(empty_snapshot("Q3 planning"))
        );
        assert_eq!(store.load_snapshot("other").unwrap(), None);

        let path = store.save_backlog("Q3 planning", &[]).unwrap();
        assert_eq!(path, store.backlog_path("Q3 planning"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
    }

    #[test]
    fn test_memory_store_overwrites_last_snapshot() {
        let store = MemoryStore::new();
        store.save_snapshot(&empty_snapshot("g")).unwrap();
        let mut second = empty_snapshot("g");
        second.participants.push("bob".to_string());
        store.save_snapshot(&second).unwrap();
        assert_eq!(store.load_snapshot("g").unwrap(), Some(second));
        assert_eq!(store.backlog("g"), None);
    }
}
