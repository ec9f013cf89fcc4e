//! Runtime configuration, read from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, RuntimeError};

pub const DATA_DIR_VAR: &str = "POKER_DATA_DIR";
pub const DISCUSSION_DELAY_VAR: &str = "POKER_DISCUSSION_DELAY_SECS";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_DISCUSSION_DELAY_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Root for snapshot and backlog files, one subdirectory per game.
    pub data_dir: PathBuf,
    /// Time between announcing an averaged result and validating it.
    pub discussion_delay: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            discussion_delay: Duration::from_secs(DEFAULT_DISCUSSION_DELAY_SECS),
        }
    }
}

impl RuntimeConfig {
    pub fn new(data_dir: impl Into<PathBuf>, discussion_delay: Duration) -> Self {
        Self {
            data_dir: data_dir.into(),
            discussion_delay,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(DATA_DIR_VAR) {
            if dir.trim().is_empty() {
                return Err(RuntimeError::Config(format!("{DATA_DIR_VAR} is set but empty")));
            }
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(DISCUSSION_DELAY_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                RuntimeError::Config(format!(
                    "{DISCUSSION_DELAY_VAR} must be a whole number of seconds, got {raw:?}"
                ))
            })?;
            config.discussion_delay = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.discussion_delay, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            (DATA_DIR_VAR, "/var/lib/poker"),
            (DISCUSSION_DELAY_VAR, "3"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/poker"));
        assert_eq!(config.discussion_delay, Duration::from_secs(3));
    }

    #[test]
    fn test_bad_delay_is_config_error() {
        let err = RuntimeConfig::from_lookup(lookup(&[(DISCUSSION_DELAY_VAR, "soon")]))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }
}
