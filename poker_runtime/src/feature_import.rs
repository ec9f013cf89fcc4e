//! Reading a backlog to estimate from a JSON feature list.
//!
//! Accepted shape: `[{"name": "...", "description": "..."}, ...]`.
//! A single malformed entry rejects the whole list.

use std::fs;
use std::path::Path;

use poker_engine::domain::FeatureSpec;

use crate::error::{Result, RuntimeError};

pub fn parse_feature_list(json: &str) -> Result<Vec<FeatureSpec>> {
    serde_json::from_str(json).map_err(|source| RuntimeError::Malformed {
        what: "feature list",
        source,
    })
}

pub fn load_feature_list(path: &Path) -> Result<Vec<FeatureSpec>> {
    let content =
        fs::read_to_string(path).map_err(|source| RuntimeError::persistence(path, source))?;
    parse_feature_list(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parses_in_order() {
        let specs = parse_feature_list(
            r#"[{"name":"login","description":"sign in"},
                {"name":"search","description":""}]"#,
        )
        .unwrap();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["login", "search"]);
    }

    #[test]
    fn test_one_bad_entry_rejects_all() {
        for json in [
            r#"[{"name":"login","description":"x"},{"description":"no name"}]"#,
            r#"[{"name":"login","description":"x","points":3}]"#,
            r#"{"name":"login","description":"x"}"#,
            "not json",
        ] {
            let err = parse_feature_list(json).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{json}");
        }
    }

    #[test]
    fn test_missing_file_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_feature_list(&dir.path().join("backlog.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }
}
