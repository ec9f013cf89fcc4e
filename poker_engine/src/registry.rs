/// Planning Poker Kernel: Feature Registry
///
/// Insertion-ordered backlog. The feature under estimation is always the
/// first unvalidated one.

use serde::{Deserialize, Serialize};

use crate::domain::{Feature, FeatureSpec};
use crate::error::GameError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRegistry {
    features: Vec<Feature>,
}

/// What an import did to the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: Vec<String>,
    pub reset: Vec<String>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_pending(&self) -> Option<&Feature> {
        self.features.iter().find(|f| !f.validated)
    }

    /// Upsert features by name. The whole batch is checked before anything
    /// is touched, so a bad record leaves the registry unchanged.
    ///
    /// Existing features whose name is imported again are reset to
    /// unvalidated; their description is kept.
    pub fn import_from(&mut self, items: &[FeatureSpec]) -> Result<ImportSummary, GameError> {
        for (pos, item) in items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(GameError::validation(format!(
                    "import record #{pos} has an empty name"
                )));
            }
        }

        let mut summary = ImportSummary::default();
        for item in items {
            match self.features.iter_mut().find(|f| f.name == item.name) {
                Some(existing) => {
                    let seen = summary.reset.contains(&existing.name)
                        || summary.created.contains(&existing.name);
                    if !seen {
                        existing.validated = false;
                        existing.difficulty = None;
                        summary.reset.push(existing.name.clone());
                    }
                }
                None => {
                    self.features.push(Feature {
                        name: item.name.clone(),
                        description: item.description.clone(),
                        validated: false,
                        difficulty: None,
                    });
                    summary.created.push(item.name.clone());
                }
            }
        }
        Ok(summary)
    }

    /// Append a feature carried over from a snapshot. No-op if the name
    /// is already present.
    pub fn insert(&mut self, feature: Feature) -> bool {
        if self.get(&feature.name).is_some() {
            return false;
        }
        self.features.push(feature);
        true
    }

    /// Flip a feature to validated. Validated features stay validated.
    pub fn mark_validated(&mut self, name: &str, difficulty: f64) -> Result<(), GameError> {
        let feature = self
            .features
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| GameError::precondition(format!("unknown feature {name:?}")))?;
        if !feature.validated {
            feature.validated = true;
            feature.difficulty = Some(difficulty);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn validated(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|f| f.validated)
    }

    pub fn pending_count(&self) -> usize {
        self.features.iter().filter(|f| !f.validated).count()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> FeatureSpec {
        FeatureSpec {
            name: name.to_string(),
            description: format!("{name} description"),
        }
    }

    #[test]
    fn test_next_pending_follows_insertion_order() {
        let mut reg = FeatureRegistry::new();
        reg.import_from(&[spec("login"), spec("search"), spec("export")])
            .unwrap();
        assert_eq!(reg.next_pending().unwrap().name, "login");
        reg.mark_validated("login", 5.0).unwrap();
        assert_eq!(reg.next_pending().unwrap().name, "search");
        reg.mark_validated("export", 3.0).unwrap();
        assert_eq!(reg.next_pending().unwrap().name, "search");
        reg.mark_validated("search", 8.0).unwrap();
        assert!(reg.next_pending().is_none());
    }

    #[test]
    fn test_reimport_resets_existing_feature() {
        let mut reg = FeatureRegistry::new();
        reg.import_from(&[spec("login")]).unwrap();
        reg.mark_validated("login", 5.0).unwrap();

        let summary = reg.import_from(&[spec("login"), spec("search")]).unwrap();
        assert_eq!(summary.reset, ["login"]);
        assert_eq!(summary.created, ["search"]);
        let login = reg.get("login").unwrap();
        assert!(!login.validated);
        assert_eq!(login.difficulty, None);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_bad_record_rejects_whole_batch() {
        let mut reg = FeatureRegistry::new();
        let err = reg
            .import_from(&[spec("login"), spec("  ")])
            .unwrap_err();
        assert!(matches!(err, GameError::Validation(_)));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_mark_validated_never_reverts_or_overwrites() {
        let mut reg = FeatureRegistry::new();
        reg.import_from(&[spec("login")]).unwrap();
        reg.mark_validated("login", 5.0).unwrap();
        reg.mark_validated("login", 13.0).unwrap();
        assert_eq!(reg.get("login").unwrap().difficulty, Some(5.0));
        assert!(reg.mark_validated("missing", 1.0).is_err());
    }
}
