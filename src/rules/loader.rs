#![forbid(unsafe_code)]

//! Tiered rule loading with id-keyed overrides
//!
//! Load order is strict: embedded defaults, then the user directory, then
//! the project directory. A later definition replaces an earlier one with
//! the same id wholesale (never field-wise). Missing directories are not
//! errors.

use crate::ast::CheckRegistry;
use crate::error::ConfigError;
use crate::rules::builtin::load_builtin_rules;
use crate::rules::model::{parse_document, Rule};
use std::path::Path;
use tracing::debug;

/// The effective rule set after tier merge
///
/// Iteration order is stable: an override keeps the original position of
/// the id it replaces, appended rules follow in load order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build a set from already-validated rules, rejecting duplicate ids
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, ConfigError> {
        let mut set = RuleSet::default();
        for rule in rules {
            if set.get(&rule.id).is_some() {
                return Err(ConfigError::DuplicateRuleId { id: rule.id });
            }
            set.rules.push(rule);
        }
        Ok(set)
    }

    /// The embedded built-in defaults
    pub fn builtin(registry: &CheckRegistry) -> Result<Self, ConfigError> {
        Self::from_rules(load_builtin_rules(registry)?)
    }

    /// Full tiered load: defaults, then user rules, then project rules
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any present document fails to parse or
    /// validate; absent directories load nothing and succeed.
    pub fn load(
        registry: &CheckRegistry,
        user_dir: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut set = Self::builtin(registry)?;
        if let Some(dir) = user_dir {
            set.merge_dir(dir, registry)?;
        }
        if let Some(dir) = project_dir {
            set.merge_dir(dir, registry)?;
        }
        Ok(set)
    }

    /// Merge every `.yaml`/`.yml` document in a directory, overriding by id
    ///
    /// Files are visited in lexicographic order so overrides are
    /// deterministic.
    pub fn merge_dir(
        &mut self,
        dir: &Path,
        registry: &CheckRegistry,
    ) -> Result<(), ConfigError> {
        if !dir.exists() {
            debug!(dir = %dir.display(), "rule directory absent, skipping");
            return Ok(());
        }

        let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            })
            .collect();
        paths.sort();

        for path in paths {
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let rules = parse_document(&text, registry).map_err(|err| match err {
                ConfigError::InvalidDocument { source, .. } => ConfigError::InvalidDocument {
                    path: path.clone(),
                    source,
                },
                other => other,
            })?;
            debug!(path = %path.display(), count = rules.len(), "loaded rule document");
            self.merge(rules);
        }
        Ok(())
    }

    /// Replace-or-append each rule by id
    pub fn merge(&mut self, rules: Vec<Rule>) {
        for rule in rules {
            self.upsert(rule);
        }
    }

    /// Insert one rule, replacing any existing definition with the same id
    pub fn upsert(&mut self, rule: Rule) {
        match self.rules.iter_mut().find(|existing| existing.id == rule.id) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Replace the whole set
    pub fn replace_all(&mut self, rules: Vec<Rule>) {
        self.rules = rules;
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
