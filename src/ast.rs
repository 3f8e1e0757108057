#![forbid(unsafe_code)]

//! AST check framework
//!
//! Language detection from file extensions, a process-wide registry of named
//! checks, and the built-in checks that walk parsed tree-sitter syntax
//! trees. Checks are stateless capability values; per-language behavior is
//! dispatched on the detected language name.

mod checks;
pub(crate) mod language;
mod registry;

pub use checks::{EmptyHandler, FunctionLength, NestingDepth, ParamCount};
pub use language::{detect, language_tag, parse};
pub use registry::CheckRegistry;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One occurrence reported by an AST check (1-indexed, inclusive lines)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstMatch {
    pub start_line: u32,
    pub end_line: u32,
    pub message: String,
    /// Extra key/value detail carried into result properties
    pub extra: BTreeMap<String, String>,
}

/// Scalar configuration handed to a check from a rule's `ast_config` map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckConfig(BTreeMap<String, serde_yaml::Value>);

impl CheckConfig {
    pub fn new(values: BTreeMap<String, serde_yaml::Value>) -> Self {
        Self(values)
    }

    /// Read an integer parameter, falling back to the check's default
    pub fn get_u32(&self, key: &str, default: u32) -> u32 {
        self.0
            .get(key)
            .and_then(|value| value.as_u64())
            .map(|value| value as u32)
            .unwrap_or(default)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A named check that walks a parsed syntax tree
///
/// Checks are deterministic, stateless, and allocate no more than
/// O(tree size) auxiliary state. Unknown languages yield no matches.
pub trait AstCheck: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(
        &self,
        tree: &tree_sitter::Tree,
        source: &[u8],
        language: &str,
        config: &CheckConfig,
    ) -> Vec<AstMatch>;
}
