#![forbid(unsafe_code)]

//! Built-in default rules embedded at compile time
//!
//! The documents under `builtin-rules/` are compiled into the binary with
//! `include_str!` so the engine is self-contained. They form the lowest
//! override tier; user and project rule directories replace them by id.

use crate::ast::CheckRegistry;
use crate::error::ConfigError;
use crate::rules::model::{parse_document, Rule};

/// Embedded default rule documents
const BUILTIN_RULE_DOCUMENTS: &[(&str, &str)] = &[
    ("security", include_str!("../../builtin-rules/security.yaml")),
    ("structure", include_str!("../../builtin-rules/structure.yaml")),
];

/// Parse every embedded default document
///
/// # Errors
///
/// Returns `ConfigError` if an embedded document fails to parse; that is a
/// packaging defect, not a runtime condition.
pub fn load_builtin_rules(registry: &CheckRegistry) -> Result<Vec<Rule>, ConfigError> {
    let mut rules = Vec::new();
    for (_, text) in BUILTIN_RULE_DOCUMENTS {
        rules.extend(parse_document(text, registry)?);
    }
    Ok(rules)
}
