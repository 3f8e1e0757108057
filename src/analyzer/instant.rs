#![forbid(unsafe_code)]

//! Instant-tier execution: regex matching and AST checks
//!
//! The applicable rules are partitioned by kind. Regex rules fan out across
//! rayon; AST rules share a single parse of the artifact. A parse failure
//! (or an unknown extension) silently skips the AST rules while regex rules
//! still run.

use crate::ast::{language, CheckRegistry};
use crate::rules::{Rule, RuleKind, RuleSet};
use crate::types::{props, AnalysisResult, Artifact, Location, Tier};
use rayon::prelude::*;
use tracing::debug;

/// Run every applicable regex and AST rule against one artifact
pub(crate) fn run_instant(
    rules: &RuleSet,
    registry: &CheckRegistry,
    artifact: &Artifact,
) -> Vec<AnalysisResult> {
    let tag = language::language_tag(&artifact.path);
    let (ast_rules, regex_rules): (Vec<&Rule>, Vec<&Rule>) = rules
        .iter()
        .filter(|rule| rule.applies_to(tag))
        .partition(|rule| rule.is_ast());

    let mut results: Vec<AnalysisResult> = regex_rules
        .par_iter()
        .flat_map(|rule| run_regex_rule(rule, artifact))
        .collect();

    if !ast_rules.is_empty() && tag.is_some() {
        match language::parse(&artifact.content, &artifact.path) {
            Some((tree, language_name)) => {
                for rule in ast_rules {
                    results.extend(run_ast_rule(rule, registry, &tree, artifact, language_name));
                }
            }
            None => {
                debug!(path = %artifact.path, "no parse available, skipping AST rules");
            }
        }
    }

    results
}

fn run_regex_rule(rule: &Rule, artifact: &Artifact) -> Vec<AnalysisResult> {
    let RuleKind::Regex { pattern } = &rule.kind else {
        return vec![];
    };

    pattern
        .find_iter(&artifact.content)
        .map(|found| {
            let start_line = line_at(&artifact.content, found.start());
            let end_offset = if found.end() > found.start() {
                found.end() - 1
            } else {
                found.start()
            };
            let end_line = line_at(&artifact.content, end_offset);
            AnalysisResult {
                rule_id: rule.id.clone(),
                level: rule.level,
                message: rule.message.clone(),
                locations: vec![Location::new(&artifact.path, start_line, end_line)],
                properties: rule.result_properties(Tier::Instant),
            }
        })
        .collect()
}

fn run_ast_rule(
    rule: &Rule,
    registry: &CheckRegistry,
    tree: &tree_sitter::Tree,
    artifact: &Artifact,
    language_name: &str,
) -> Vec<AnalysisResult> {
    let RuleKind::Ast { check, config } = &rule.kind else {
        return vec![];
    };
    let Some(check) = registry.get(check) else {
        return vec![];
    };

    check
        .run(tree, artifact.content.as_bytes(), language_name, config)
        .into_iter()
        .map(|found| {
            let mut properties = rule.result_properties(Tier::Instant);
            properties.insert(
                props::RULE_TYPE.to_string(),
                serde_json::Value::String("ast".to_string()),
            );
            for (key, value) in found.extra {
                properties.insert(
                    format!("{}{}", props::PREFIX, key),
                    serde_json::Value::String(value),
                );
            }
            let message = if found.message.is_empty() {
                rule.message.clone()
            } else {
                found.message
            };
            AnalysisResult {
                rule_id: rule.id.clone(),
                level: rule.level,
                message,
                locations: vec![Location::new(&artifact.path, found.start_line, found.end_line)],
                properties,
            }
        })
        .collect()
}

/// 1-indexed line containing the byte at `offset`
fn line_at(content: &str, offset: usize) -> u32 {
    let offset = offset.min(content.len());
    content[..offset].bytes().filter(|byte| *byte == b'\n').count() as u32 + 1
}
