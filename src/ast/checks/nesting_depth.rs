#![forbid(unsafe_code)]

//! Flags control flow nested deeper than the configured limit

use crate::ast::checks::{end_line, named_children, start_line};
use crate::ast::{AstCheck, AstMatch, CheckConfig};
use std::collections::BTreeMap;
use tree_sitter::Node;

const DEFAULT_MAX_DEPTH: u32 = 4;

/// Node kinds that carry a nesting level, per language
fn nesting_kinds(language: &str) -> &'static [&'static str] {
    match language {
        "go" => &[
            "if_statement",
            "for_statement",
            "expression_switch_statement",
            "type_switch_statement",
            "select_statement",
        ],
        "python" => &[
            "if_statement",
            "for_statement",
            "while_statement",
            "match_statement",
        ],
        "javascript" | "typescript" => &[
            "if_statement",
            "for_statement",
            "for_in_statement",
            "while_statement",
            "do_statement",
            "switch_statement",
        ],
        "java" => &[
            "if_statement",
            "for_statement",
            "enhanced_for_statement",
            "while_statement",
            "do_statement",
            "switch_expression",
        ],
        _ => &[],
    }
}

/// `nesting-depth`: depth-first search incrementing on nesting carriers;
/// the first violation in a branch is reported and its subtree not entered
pub struct NestingDepth;

impl AstCheck for NestingDepth {
    fn name(&self) -> &'static str {
        "nesting-depth"
    }

    fn run(
        &self,
        tree: &tree_sitter::Tree,
        _source: &[u8],
        language: &str,
        config: &CheckConfig,
    ) -> Vec<AstMatch> {
        let max_depth = config.get_u32("max_depth", DEFAULT_MAX_DEPTH);
        let kinds = nesting_kinds(language);
        if kinds.is_empty() {
            return vec![];
        }

        let mut matches = Vec::new();
        descend(tree.root_node(), 0, max_depth, kinds, &mut matches);
        matches
    }
}

fn descend(
    node: Node<'_>,
    depth: u32,
    max_depth: u32,
    kinds: &[&str],
    matches: &mut Vec<AstMatch>,
) {
    for child in named_children(node) {
        if kinds.contains(&child.kind()) {
            let child_depth = depth + 1;
            if child_depth > max_depth {
                let mut extra = BTreeMap::new();
                extra.insert("depth".to_string(), child_depth.to_string());
                matches.push(AstMatch {
                    start_line: start_line(child),
                    end_line: end_line(child),
                    message: format!(
                        "nesting depth {} exceeds limit {}",
                        child_depth, max_depth
                    ),
                    extra,
                });
                // Deeper violations inside this subtree are implied
                continue;
            }
            descend(child, child_depth, max_depth, kinds, matches);
        } else {
            descend(child, depth, max_depth, kinds, matches);
        }
    }
}
