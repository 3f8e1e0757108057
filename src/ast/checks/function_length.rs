#![forbid(unsafe_code)]

//! Flags functions whose body spans more lines than the configured limit

use crate::ast::checks::{collect_kinds, end_line, function_kinds, function_name, start_line};
use crate::ast::{AstCheck, AstMatch, CheckConfig};
use std::collections::BTreeMap;

const DEFAULT_MAX_LINES: u32 = 50;

/// `function-length`: any function node longer than `max_lines` is flagged
pub struct FunctionLength;

impl AstCheck for FunctionLength {
    fn name(&self) -> &'static str {
        "function-length"
    }

    fn run(
        &self,
        tree: &tree_sitter::Tree,
        source: &[u8],
        language: &str,
        config: &CheckConfig,
    ) -> Vec<AstMatch> {
        let max_lines = config.get_u32("max_lines", DEFAULT_MAX_LINES);
        let kinds = function_kinds(language);
        if kinds.is_empty() {
            return vec![];
        }

        collect_kinds(tree.root_node(), kinds)
            .into_iter()
            .filter_map(|node| {
                let lines = end_line(node) - start_line(node) + 1;
                if lines <= max_lines {
                    return None;
                }
                let name = function_name(node, source);
                let mut extra = BTreeMap::new();
                extra.insert("function".to_string(), name.clone());
                extra.insert("lines".to_string(), lines.to_string());
                Some(AstMatch {
                    start_line: start_line(node),
                    end_line: end_line(node),
                    message: format!(
                        "function '{}' spans {} lines (limit {})",
                        name, lines, max_lines
                    ),
                    extra,
                })
            })
            .collect()
    }
}
