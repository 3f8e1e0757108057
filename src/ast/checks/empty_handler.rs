#![forbid(unsafe_code)]

//! Flags error/exception handlers with no handling code

use crate::ast::checks::{collect_kinds, end_line, named_children, node_text, start_line};
use crate::ast::{AstCheck, AstMatch, CheckConfig};
use std::collections::BTreeMap;
use tree_sitter::Node;

/// `empty-handler`: language-specific detection of swallowed errors
///
/// Go: `if err != nil { }` with an empty consequence. Python: an `except:`
/// whose body contains only `pass`. JavaScript, TypeScript, Java: a `catch`
/// with an empty body.
pub struct EmptyHandler;

impl AstCheck for EmptyHandler {
    fn name(&self) -> &'static str {
        "empty-handler"
    }

    fn run(
        &self,
        tree: &tree_sitter::Tree,
        source: &[u8],
        language: &str,
        _config: &CheckConfig,
    ) -> Vec<AstMatch> {
        match language {
            "go" => run_go(tree.root_node(), source),
            "python" => run_python(tree.root_node()),
            "javascript" | "typescript" | "java" => run_catch(tree.root_node()),
            _ => vec![],
        }
    }
}

fn handler_match(node: Node<'_>, message: &str, handler: &str) -> AstMatch {
    let mut extra = BTreeMap::new();
    extra.insert("handler".to_string(), handler.to_string());
    AstMatch {
        start_line: start_line(node),
        end_line: end_line(node),
        message: message.to_string(),
        extra,
    }
}

fn run_go(root: Node<'_>, source: &[u8]) -> Vec<AstMatch> {
    collect_kinds(root, &["if_statement"])
        .into_iter()
        .filter(|node| {
            let condition_is_err_check = node
                .child_by_field_name("condition")
                .map(|condition| {
                    let text = node_text(condition, source);
                    text.split_whitespace().collect::<Vec<_>>().join(" ") == "err != nil"
                })
                .unwrap_or(false);
            let consequence_is_empty = node
                .child_by_field_name("consequence")
                .map(|block| block.named_child_count() == 0)
                .unwrap_or(false);
            condition_is_err_check && consequence_is_empty
        })
        .map(|node| handler_match(node, "error checked but not handled", "if-err"))
        .collect()
}

fn run_python(root: Node<'_>) -> Vec<AstMatch> {
    collect_kinds(root, &["except_clause"])
        .into_iter()
        .filter(|node| {
            named_children(*node)
                .into_iter()
                .rev()
                .find(|child| child.kind() == "block")
                .map(|body| {
                    body.named_child_count() == 1
                        && body
                            .named_child(0)
                            .is_some_and(|only| only.kind() == "pass_statement")
                })
                .unwrap_or(false)
        })
        .map(|node| handler_match(node, "exception handler contains only pass", "except"))
        .collect()
}

fn run_catch(root: Node<'_>) -> Vec<AstMatch> {
    collect_kinds(root, &["catch_clause"])
        .into_iter()
        .filter(|node| {
            node.child_by_field_name("body")
                .map(|body| body.named_child_count() == 0)
                .unwrap_or(false)
        })
        .map(|node| handler_match(node, "empty catch block", "catch"))
        .collect()
}
