#![forbid(unsafe_code)]

//! Built-in AST checks and their shared tree-walking helpers
//!
//! Each check dispatches per-language node-kind tables keyed by the detected
//! language name, so the same conceptual check produces consistent results
//! on equivalent code across languages.

mod empty_handler;
mod function_length;
mod nesting_depth;
mod param_count;

pub use empty_handler::EmptyHandler;
pub use function_length::FunctionLength;
pub use nesting_depth::NestingDepth;
pub use param_count::ParamCount;

use tree_sitter::Node;

/// Node kinds that define a function body, per language
pub(crate) fn function_kinds(language: &str) -> &'static [&'static str] {
    match language {
        "go" => &["function_declaration", "method_declaration", "func_literal"],
        "python" => &["function_definition"],
        // tree-sitter-javascript renamed `function` to `function_expression`;
        // keep both spellings so grammar upgrades stay quiet
        "javascript" | "typescript" => &[
            "function_declaration",
            "function_expression",
            "function",
            "generator_function_declaration",
            "arrow_function",
            "method_definition",
        ],
        "java" => &["method_declaration", "constructor_declaration"],
        "c" => &["function_definition"],
        "rust" => &["function_item"],
        _ => &[],
    }
}

/// Collect all nodes of the given kinds, in document order
pub(crate) fn collect_kinds<'t>(root: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if kinds.contains(&node.kind()) {
            found.push(node);
        }
        for i in (0..node.named_child_count()).rev() {
            if let Some(child) = node.named_child(i) {
                stack.push(child);
            }
        }
    }
    found.sort_by_key(|node| node.start_byte());
    found
}

/// Named children of a node, materialized to sidestep cursor lifetimes
pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    (0..node.named_child_count())
        .filter_map(|i| node.named_child(i))
        .collect()
}

pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or_default()
}

/// 1-indexed start line of a node
pub(crate) fn start_line(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// 1-indexed end line of a node
pub(crate) fn end_line(node: Node<'_>) -> u32 {
    node.end_position().row as u32 + 1
}

/// Best-effort function name; `<anonymous>` for unnamed function values
pub(crate) fn function_name(node: Node<'_>, source: &[u8]) -> String {
    if let Some(name) = node.child_by_field_name("name") {
        return node_text(name, source).to_string();
    }
    // C buries the identifier in a declarator chain
    let mut declarator = node.child_by_field_name("declarator");
    while let Some(current) = declarator {
        if current.kind() == "identifier" {
            return node_text(current, source).to_string();
        }
        declarator = current.child_by_field_name("declarator");
    }
    "<anonymous>".to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use tree_sitter::Tree;

    /// Parse a snippet for check tests, panicking on setup failure
    pub(crate) fn parse_fixture(content: &str, path: &str) -> Tree {
        let (tree, _) = crate::ast::language::parse(content, path)
            .unwrap_or_else(|| panic!("fixture for {path} failed to parse"));
        tree
    }
}
