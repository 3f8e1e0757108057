#![forbid(unsafe_code)]

//! Flags functions that take more parameters than the configured limit

use crate::ast::checks::{
    collect_kinds, end_line, function_kinds, function_name, named_children, node_text, start_line,
};
use crate::ast::{AstCheck, AstMatch, CheckConfig};
use std::collections::BTreeMap;
use tree_sitter::Node;

const DEFAULT_MAX_PARAMS: u32 = 5;

/// `param-count`: counts declared parameters per function
///
/// Go grouped declarations are expanded (`a, b, c int` counts as three);
/// unnamed parameter declarations count as one.
pub struct ParamCount;

impl AstCheck for ParamCount {
    fn name(&self) -> &'static str {
        "param-count"
    }

    fn run(
        &self,
        tree: &tree_sitter::Tree,
        source: &[u8],
        language: &str,
        config: &CheckConfig,
    ) -> Vec<AstMatch> {
        let max_params = config.get_u32("max_params", DEFAULT_MAX_PARAMS);
        let kinds = function_kinds(language);
        if kinds.is_empty() {
            return vec![];
        }

        collect_kinds(tree.root_node(), kinds)
            .into_iter()
            .filter_map(|node| {
                let count = count_params(node, source, language)?;
                if count <= max_params {
                    return None;
                }
                let name = function_name(node, source);
                let mut extra = BTreeMap::new();
                extra.insert("function".to_string(), name.clone());
                extra.insert("parameters".to_string(), count.to_string());
                Some(AstMatch {
                    start_line: start_line(node),
                    end_line: end_line(node),
                    message: format!(
                        "function '{}' takes {} parameters (limit {})",
                        name, count, max_params
                    ),
                    extra,
                })
            })
            .collect()
    }
}

/// Count declared parameters for one function node, `None` when the node
/// has no parameter container (e.g. TypeScript overload signatures)
fn count_params(node: Node<'_>, source: &[u8], language: &str) -> Option<u32> {
    match language {
        "go" => {
            let params = node.child_by_field_name("parameters")?;
            Some(
                named_children(params)
                    .into_iter()
                    .map(|declaration| expanded_go_names(declaration))
                    .sum(),
            )
        }
        "c" => {
            let params = c_parameter_list(node)?;
            let declarations = named_children(params);
            // `f(void)` declares zero parameters
            if declarations.len() == 1 && node_text(declarations[0], source).trim() == "void" {
                return Some(0);
            }
            Some(declarations.len() as u32)
        }
        "javascript" | "typescript" => {
            if let Some(params) = node.child_by_field_name("parameters") {
                Some(named_children(params).len() as u32)
            } else {
                // Single-identifier arrow function: `x => ...`
                node.child_by_field_name("parameter").map(|_| 1)
            }
        }
        "rust" => {
            let params = node.child_by_field_name("parameters")?;
            Some(
                named_children(params)
                    .into_iter()
                    .filter(|child| matches!(child.kind(), "parameter" | "variadic_parameter"))
                    .count() as u32,
            )
        }
        "python" | "java" => {
            let params = node.child_by_field_name("parameters")?;
            Some(named_children(params).len() as u32)
        }
        _ => None,
    }
}

/// Walk a C declarator chain down to the function declarator's parameter list
fn c_parameter_list(node: Node<'_>) -> Option<Node<'_>> {
    let mut declarator = node.child_by_field_name("declarator");
    while let Some(current) = declarator {
        if current.kind() == "function_declarator" {
            return current.child_by_field_name("parameters");
        }
        declarator = current.child_by_field_name("declarator");
    }
    None
}

/// A Go `parameter_declaration` contributes one parameter per declared
/// name, or one when unnamed
fn expanded_go_names(declaration: Node<'_>) -> u32 {
    let mut cursor = declaration.walk();
    let names = declaration
        .children_by_field_name("name", &mut cursor)
        .count() as u32;
    names.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::checks::test_support::parse_fixture;

    #[cfg(feature = "lang-go")]
    #[test]
    fn test_go_grouped_parameters_are_expanded() {
        let content = "package main\n\nfunc f(a, b, c int, d, e string, g bool) {}\n";
        let tree = parse_fixture(content, "main.go");
        let matches = ParamCount.run(&tree, content.as_bytes(), "go", &CheckConfig::default());

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].extra.get("parameters").unwrap(), "6");
    }

    #[cfg(feature = "lang-go")]
    #[test]
    fn test_go_unnamed_parameters_count_as_one_each() {
        let content = "package main\n\nfunc f(int, string, bool, error, byte) {}\n";
        let tree = parse_fixture(content, "main.go");
        let matches = ParamCount.run(&tree, content.as_bytes(), "go", &CheckConfig::default());
        // Five parameters is exactly the limit
        assert!(matches.is_empty());
    }

    #[cfg(feature = "lang-go")]
    #[test]
    fn test_go_at_limit_passes() {
        let content = "package main\n\nfunc f(a, b int, c, d string, e bool) {}\n";
        let tree = parse_fixture(content, "main.go");
        let matches = ParamCount.run(&tree, content.as_bytes(), "go", &CheckConfig::default());
        assert!(matches.is_empty());
    }

    #[cfg(feature = "lang-python")]
    #[test]
    fn test_python_param_count() {
        let content = "def f(a, b, c, d, e, g):\n    return a\n";
        let tree = parse_fixture(content, "app.py");
        let matches = ParamCount.run(&tree, content.as_bytes(), "python", &CheckConfig::default());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].extra.get("function").unwrap(), "f");
    }

    #[cfg(feature = "lang-java")]
    #[test]
    fn test_java_param_count_configurable() {
        let content = r#"class App {
    int add(int a, int b, int c) {
        return a + b + c;
    }
}
"#;
        let tree = parse_fixture(content, "App.java");
        let config: CheckConfig = serde_yaml::from_str("max_params: 2").unwrap();
        let matches = ParamCount.run(&tree, content.as_bytes(), "java", &config);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].extra.get("parameters").unwrap(), "3");
    }

    #[cfg(feature = "lang-c")]
    #[test]
    fn test_c_void_parameter_list_is_zero() {
        let content = "int f(void) {\n    return 0;\n}\n";
        let tree = parse_fixture(content, "f.c");
        let config: CheckConfig = serde_yaml::from_str("max_params: 0").unwrap();
        let matches = ParamCount.run(&tree, content.as_bytes(), "c", &config);
        assert!(matches.is_empty());
    }

    #[cfg(feature = "lang-c")]
    #[test]
    fn test_c_param_count() {
        let content = "int f(int a, int b, int c, int d, int e, int g) {\n    return a;\n}\n";
        let tree = parse_fixture(content, "f.c");
        let matches = ParamCount.run(&tree, content.as_bytes(), "c", &CheckConfig::default());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].extra.get("function").unwrap(), "f");
    }

    #[cfg(feature = "lang-rust")]
    #[test]
    fn test_rust_self_parameter_not_counted() {
        let content = r#"struct S;

impl S {
    fn f(&self, a: u32, b: u32, c: u32, d: u32, e: u32) -> u32 {
        a + b + c + d + e
    }
}
"#;
        let tree = parse_fixture(content, "lib.rs");
        let matches = ParamCount.run(&tree, content.as_bytes(), "rust", &CheckConfig::default());
        assert!(matches.is_empty());
    }
}
