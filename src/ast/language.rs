#![forbid(unsafe_code)]

//! Language detection and tree-sitter grammar resolution
//!
//! Extensions are matched case-insensitively. [`language_tag`] is total over
//! the extension table regardless of compiled-in grammars, so rules can be
//! scoped by language even when a grammar feature is disabled; [`detect`]
//! additionally resolves a grammar and returns `None` when the language was
//! not compiled in, which callers treat the same as an unknown extension.

use std::path::Path;

/// Language tags understood by the rule model, in registry order
pub const LANGUAGE_TAGS: &[&str] = &[
    "go",
    "python",
    "javascript",
    "typescript",
    "java",
    "c",
    "rust",
];

/// Map a path's extension to a language tag
pub fn language_tag(path: &str) -> Option<&'static str> {
    let ext = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())?
        .to_ascii_lowercase();
    match ext.as_str() {
        "go" => Some("go"),
        "py" | "pyi" => Some("python"),
        "js" | "jsx" | "mjs" | "cjs" => Some("javascript"),
        "ts" | "tsx" | "mts" | "cts" => Some("typescript"),
        "java" => Some("java"),
        "c" | "h" => Some("c"),
        "rs" => Some("rust"),
        _ => None,
    }
}

/// Detect the language of a path, resolving its grammar
///
/// Returns `(grammar, language_name)`; a miss means either an unknown
/// extension or a grammar that was not compiled in.
pub fn detect(path: &str) -> Option<(tree_sitter::Language, &'static str)> {
    let tag = language_tag(path)?;
    let grammar = match tag {
        #[cfg(feature = "lang-go")]
        "go" => tree_sitter_go::language(),
        #[cfg(feature = "lang-python")]
        "python" => tree_sitter_python::language(),
        #[cfg(feature = "lang-javascript")]
        "javascript" => tree_sitter_javascript::language(),
        #[cfg(feature = "lang-typescript")]
        "typescript" => {
            if Path::new(path)
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("tsx"))
            {
                tree_sitter_typescript::language_tsx()
            } else {
                tree_sitter_typescript::language_typescript()
            }
        }
        #[cfg(feature = "lang-java")]
        "java" => tree_sitter_java::language(),
        #[cfg(feature = "lang-c")]
        "c" => tree_sitter_c::language(),
        #[cfg(feature = "lang-rust")]
        "rust" => tree_sitter_rust::language(),
        _ => return None,
    };
    Some((grammar, tag))
}

/// Parse one artifact's content, returning `None` on any parse failure
///
/// A failed parse skips AST rules for the artifact; regex rules still run.
pub fn parse(content: &str, path: &str) -> Option<(tree_sitter::Tree, &'static str)> {
    let (grammar, tag) = detect(path)?;
    let mut parser = tree_sitter::Parser::new();
    if parser.set_language(&grammar).is_err() {
        tracing::warn!(path, language = tag, "grammar rejected by parser");
        return None;
    }
    let tree = parser.parse(content, None)?;
    Some((tree, tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tag_known_extensions() {
        assert_eq!(language_tag("main.go"), Some("go"));
        assert_eq!(language_tag("lib/app.py"), Some("python"));
        assert_eq!(language_tag("ui/App.tsx"), Some("typescript"));
        assert_eq!(language_tag("ui/app.jsx"), Some("javascript"));
        assert_eq!(language_tag("Main.java"), Some("java"));
        assert_eq!(language_tag("src/alloc.c"), Some("c"));
        assert_eq!(language_tag("src/lib.rs"), Some("rust"));
    }

    #[test]
    fn test_language_tag_is_case_insensitive() {
        assert_eq!(language_tag("MAIN.GO"), Some("go"));
        assert_eq!(language_tag("App.TSX"), Some("typescript"));
    }

    #[test]
    fn test_language_tag_unknown_extension() {
        assert_eq!(language_tag("notes.txt"), None);
        assert_eq!(language_tag("Makefile"), None);
        assert_eq!(language_tag(""), None);
    }

    #[cfg(feature = "lang-go")]
    #[test]
    fn test_detect_resolves_grammar() {
        let (_, tag) = detect("cmd/server.go").unwrap();
        assert_eq!(tag, "go");
    }

    #[cfg(feature = "lang-python")]
    #[test]
    fn test_parse_produces_tree() {
        let (tree, tag) = parse("def f():\n    return 1\n", "app.py").unwrap();
        assert_eq!(tag, "python");
        assert_eq!(tree.root_node().kind(), "module");
    }

    #[test]
    fn test_parse_unknown_extension_is_none() {
        assert!(parse("hello", "README.md").is_none());
    }
}
