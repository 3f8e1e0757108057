#![forbid(unsafe_code)]

//! Registry of named AST checks
//!
//! The registry maps check names to check capabilities. It is built once at
//! startup, optionally extended with caller-supplied checks, and immutable
//! after initialization (the analyzer holds it behind an `Arc`).

use crate::ast::checks::{EmptyHandler, FunctionLength, NestingDepth, ParamCount};
use crate::ast::AstCheck;
use std::collections::HashMap;
use std::sync::Arc;

/// Map from check name to check object
pub struct CheckRegistry {
    checks: HashMap<&'static str, Arc<dyn AstCheck>>,
}

impl CheckRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            checks: HashMap::new(),
        }
    }

    /// Create a registry pre-registered with the built-in checks
    pub fn with_builtin_checks() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FunctionLength));
        registry.register(Arc::new(NestingDepth));
        registry.register(Arc::new(EmptyHandler));
        registry.register(Arc::new(ParamCount));
        registry
    }

    /// Register a check under its own name, replacing any previous holder
    pub fn register(&mut self, check: Arc<dyn AstCheck>) {
        self.checks.insert(check.name(), check);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AstCheck>> {
        self.checks.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Registered check names, sorted for stable output
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.checks.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::with_builtin_checks()
    }
}
