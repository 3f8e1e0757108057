#![forbid(unsafe_code)]

//! Rule model and tiered loader

mod builtin;
mod loader;
mod model;

pub use builtin::load_builtin_rules;
pub use loader::RuleSet;
pub use model::{parse_document, serialize_document, Rule, RuleKind};
