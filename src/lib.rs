#![forbid(unsafe_code)]

//! Gavel: policy-driven code review engine
//!
//! Gavel ingests source artifacts, runs them through a tiered analysis
//! pipeline (regex and AST checks instantly, then optional fast-model and
//! comprehensive-model inference), normalizes findings into a standardized
//! report, and evaluates that report into a `merge` / `review` / `reject`
//! verdict.

pub mod analyzer;
pub mod ast;
pub mod cache;
pub mod error;
pub mod input;
pub mod producer;
pub mod report;
pub mod rules;
pub mod types;
pub mod verdict;

// Re-export the main surface for convenient access
pub use analyzer::{AnalyzerConfig, TierResult, TieredAnalyzer};
pub use error::{ConfigError, GavelError, PolicyError};
pub use producer::{CancellationToken, FindingProducer, ModelError};
pub use report::{assemble_report, Report, RunMetadata};
pub use rules::RuleSet;
pub use types::{AnalysisResult, Artifact, Finding, Level, Tier};
pub use verdict::{Decision, Verdict, VerdictEvaluator};
