//! Error types for Gavel
//!
//! This module defines the error taxonomy used throughout Gavel, following
//! a hierarchical structure with specific error variants for each failure
//! category. A single artifact's failure in one tier never cancels other
//! artifacts or other tiers; the variants here mark where that boundary is.

use std::path::PathBuf;

/// Rule-configuration errors, fatal at load time
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A rule failed validation
    #[error("invalid rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },

    /// The same rule id appeared twice within one document
    #[error("duplicate rule id '{id}'")]
    DuplicateRuleId { id: String },

    /// A regex rule's pattern did not compile
    #[error("invalid regex in rule '{id}': {source}")]
    InvalidRegex {
        id: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// An AST rule names a check that is not in the registry
    #[error("rule '{id}' references unknown AST check '{check}'")]
    UnknownCheck { id: String, check: String },

    /// A rule document is not valid YAML
    #[error("failed to parse rule document {path}: {source}")]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A rule file or directory could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Policy load and evaluation errors, fatal to the evaluation call
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// A policy document is not valid YAML or fails validation
    #[error("failed to parse policy {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Evaluation against an assembled report failed
    #[error("policy evaluation failed: {0}")]
    Eval(String),

    /// A policy file or directory could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error type for Gavel
#[derive(Debug, thiserror::Error)]
pub enum GavelError {
    /// Rule configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Policy error
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Model client failure, recorded per (tier, artifact)
    #[error("model error: {0}")]
    Model(#[from] crate::producer::ModelError),

    /// Source parse failure
    #[error("parse error in {file}: {message}")]
    Parse { file: PathBuf, message: String },

    /// The analysis context was cancelled
    #[error("analysis cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GavelError {
    /// Whether this error is a cancellation rather than a failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, GavelError::Cancelled)
            || matches!(
                self,
                GavelError::Model(crate::producer::ModelError::Cancelled)
            )
    }
}
