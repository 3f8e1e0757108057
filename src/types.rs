#![forbid(unsafe_code)]

//! Core domain types for Gavel
//!
//! This module defines the fundamental types shared across the analysis
//! pipeline: severity levels, artifacts, findings, and normalized results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Property bag attached to results and findings
///
/// Keys are namespaced under `gavel/`; see [`props`] for the well-known keys.
pub type PropertyBag = BTreeMap<String, serde_json::Value>;

/// Well-known property keys used throughout the pipeline
pub mod props {
    pub const TIER: &str = "gavel/tier";
    pub const CONFIDENCE: &str = "gavel/confidence";
    pub const EXPLANATION: &str = "gavel/explanation";
    pub const REMEDIATION: &str = "gavel/remediation";
    pub const RULE_SOURCE: &str = "gavel/rule-source";
    pub const RULE_TYPE: &str = "gavel/rule-type";
    pub const CWE: &str = "gavel/cwe";
    pub const OWASP: &str = "gavel/owasp";
    pub const REFERENCES: &str = "gavel/references";
    pub const PERSONA: &str = "gavel/persona";
    pub const INPUT_SCOPE: &str = "gavel/input-scope";

    /// Prefix applied to extra keys carried out of AST matches
    pub const PREFIX: &str = "gavel/";
}

/// Result severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
    Note,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Security,
    Reliability,
    Maintainability,
}

/// Provenance of a rule definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleSource {
    #[serde(rename = "CWE")]
    Cwe,
    #[serde(rename = "OWASP")]
    Owasp,
    #[serde(rename = "SonarQube")]
    SonarQube,
    Custom,
}

impl RuleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleSource::Cwe => "CWE",
            RuleSource::Owasp => "OWASP",
            RuleSource::SonarQube => "SonarQube",
            RuleSource::Custom => "Custom",
        }
    }
}

/// Analysis tiers, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Instant,
    Fast,
    Comprehensive,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Instant => "instant",
            Tier::Fast => "fast",
            Tier::Comprehensive => "comprehensive",
        }
    }

    /// Deduplication priority; higher wins on key collisions
    pub fn priority(&self) -> u8 {
        match self {
            Tier::Instant => 1,
            Tier::Fast => 2,
            Tier::Comprehensive => 3,
        }
    }

    /// Parse a tier tag back out of a `gavel/tier` property value
    pub fn from_tag(tag: &str) -> Option<Tier> {
        match tag {
            "instant" => Some(Tier::Instant),
            "fast" => Some(Tier::Fast),
            "comprehensive" => Some(Tier::Comprehensive),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an artifact is a whole file or a diff block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    File,
    Diff,
}

/// One source-text unit presented to the analyzer
///
/// Content is UTF-8 text; the input layer skips anything that is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub content: String,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            kind: ArtifactKind::File,
        }
    }

    pub fn diff(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            kind: ArtifactKind::Diff,
        }
    }
}

/// A line region within an artifact (1-indexed, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub start_line: u32,
    pub end_line: u32,
}

/// A located occurrence of a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    pub region: Region,
}

impl Location {
    pub fn new(uri: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        Self {
            uri: uri.into(),
            region: Region {
                start_line,
                end_line,
            },
        }
    }
}

/// A normalized, location-bearing analysis result
///
/// This is the report-level shape: findings from any tier are flattened into
/// this form before deduplication, report assembly, and verdict evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub rule_id: String,
    pub level: Level,
    pub message: String,
    pub locations: Vec<Location>,
    #[serde(default)]
    pub properties: PropertyBag,
}

impl AnalysisResult {
    /// The first location, if the result carries any
    pub fn primary_location(&self) -> Option<&Location> {
        self.locations.first()
    }

    /// Tier recovered from the `gavel/tier` property
    pub fn tier(&self) -> Option<Tier> {
        self.properties
            .get(props::TIER)
            .and_then(|v| v.as_str())
            .and_then(Tier::from_tag)
    }

    /// Confidence recovered from the `gavel/confidence` property, 0.0 if absent
    pub fn confidence(&self) -> f64 {
        self.properties
            .get(props::CONFIDENCE)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }
}

/// The raw report of a detected issue, before normalization into a
/// location-bearing [`AnalysisResult`]
///
/// Model clients produce findings in this shape; the analyzer converts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub level: Level,
    pub message: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub properties: PropertyBag,
}

impl Finding {
    /// Normalize into an [`AnalysisResult`] tagged with the producing tier
    pub fn into_result(self, tier: Tier) -> AnalysisResult {
        let mut properties = self.properties;
        properties.insert(
            props::TIER.to_string(),
            serde_json::Value::String(tier.as_str().to_string()),
        );
        properties.insert(
            props::EXPLANATION.to_string(),
            serde_json::Value::String(self.explanation.unwrap_or_default()),
        );
        if let Some(confidence) = serde_json::Number::from_f64(self.confidence) {
            properties.insert(
                props::CONFIDENCE.to_string(),
                serde_json::Value::Number(confidence),
            );
        }
        if let Some(recommendation) = self.recommendation {
            properties.insert(
                props::REMEDIATION.to_string(),
                serde_json::Value::String(recommendation),
            );
        }

        AnalysisResult {
            rule_id: self.rule_id,
            level: self.level,
            message: self.message,
            locations: vec![Location::new(
                self.file_path,
                self.start_line,
                self.end_line,
            )],
            properties,
        }
    }
}
