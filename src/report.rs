#![forbid(unsafe_code)]

//! Standardized report assembly
//!
//! Findings are normalized into a SARIF-2.1.0-shaped document: one run with
//! a tool driver, the rule descriptors of the effective rule set, the
//! results, and run-level properties (persona, input scope). Enriched
//! serialization concerns (fingerprints, security severity) live with
//! downstream serializers, not here.

use crate::rules::RuleSet;
use crate::types::{AnalysisResult, Level, PropertyBag, props};
use serde::{Deserialize, Serialize};

pub const SCHEMA_URI: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
pub const REPORT_VERSION: &str = "2.1.0";

const DRIVER_NAME: &str = "gavel";

/// Assembled static-analysis report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub tool: Tool,
    pub results: Vec<ReportResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocations: Option<Vec<Invocation>>,
    #[serde(default, skip_serializing_if = "PropertyBag::is_empty")]
    pub properties: PropertyBag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub driver: Driver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub name: String,
    pub version: String,
    pub rules: Vec<RuleDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDescriptor {
    pub id: String,
    #[serde(rename = "shortDescription")]
    pub short_description: Text,
    #[serde(rename = "defaultConfiguration")]
    pub default_configuration: DefaultConfiguration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultConfiguration {
    pub level: Level,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(rename = "executionSuccessful")]
    pub execution_successful: bool,
    #[serde(default, skip_serializing_if = "PropertyBag::is_empty")]
    pub properties: PropertyBag,
}

/// One normalized result in report form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResult {
    #[serde(rename = "ruleId")]
    pub rule_id: String,
    pub level: Level,
    pub message: Text,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ReportLocation>,
    #[serde(default, skip_serializing_if = "PropertyBag::is_empty")]
    pub properties: PropertyBag,
}

impl ReportResult {
    /// Confidence recovered from the `gavel/confidence` property, 0.0 if absent
    pub fn confidence(&self) -> f64 {
        self.properties
            .get(props::CONFIDENCE)
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportLocation {
    #[serde(rename = "physicalLocation")]
    pub physical_location: PhysicalLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalLocation {
    #[serde(rename = "artifactLocation")]
    pub artifact_location: ArtifactLocation,
    pub region: ReportRegion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRegion {
    #[serde(rename = "startLine")]
    pub start_line: u32,
    #[serde(rename = "endLine")]
    pub end_line: u32,
}

impl From<&AnalysisResult> for ReportResult {
    fn from(result: &AnalysisResult) -> Self {
        ReportResult {
            rule_id: result.rule_id.clone(),
            level: result.level,
            message: Text {
                text: result.message.clone(),
            },
            locations: result
                .locations
                .iter()
                .map(|location| ReportLocation {
                    physical_location: PhysicalLocation {
                        artifact_location: ArtifactLocation {
                            uri: location.uri.clone(),
                        },
                        region: ReportRegion {
                            start_line: location.region.start_line,
                            end_line: location.region.end_line,
                        },
                    },
                })
                .collect(),
            properties: result.properties.clone(),
        }
    }
}

/// Run-level context recorded on the assembled report
#[derive(Debug, Clone, Default)]
pub struct RunMetadata {
    pub persona: String,
    pub input_scope: String,
}

/// Assemble normalized results into a report
///
/// Rule descriptors are materialized for every rule in the effective set so
/// report consumers can resolve `ruleId` references without the rule files.
pub fn assemble_report(
    results: &[AnalysisResult],
    rules: &RuleSet,
    metadata: &RunMetadata,
) -> Report {
    let descriptors = rules
        .iter()
        .map(|rule| RuleDescriptor {
            id: rule.id.clone(),
            short_description: Text {
                text: rule.name.clone(),
            },
            default_configuration: DefaultConfiguration { level: rule.level },
        })
        .collect();

    let mut properties = PropertyBag::new();
    if !metadata.persona.is_empty() {
        properties.insert(
            props::PERSONA.to_string(),
            serde_json::Value::String(metadata.persona.clone()),
        );
    }
    if !metadata.input_scope.is_empty() {
        properties.insert(
            props::INPUT_SCOPE.to_string(),
            serde_json::Value::String(metadata.input_scope.clone()),
        );
    }

    Report {
        schema: SCHEMA_URI.to_string(),
        version: REPORT_VERSION.to_string(),
        runs: vec![Run {
            tool: Tool {
                driver: Driver {
                    name: DRIVER_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    rules: descriptors,
                },
            },
            results: results.iter().map(ReportResult::from).collect(),
            invocations: None,
            properties,
        }],
    }
}
