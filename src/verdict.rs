#![forbid(unsafe_code)]

//! Verdict evaluation
//!
//! The evaluator turns an assembled report into a gating verdict. A default
//! policy is embedded at build time; a user-supplied policy directory
//! replaces it wholesale (never merges). Policy documents are small YAML
//! clause sets expressive enough for the default gate; see
//! `builtin-policies/default.yaml` for the shape.

use crate::error::PolicyError;
use crate::report::{Report, ReportResult};
use crate::types::Level;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

const DEFAULT_POLICY: &str = include_str!("../builtin-policies/default.yaml");

/// Gating decisions, from most to least permissive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Merge,
    Review,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Merge => "merge",
            Decision::Review => "review",
            Decision::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The final gating verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    pub reason: String,
    pub relevant_findings: Vec<ReportResult>,
}

/// A reject trigger: a result at this level, optionally above a confidence
/// threshold, forces rejection
#[derive(Debug, Clone, Deserialize)]
struct RejectClause {
    level: Level,
    #[serde(default)]
    confidence_above: Option<f64>,
}

impl RejectClause {
    fn matches(&self, result: &ReportResult) -> bool {
        result.level == self.level
            && self
                .confidence_above
                .map(|threshold| result.confidence() > threshold)
                .unwrap_or(true)
    }
}

/// Which result levels justify each non-merge decision
#[derive(Debug, Clone, Deserialize)]
struct RelevanceMap {
    #[serde(default = "RelevanceMap::default_reject")]
    reject: Vec<Level>,
    #[serde(default = "RelevanceMap::default_review")]
    review: Vec<Level>,
}

impl RelevanceMap {
    fn default_reject() -> Vec<Level> {
        vec![Level::Error]
    }

    fn default_review() -> Vec<Level> {
        vec![Level::Error, Level::Warning]
    }
}

impl Default for RelevanceMap {
    fn default() -> Self {
        Self {
            reject: Self::default_reject(),
            review: Self::default_review(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PolicyDoc {
    #[serde(default)]
    name: String,
    #[serde(default)]
    reject: Vec<RejectClause>,
    #[serde(default)]
    relevant: RelevanceMap,
}

#[derive(Debug, Deserialize)]
struct PolicyFile {
    policy: PolicyDoc,
}

/// Evaluates assembled reports against the loaded policy set
#[derive(Debug)]
pub struct VerdictEvaluator {
    policies: Vec<PolicyDoc>,
}

impl VerdictEvaluator {
    /// Evaluator carrying only the embedded default policy
    pub fn with_default_policy() -> Self {
        let file: PolicyFile =
            serde_yaml::from_str(DEFAULT_POLICY).expect("embedded default policy must parse");
        Self {
            policies: vec![file.policy],
        }
    }

    /// Load policies, replacing the default when the directory has documents
    ///
    /// # Errors
    ///
    /// Returns `PolicyError` when a present document cannot be read or
    /// parsed. An absent or empty directory falls back to the default.
    pub fn load(policy_dir: Option<&Path>) -> Result<Self, PolicyError> {
        let Some(dir) = policy_dir else {
            return Ok(Self::with_default_policy());
        };
        if !dir.exists() {
            debug!(dir = %dir.display(), "policy directory absent, using default policy");
            return Ok(Self::with_default_policy());
        }

        let entries = std::fs::read_dir(dir).map_err(|source| PolicyError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml")
                    })
            })
            .collect();
        paths.sort();

        let mut policies = Vec::new();
        for path in paths {
            let text = std::fs::read_to_string(&path).map_err(|source| PolicyError::Io {
                path: path.clone(),
                source,
            })?;
            let file: PolicyFile =
                serde_yaml::from_str(&text).map_err(|source| PolicyError::Parse {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), name = %file.policy.name, "loaded policy");
            policies.push(file.policy);
        }

        if policies.is_empty() {
            return Ok(Self::with_default_policy());
        }
        Ok(Self { policies })
    }

    /// Evaluate a report into a verdict
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::Eval` when the report carries no runs.
    pub fn evaluate(&self, report: &Report) -> Result<Verdict, PolicyError> {
        if report.runs.is_empty() {
            return Err(PolicyError::Eval("report contains no runs".to_string()));
        }
        let results: Vec<&ReportResult> = report
            .runs
            .iter()
            .flat_map(|run| run.results.iter())
            .collect();

        let rejected = results.iter().any(|result| {
            self.policies
                .iter()
                .flat_map(|policy| policy.reject.iter())
                .any(|clause| clause.matches(result))
        });

        let decision = if rejected {
            Decision::Reject
        } else if results.is_empty() {
            Decision::Merge
        } else {
            Decision::Review
        };

        let relevant_findings: Vec<ReportResult> = match decision {
            Decision::Merge => vec![],
            Decision::Reject => self.select_relevant(&results, |map| &map.reject),
            Decision::Review => self.select_relevant(&results, |map| &map.review),
        };

        Ok(Verdict {
            decision,
            reason: format!(
                "Decision: {} based on {} findings",
                decision,
                results.len()
            ),
            relevant_findings,
        })
    }

    fn select_relevant(
        &self,
        results: &[&ReportResult],
        levels: impl Fn(&RelevanceMap) -> &Vec<Level>,
    ) -> Vec<ReportResult> {
        results
            .iter()
            .filter(|result| {
                self.policies
                    .iter()
                    .any(|policy| levels(&policy.relevant).contains(&result.level))
            })
            .map(|result| (*result).clone())
            .collect()
    }
}

impl Default for VerdictEvaluator {
    fn default() -> Self {
        Self::with_default_policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Driver, Run, Text, Tool};
    use crate::types::{props, PropertyBag};

    fn report_with(results: Vec<ReportResult>) -> Report {
        Report {
            schema: crate::report::SCHEMA_URI.to_string(),
            version: crate::report::REPORT_VERSION.to_string(),
            runs: vec![Run {
                tool: Tool {
                    driver: Driver {
                        name: "gavel".to_string(),
                        version: "0.0.0".to_string(),
                        rules: vec![],
                    },
                },
                results,
                invocations: None,
                properties: PropertyBag::new(),
            }],
        }
    }

    fn result(level: Level, confidence: f64) -> ReportResult {
        let mut properties = PropertyBag::new();
        if let Some(number) = serde_json::Number::from_f64(confidence) {
            properties.insert(
                props::CONFIDENCE.to_string(),
                serde_json::Value::Number(number),
            );
        }
        ReportResult {
            rule_id: "R1".to_string(),
            level,
            message: Text {
                text: "finding".to_string(),
            },
            locations: vec![],
            properties,
        }
    }

    #[test]
    fn test_high_confidence_error_rejects() {
        let evaluator = VerdictEvaluator::with_default_policy();
        let verdict = evaluator
            .evaluate(&report_with(vec![result(Level::Error, 0.9)]))
            .unwrap();
        assert_eq!(verdict.decision, Decision::Reject);
        assert_eq!(verdict.relevant_findings.len(), 1);
        assert_eq!(verdict.reason, "Decision: reject based on 1 findings");
    }

    #[test]
    fn test_low_confidence_error_reviews() {
        let evaluator = VerdictEvaluator::with_default_policy();
        let verdict = evaluator
            .evaluate(&report_with(vec![result(Level::Error, 0.5)]))
            .unwrap();
        assert_eq!(verdict.decision, Decision::Review);
    }

    #[test]
    fn test_empty_report_merges() {
        let evaluator = VerdictEvaluator::with_default_policy();
        let verdict = evaluator.evaluate(&report_with(vec![])).unwrap();
        assert_eq!(verdict.decision, Decision::Merge);
        assert!(verdict.relevant_findings.is_empty());
    }

    #[test]
    fn test_review_selects_errors_and_warnings() {
        let evaluator = VerdictEvaluator::with_default_policy();
        let verdict = evaluator
            .evaluate(&report_with(vec![
                result(Level::Error, 0.5),
                result(Level::Warning, 0.9),
                result(Level::Note, 1.0),
            ]))
            .unwrap();
        assert_eq!(verdict.decision, Decision::Review);
        assert_eq!(verdict.relevant_findings.len(), 2);
    }

    #[test]
    fn test_reject_selects_errors_only() {
        let evaluator = VerdictEvaluator::with_default_policy();
        let verdict = evaluator
            .evaluate(&report_with(vec![
                result(Level::Error, 0.95),
                result(Level::Warning, 0.95),
            ]))
            .unwrap();
        assert_eq!(verdict.decision, Decision::Reject);
        assert_eq!(verdict.relevant_findings.len(), 1);
        assert_eq!(verdict.relevant_findings[0].level, Level::Error);
    }

    #[test]
    fn test_boundary_confidence_is_not_rejection() {
        // The threshold is strict: exactly 0.8 does not reject
        let evaluator = VerdictEvaluator::with_default_policy();
        let verdict = evaluator
            .evaluate(&report_with(vec![result(Level::Error, 0.8)]))
            .unwrap();
        assert_eq!(verdict.decision, Decision::Review);
    }

    #[test]
    fn test_custom_policy_replaces_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("strict.yaml"),
            r#"
policy:
  name: zero-tolerance
  reject:
    - level: warning
  relevant:
    reject: [error, warning]
    review: [error, warning, note]
"#,
        )
        .unwrap();

        let evaluator = VerdictEvaluator::load(Some(dir.path())).unwrap();
        let verdict = evaluator
            .evaluate(&report_with(vec![result(Level::Warning, 0.1)]))
            .unwrap();
        // The default policy would have said review; the custom one rejects
        assert_eq!(verdict.decision, Decision::Reject);
    }

    #[test]
    fn test_empty_policy_dir_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let evaluator = VerdictEvaluator::load(Some(dir.path())).unwrap();
        let verdict = evaluator
            .evaluate(&report_with(vec![result(Level::Error, 0.9)]))
            .unwrap();
        assert_eq!(verdict.decision, Decision::Reject);
    }

    #[test]
    fn test_malformed_policy_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "policy: [").unwrap();

        let err = VerdictEvaluator::load(Some(dir.path())).unwrap_err();
        assert!(matches!(err, PolicyError::Parse { path: reported, .. } if reported == path));
    }

    #[test]
    fn test_report_without_runs_is_eval_error() {
        let evaluator = VerdictEvaluator::with_default_policy();
        let report = Report {
            schema: String::new(),
            version: String::new(),
            runs: vec![],
        };
        assert!(matches!(
            evaluator.evaluate(&report),
            Err(PolicyError::Eval(_))
        ));
    }
}
