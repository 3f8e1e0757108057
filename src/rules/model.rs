#![forbid(unsafe_code)]

//! Typed rule records and YAML document parsing
//!
//! A rule is polymorphic over exactly two kinds: a compiled regex pattern or
//! a named AST check with scalar parameters. Validation happens at
//! construction; consumers match on the kind tag and never see a
//! half-validated rule.

use crate::ast::{language, CheckConfig, CheckRegistry};
use crate::error::ConfigError;
use crate::types::{Category, Level, PropertyBag, RuleSource, Tier, props};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The two rule kinds
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Pattern matched against full artifact text, compiled multi-line
    Regex { pattern: Regex },
    /// Named check resolved in the AST check registry
    Ast { check: String, config: CheckConfig },
}

/// A validated review rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub source: RuleSource,
    /// Language tags this rule applies to; empty applies to all
    pub languages: Vec<String>,
    pub level: Level,
    pub confidence: f64,
    pub message: String,
    pub explanation: Option<String>,
    pub remediation: Option<String>,
    pub cwe: Vec<String>,
    pub owasp: Vec<String>,
    pub references: Vec<String>,
    pub kind: RuleKind,
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        let kinds_equal = match (&self.kind, &other.kind) {
            (RuleKind::Regex { pattern: a }, RuleKind::Regex { pattern: b }) => {
                a.as_str() == b.as_str()
            }
            (
                RuleKind::Ast {
                    check: a,
                    config: ca,
                },
                RuleKind::Ast {
                    check: b,
                    config: cb,
                },
            ) => a == b && ca == cb,
            _ => false,
        };
        kinds_equal
            && self.id == other.id
            && self.name == other.name
            && self.category == other.category
            && self.source == other.source
            && self.languages == other.languages
            && self.level == other.level
            && self.confidence == other.confidence
            && self.message == other.message
            && self.explanation == other.explanation
            && self.remediation == other.remediation
            && self.cwe == other.cwe
            && self.owasp == other.owasp
            && self.references == other.references
    }
}

impl Rule {
    pub fn is_ast(&self) -> bool {
        matches!(self.kind, RuleKind::Ast { .. })
    }

    pub fn is_regex(&self) -> bool {
        matches!(self.kind, RuleKind::Regex { .. })
    }

    /// Whether this rule fires on an artifact with the given language tag
    ///
    /// An empty language list applies everywhere; a non-empty list never
    /// matches artifacts whose extension resolved to no known language.
    pub fn applies_to(&self, tag: Option<&str>) -> bool {
        if self.languages.is_empty() {
            return true;
        }
        match tag {
            Some(tag) => self.languages.iter().any(|lang| lang == tag),
            None => false,
        }
    }

    /// Properties stamped onto every result this rule produces
    pub fn result_properties(&self, tier: Tier) -> PropertyBag {
        let mut properties = PropertyBag::new();
        properties.insert(
            props::TIER.to_string(),
            serde_json::Value::String(tier.as_str().to_string()),
        );
        properties.insert(
            props::EXPLANATION.to_string(),
            serde_json::Value::String(self.explanation.clone().unwrap_or_default()),
        );
        if let Some(confidence) = serde_json::Number::from_f64(self.confidence) {
            properties.insert(
                props::CONFIDENCE.to_string(),
                serde_json::Value::Number(confidence),
            );
        }
        properties.insert(
            props::RULE_SOURCE.to_string(),
            serde_json::Value::String(self.source.as_str().to_string()),
        );
        if let Some(remediation) = &self.remediation {
            properties.insert(
                props::REMEDIATION.to_string(),
                serde_json::Value::String(remediation.clone()),
            );
        }
        if !self.cwe.is_empty() {
            properties.insert(props::CWE.to_string(), string_array(&self.cwe));
        }
        if !self.owasp.is_empty() {
            properties.insert(props::OWASP.to_string(), string_array(&self.owasp));
        }
        if !self.references.is_empty() {
            properties.insert(props::REFERENCES.to_string(), string_array(&self.references));
        }
        properties
    }
}

fn string_array(values: &[String]) -> serde_json::Value {
    serde_json::Value::Array(
        values
            .iter()
            .map(|value| serde_json::Value::String(value.clone()))
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
enum RuleType {
    #[default]
    Regex,
    Ast,
}

/// Raw YAML shape of one rule; validated into [`Rule`]
#[derive(Debug, Serialize, Deserialize)]
struct RuleDefinition {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    rule_type: RuleType,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default)]
    source: Option<RuleSource>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    ast_check: Option<String>,
    #[serde(default)]
    ast_config: Option<CheckConfig>,
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default)]
    level: Option<Level>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    remediation: Option<String>,
    #[serde(default)]
    cwe: Vec<String>,
    #[serde(default)]
    owasp: Vec<String>,
    #[serde(default)]
    references: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleDocument {
    rules: Vec<RuleDefinition>,
}

impl From<&Rule> for RuleDefinition {
    fn from(rule: &Rule) -> Self {
        let (rule_type, pattern, ast_check, ast_config) = match &rule.kind {
            RuleKind::Regex { pattern } => (
                RuleType::Regex,
                Some(pattern.as_str().to_string()),
                None,
                None,
            ),
            RuleKind::Ast { check, config } => (
                RuleType::Ast,
                None,
                Some(check.clone()),
                if config.is_empty() {
                    None
                } else {
                    Some(config.clone())
                },
            ),
        };
        RuleDefinition {
            id: rule.id.clone(),
            name: Some(rule.name.clone()),
            rule_type,
            category: Some(rule.category),
            source: Some(rule.source),
            pattern,
            ast_check,
            ast_config,
            languages: rule.languages.clone(),
            level: Some(rule.level),
            confidence: Some(rule.confidence),
            message: Some(rule.message.clone()),
            explanation: rule.explanation.clone(),
            remediation: rule.remediation.clone(),
            cwe: rule.cwe.clone(),
            owasp: rule.owasp.clone(),
            references: rule.references.clone(),
        }
    }
}

/// Serialize rules back into the YAML document shape [`parse_document`]
/// accepts
///
/// # Errors
///
/// Returns the underlying emitter error, which only occurs on exotic
/// scalar values inside an `ast_config` map.
pub fn serialize_document(rules: &[Rule]) -> Result<String, serde_yaml::Error> {
    let document = RuleDocument {
        rules: rules.iter().map(RuleDefinition::from).collect(),
    };
    serde_yaml::to_string(&document)
}

impl RuleDefinition {
    fn validate(self, registry: &CheckRegistry) -> Result<Rule, ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::InvalidRule {
                id: "<missing>".to_string(),
                reason: "id is required".to_string(),
            });
        }
        let invalid = |reason: &str| ConfigError::InvalidRule {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        let level = self.level.ok_or_else(|| invalid("level is required"))?;
        let message = self
            .message
            .as_deref()
            .filter(|message| !message.is_empty())
            .ok_or_else(|| invalid("message is required"))?
            .to_string();
        let confidence = self
            .confidence
            .ok_or_else(|| invalid("confidence is required"))?;
        if !(confidence > 0.0 && confidence <= 1.0) {
            return Err(invalid("confidence must be in (0, 1]"));
        }
        for tag in &self.languages {
            if !language::LANGUAGE_TAGS.contains(&tag.as_str()) {
                return Err(invalid(&format!("unknown language '{tag}'")));
            }
        }

        let kind = match self.rule_type {
            RuleType::Regex => {
                let pattern = self
                    .pattern
                    .as_deref()
                    .ok_or_else(|| invalid("pattern is required for regex rules"))?;
                let pattern = RegexBuilder::new(pattern)
                    .multi_line(true)
                    .build()
                    .map_err(|source| ConfigError::InvalidRegex {
                        id: self.id.clone(),
                        source: Box::new(source),
                    })?;
                RuleKind::Regex { pattern }
            }
            RuleType::Ast => {
                let check = self
                    .ast_check
                    .clone()
                    .ok_or_else(|| invalid("ast_check is required for ast rules"))?;
                if !registry.contains(&check) {
                    return Err(ConfigError::UnknownCheck {
                        id: self.id.clone(),
                        check,
                    });
                }
                RuleKind::Ast {
                    check,
                    config: self.ast_config.unwrap_or_default(),
                }
            }
        };

        Ok(Rule {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            category: self.category.unwrap_or(Category::Maintainability),
            source: self.source.unwrap_or(RuleSource::Custom),
            languages: self.languages,
            level,
            confidence,
            message,
            explanation: self.explanation,
            remediation: self.remediation,
            cwe: self.cwe,
            owasp: self.owasp,
            references: self.references,
            kind,
        })
    }
}

/// Parse one YAML rule document into validated rules
///
/// # Errors
///
/// Returns `ConfigError` if the document is not valid YAML, a rule fails
/// validation, a regex does not compile, an AST check does not resolve in
/// the registry, or the same id appears twice within the document.
pub fn parse_document(text: &str, registry: &CheckRegistry) -> Result<Vec<Rule>, ConfigError> {
    let document: RuleDocument =
        serde_yaml::from_str(text).map_err(|source| ConfigError::InvalidDocument {
            path: "<inline>".into(),
            source,
        })?;

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(document.rules.len());
    for definition in document.rules {
        let rule = definition.validate(registry)?;
        if !seen.insert(rule.id.clone()) {
            return Err(ConfigError::DuplicateRuleId { id: rule.id });
        }
        rules.push(rule);
    }
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CheckRegistry {
        CheckRegistry::with_builtin_checks()
    }

    #[test]
    fn test_parse_minimal_regex_rule() {
        let yaml = r#"
rules:
  - id: no-print
    pattern: 'println!'
    level: note
    confidence: 0.5
    message: Avoid println in library code
"#;
        let rules = parse_document(yaml, &registry()).unwrap();
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.id, "no-print");
        assert_eq!(rule.name, "no-print");
        assert!(rule.is_regex());
        assert_eq!(rule.category, Category::Maintainability);
        assert_eq!(rule.source, RuleSource::Custom);
    }

    #[test]
    fn test_parse_ast_rule() {
        let yaml = r#"
rules:
  - id: long-fn
    type: ast
    ast_check: function-length
    ast_config:
      max_lines: 30
    level: warning
    confidence: 0.7
    message: Function too long
"#;
        let rules = parse_document(yaml, &registry()).unwrap();
        match &rules[0].kind {
            RuleKind::Ast { check, config } => {
                assert_eq!(check, "function-length");
                assert_eq!(config.get_u32("max_lines", 50), 30);
            }
            _ => panic!("expected AST kind"),
        }
    }

    #[test]
    fn test_missing_pattern_is_invalid() {
        let yaml = r#"
rules:
  - id: broken
    level: error
    confidence: 0.9
    message: m
"#;
        let err = parse_document(yaml, &registry()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { id, .. } if id == "broken"));
    }

    #[test]
    fn test_bad_regex_names_the_rule() {
        let yaml = r#"
rules:
  - id: bad-re
    pattern: '(unclosed'
    level: error
    confidence: 0.9
    message: m
"#;
        let err = parse_document(yaml, &registry()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegex { id, .. } if id == "bad-re"));
    }

    #[test]
    fn test_unknown_check_is_rejected() {
        let yaml = r#"
rules:
  - id: bad-check
    type: ast
    ast_check: no-such-check
    level: error
    confidence: 0.9
    message: m
"#;
        let err = parse_document(yaml, &registry()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCheck { check, .. } if check == "no-such-check"));
    }

    #[test]
    fn test_confidence_bounds() {
        for confidence in ["0.0", "1.2", "-0.1"] {
            let yaml = format!(
                "rules:\n  - id: r\n    pattern: x\n    level: note\n    confidence: {confidence}\n    message: m\n"
            );
            let err = parse_document(&yaml, &registry()).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRule { .. }), "{confidence}");
        }

        let yaml = "rules:\n  - id: r\n    pattern: x\n    level: note\n    confidence: 1.0\n    message: m\n";
        assert!(parse_document(yaml, &registry()).is_ok());
    }

    #[test]
    fn test_duplicate_ids_within_document() {
        let yaml = r#"
rules:
  - id: dup
    pattern: a
    level: note
    confidence: 0.5
    message: m
  - id: dup
    pattern: b
    level: note
    confidence: 0.5
    message: m
"#;
        let err = parse_document(yaml, &registry()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRuleId { id } if id == "dup"));
    }

    #[test]
    fn test_unknown_language_tag_is_invalid() {
        let yaml = r#"
rules:
  - id: r
    pattern: x
    languages: [cobol]
    level: note
    confidence: 0.5
    message: m
"#;
        assert!(parse_document(yaml, &registry()).is_err());
    }

    #[test]
    fn test_applies_to_language_filter() {
        let yaml = r#"
rules:
  - id: go-only
    pattern: x
    languages: [go, python]
    level: note
    confidence: 0.5
    message: m
"#;
        let rule = parse_document(yaml, &registry()).unwrap().remove(0);
        assert!(rule.applies_to(Some("go")));
        assert!(rule.applies_to(Some("python")));
        assert!(!rule.applies_to(Some("rust")));
        assert!(!rule.applies_to(None));
    }

    #[test]
    fn test_pattern_compiles_multi_line() {
        let yaml = r#"
rules:
  - id: line-anchor
    pattern: '^import '
    level: note
    confidence: 0.5
    message: m
"#;
        let rule = parse_document(yaml, &registry()).unwrap().remove(0);
        match &rule.kind {
            RuleKind::Regex { pattern } => {
                let matches: Vec<_> = pattern.find_iter("x = 1\nimport os\n").collect();
                assert_eq!(matches.len(), 1);
            }
            _ => panic!("expected regex kind"),
        }
    }

    #[test]
    fn test_builtin_rules_round_trip_through_yaml() {
        let registry = registry();
        let rules = crate::rules::load_builtin_rules(&registry).unwrap();

        let yaml = serialize_document(&rules).unwrap();
        let reparsed = parse_document(&yaml, &registry).unwrap();

        assert_eq!(rules.len(), reparsed.len());
        for (original, round_tripped) in rules.iter().zip(reparsed.iter()) {
            assert_eq!(original, round_tripped, "rule {} changed", original.id);
        }
    }

    #[test]
    fn test_result_properties_carry_rule_metadata() {
        let yaml = r#"
rules:
  - id: creds
    pattern: password
    level: error
    confidence: 0.9
    message: m
    source: SonarQube
    remediation: Move secrets out of source
    cwe: [CWE-798]
    owasp: ["A07:2021"]
"#;
        let rule = parse_document(yaml, &registry()).unwrap().remove(0);
        let properties = rule.result_properties(Tier::Instant);
        assert_eq!(properties.get(props::TIER).unwrap(), "instant");
        assert_eq!(properties.get(props::RULE_SOURCE).unwrap(), "SonarQube");
        assert_eq!(
            properties.get(props::CWE).unwrap(),
            &serde_json::json!(["CWE-798"])
        );
        assert!(properties.contains_key(props::REMEDIATION));
        assert!(!properties.contains_key(props::REFERENCES));
    }
}
