//! AST checks exercised through the full analyzer
//!
//! These tests run real sources through the instant tier and assert the
//! normalized results, including tier and rule-type tagging, across
//! languages.

mod common;

use common::StaticProducer;
use gavel::analyzer::{AnalyzerConfig, MetricsSink, TieredAnalyzer};
use gavel::ast::CheckRegistry;
use gavel::producer::CancellationToken;
use gavel::rules::RuleSet;
use gavel::types::{props, Artifact, Tier};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn analyzer() -> TieredAnalyzer {
    let rules = RuleSet::builtin(&CheckRegistry::with_builtin_checks()).unwrap();
    TieredAnalyzer::new(AnalyzerConfig::new(Arc::new(StaticProducer::empty()), rules))
}

async fn instant_results(artifact: Artifact) -> Vec<gavel::AnalysisResult> {
    let (results, error) = analyzer()
        .analyze(CancellationToken::new(), vec![artifact], "p", "q")
        .await;
    assert!(error.is_none());
    results
}

#[cfg(feature = "lang-go")]
#[tokio::test]
async fn test_long_go_function_is_flagged() {
    let mut content = String::from("package main\n\nfunc f() {\n");
    for i in 0..57 {
        content.push_str(&format!("\tx{i} := {i}\n"));
    }
    content.push_str("}\n");

    let results = instant_results(Artifact::file("long.go", content)).await;
    let hit = results
        .iter()
        .find(|result| result.rule_id == "AST001")
        .expect("function-length should fire");
    assert_eq!(hit.properties.get(props::RULE_TYPE).unwrap(), "ast");
    assert_eq!(hit.properties.get(props::TIER).unwrap(), "instant");
    assert_eq!(hit.primary_location().unwrap().region.start_line, 3);
    assert_eq!(hit.properties.get("gavel/function").unwrap(), "f");
}

#[cfg(feature = "lang-python")]
#[tokio::test]
async fn test_deep_python_nesting_is_flagged() {
    let mut content = String::from("def f():\n");
    for level in 0..6 {
        content.push_str(&format!("{}if x:\n", "    ".repeat(level + 1)));
    }
    content.push_str(&format!("{}pass\n", "    ".repeat(7)));

    let results = instant_results(Artifact::file("deep.py", content)).await;
    assert!(results.iter().any(|result| result.rule_id == "AST002"));
}

#[cfg(feature = "lang-java")]
#[tokio::test]
async fn test_java_empty_catch_is_flagged() {
    let content = r#"class App {
    void f() {
        try {
            risky();
        } catch (Exception e) {
        }
    }
}
"#;
    let results = instant_results(Artifact::file("App.java", content)).await;
    let hit = results
        .iter()
        .find(|result| result.rule_id == "S1086")
        .expect("empty-handler should fire");
    assert_eq!(hit.properties.get("gavel/handler").unwrap(), "catch");
}

#[cfg(feature = "lang-javascript")]
#[tokio::test]
async fn test_javascript_param_count_is_flagged() {
    let content = "function widen(a, b, c, d, e, f) {\n  return a;\n}\n";
    let results = instant_results(Artifact::file("widen.js", content)).await;
    let hit = results
        .iter()
        .find(|result| result.rule_id == "AST003")
        .expect("param-count should fire");
    assert_eq!(hit.properties.get("gavel/parameters").unwrap(), "6");
}

#[tokio::test]
async fn test_unknown_extension_skips_ast_rules_only() {
    // Regex rules still fire on artifacts no grammar claims
    let results = instant_results(Artifact::file(
        "settings.conf",
        "endpoint = http://internal.example\n",
    ))
    .await;
    assert!(results.iter().any(|result| result.rule_id == "S5332"));
    assert!(results
        .iter()
        .all(|result| result.properties.get(props::RULE_TYPE).is_none()));
}

#[cfg(feature = "lang-go")]
#[tokio::test]
async fn test_diff_artifacts_run_regex_rules() {
    let diff = "--- a/cfg.go\n+++ b/cfg.go\n@@ -1 +1,2 @@\n cfg := load()\n+password := \"hunter2hunter2\"\n";
    let artifacts = gavel::input::artifacts_from_diff(diff);
    assert_eq!(artifacts.len(), 1);

    let results = instant_results(artifacts.into_iter().next().unwrap()).await;
    let hit = results
        .iter()
        .find(|result| result.rule_id == "S2068")
        .expect("credential rule fires on diff content");
    // Line numbers are relative to the diff block: hunk header, context
    // line, then the added credential line
    assert_eq!(hit.primary_location().unwrap().region.start_line, 3);
    assert_eq!(hit.primary_location().unwrap().uri, "cfg.go");
}

struct RecordingSink {
    calls: AtomicUsize,
}

impl MetricsSink for RecordingSink {
    fn record_tier(
        &self,
        _tier: Tier,
        _file_path: &str,
        _duration: Duration,
        _result_count: usize,
    ) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_metrics_sink_sees_every_tier_event() {
    let sink = Arc::new(RecordingSink {
        calls: AtomicUsize::new(0),
    });
    let rules = RuleSet::builtin(&CheckRegistry::with_builtin_checks()).unwrap();
    let analyzer = TieredAnalyzer::new(
        AnalyzerConfig::new(Arc::new(StaticProducer::empty()), rules)
            .with_metrics(sink.clone()),
    );

    analyzer
        .analyze(
            CancellationToken::new(),
            vec![
                Artifact::file("a.txt", "alpha\n"),
                Artifact::file("b.txt", "bravo\n"),
            ],
            "p",
            "q",
        )
        .await;

    // Two artifacts times two tiers (instant + comprehensive)
    assert_eq!(sink.calls.load(Ordering::SeqCst), 4);
}
