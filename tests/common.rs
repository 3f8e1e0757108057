//! Shared mock model clients for integration tests

use async_trait::async_trait;
use gavel::producer::{CancellationToken, FindingProducer, ModelError, ProducerResult};
use gavel::types::{Finding, Level, PropertyBag};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A model client returning a fixed finding list
///
/// Findings are re-targeted at the artifact under analysis (the analyzer
/// passes the artifact path as additional context), so one mock serves
/// multi-artifact tests. Call counts are tracked for cache assertions.
pub struct StaticProducer {
    name: String,
    findings: Vec<Finding>,
    delay: Option<Duration>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl StaticProducer {
    pub fn returning(findings: Vec<Finding>) -> Self {
        Self {
            name: "static".to_string(),
            findings,
            delay: None,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self::returning(vec![])
    }

    pub fn failing() -> Self {
        let mut producer = Self::empty();
        producer.fail = true;
        producer
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl FindingProducer for StaticProducer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn produce_findings(
        &self,
        cancel: &CancellationToken,
        _code: &str,
        _policies_text: &str,
        _persona_prompt: &str,
        additional_context: &str,
    ) -> ProducerResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if cancel.is_cancelled() {
            return Err(ModelError::Cancelled);
        }
        if self.fail {
            return Err(ModelError::RequestFailed("mock failure".to_string()));
        }
        Ok(self
            .findings
            .iter()
            .cloned()
            .map(|mut finding| {
                finding.file_path = additional_context.to_string();
                finding
            })
            .collect())
    }
}

/// Minimal finding constructor for mocks
pub fn finding(rule_id: &str, level: Level, line: u32) -> Finding {
    Finding {
        rule_id: rule_id.to_string(),
        level,
        message: format!("{rule_id} reported by mock"),
        file_path: String::new(),
        start_line: line,
        end_line: line,
        recommendation: None,
        explanation: Some("mock explanation".to_string()),
        confidence: 0.9,
        properties: PropertyBag::new(),
    }
}
