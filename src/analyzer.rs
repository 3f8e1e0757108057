#![forbid(unsafe_code)]

//! Progressive tiered analyzer
//!
//! Per invocation a single producer task drives every artifact through up
//! to three tiers and writes [`TierResult`]s onto a bounded channel.
//! Emission order is phase-major: instant for every artifact first, then
//! fast (when a fast client is configured), then comprehensive, each phase
//! in input order. Consumers read the stream progressively or collapse it
//! into a deduplicated result list.

mod instant;

use crate::ast::CheckRegistry;
use crate::cache::{cache_key, CacheStats, ResultCache, DEFAULT_MAX_SIZE, DEFAULT_TTL};
use crate::error::GavelError;
use crate::producer::{FindingProducer, ModelError};
use crate::rules::{Rule, RuleSet};
use crate::types::{AnalysisResult, Artifact, Tier};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Sink for per-tier timing; parameterized so the core stays free of
/// global state
pub trait MetricsSink: Send + Sync {
    fn record_tier(&self, tier: Tier, file_path: &str, duration: Duration, result_count: usize);
}

/// One tier's output for one artifact
#[derive(Debug)]
pub struct TierResult {
    pub tier: Tier,
    pub file_path: String,
    pub results: Vec<AnalysisResult>,
    pub error: Option<GavelError>,
    pub from_cache: bool,
    pub duration: Duration,
}

/// Analyzer construction parameters
pub struct AnalyzerConfig {
    pub instant_enabled: bool,
    pub fast_client: Option<Arc<dyn FindingProducer>>,
    pub comprehensive_client: Arc<dyn FindingProducer>,
    pub rules: RuleSet,
    pub registry: Arc<CheckRegistry>,
    pub cache_max_size: usize,
    pub cache_ttl: Duration,
    pub metrics: Option<Arc<dyn MetricsSink>>,
}

impl AnalyzerConfig {
    /// Defaults: instant tier on, no fast client, built-in registry,
    /// default cache bounds
    pub fn new(comprehensive_client: Arc<dyn FindingProducer>, rules: RuleSet) -> Self {
        Self {
            instant_enabled: true,
            fast_client: None,
            comprehensive_client,
            rules,
            registry: Arc::new(CheckRegistry::with_builtin_checks()),
            cache_max_size: DEFAULT_MAX_SIZE,
            cache_ttl: DEFAULT_TTL,
            metrics: None,
        }
    }

    pub fn with_fast_client(mut self, client: Arc<dyn FindingProducer>) -> Self {
        self.fast_client = Some(client);
        self
    }

    pub fn with_instant(mut self, enabled: bool) -> Self {
        self.instant_enabled = enabled;
        self
    }

    pub fn with_registry(mut self, registry: Arc<CheckRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_cache(mut self, max_size: usize, ttl: Duration) -> Self {
        self.cache_max_size = max_size;
        self.cache_ttl = ttl;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Combined analyzer statistics
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerStats {
    pub rule_count: usize,
    pub cache: CacheStats,
}

struct Inner {
    instant_enabled: bool,
    fast: Option<Arc<dyn FindingProducer>>,
    comprehensive: Arc<dyn FindingProducer>,
    rules: RwLock<RuleSet>,
    registry: Arc<CheckRegistry>,
    cache: ResultCache<Vec<AnalysisResult>>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

/// The tiered analysis engine
///
/// Cheap to clone; all clones share the rule set and cache.
#[derive(Clone)]
pub struct TieredAnalyzer {
    inner: Arc<Inner>,
}

impl TieredAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                instant_enabled: config.instant_enabled,
                fast: config.fast_client,
                comprehensive: config.comprehensive_client,
                rules: RwLock::new(config.rules),
                registry: config.registry,
                cache: ResultCache::new(config.cache_max_size, config.cache_ttl),
                metrics: config.metrics,
            }),
        }
    }

    /// Stream tier results for the given artifacts
    ///
    /// The stream ends when all tiers of all artifacts have completed or
    /// the token is cancelled; cancellation emits one final error event.
    /// The channel is bounded to three events per artifact, so a lagging
    /// consumer backpressures the producer rather than growing a queue.
    pub fn analyze_progressive(
        &self,
        cancel: CancellationToken,
        artifacts: Vec<Artifact>,
        policies_text: &str,
        persona_prompt: &str,
    ) -> ReceiverStream<TierResult> {
        let capacity = (artifacts.len() * 3).max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let inner = self.inner.clone();
        let policies_text = policies_text.to_string();
        let persona_prompt = persona_prompt.to_string();

        tokio::spawn(run_pipeline(
            inner,
            cancel,
            artifacts,
            policies_text,
            persona_prompt,
            tx,
        ));

        ReceiverStream::new(rx)
    }

    /// Drain the progressive stream into a deduplicated result list
    ///
    /// Returns the collapsed results alongside the last error observed on
    /// the stream, if any.
    pub async fn analyze(
        &self,
        cancel: CancellationToken,
        artifacts: Vec<Artifact>,
        policies_text: &str,
        persona_prompt: &str,
    ) -> (Vec<AnalysisResult>, Option<GavelError>) {
        let mut stream =
            self.analyze_progressive(cancel, artifacts, policies_text, persona_prompt);

        let mut all = Vec::new();
        let mut last_error = None;
        while let Some(event) = stream.next().await {
            all.extend(event.results);
            if let Some(error) = event.error {
                last_error = Some(error);
            }
        }
        (dedup_results(all), last_error)
    }

    /// Insert or replace one rule
    pub fn add_pattern(&self, rule: Rule) {
        self.inner
            .rules
            .write()
            .expect("rule set lock poisoned")
            .upsert(rule);
    }

    /// Replace the whole rule set
    pub fn set_patterns(&self, rules: Vec<Rule>) {
        self.inner
            .rules
            .write()
            .expect("rule set lock poisoned")
            .replace_all(rules);
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    pub fn stats(&self) -> AnalyzerStats {
        AnalyzerStats {
            rule_count: self
                .inner
                .rules
                .read()
                .expect("rule set lock poisoned")
                .len(),
            cache: self.inner.cache.stats(),
        }
    }
}

async fn run_pipeline(
    inner: Arc<Inner>,
    cancel: CancellationToken,
    artifacts: Vec<Artifact>,
    policies_text: String,
    persona_prompt: String,
    tx: mpsc::Sender<TierResult>,
) {
    // Snapshot the rule set; mutators cannot affect an in-flight run
    let rules = inner
        .rules
        .read()
        .expect("rule set lock poisoned")
        .clone();
    let keys: Vec<String> = artifacts
        .iter()
        .map(|artifact| cache_key(&artifact.content, &policies_text, &persona_prompt))
        .collect();
    // Artifacts served from cache skip the model tiers entirely
    let mut cached = vec![false; artifacts.len()];

    if inner.instant_enabled {
        for (index, artifact) in artifacts.iter().enumerate() {
            if cancel.is_cancelled() {
                let _ = emit(&inner, &tx, cancelled_event(Tier::Instant, artifact)).await;
                return;
            }
            let started = Instant::now();
            let (results, from_cache) = match inner.cache.get(&keys[index]) {
                Some(results) => {
                    cached[index] = true;
                    (results, true)
                }
                None => (
                    instant::run_instant(&rules, &inner.registry, artifact),
                    false,
                ),
            };
            let event = TierResult {
                tier: Tier::Instant,
                file_path: artifact.path.clone(),
                results,
                error: None,
                from_cache,
                duration: started.elapsed(),
            };
            if !emit(&inner, &tx, event).await {
                return;
            }
        }
    }

    if let Some(fast) = inner.fast.clone() {
        for (index, artifact) in artifacts.iter().enumerate() {
            if cached[index] {
                continue;
            }
            if cancel.is_cancelled() {
                let _ = emit(&inner, &tx, cancelled_event(Tier::Fast, artifact)).await;
                return;
            }
            let event = run_model_tier(
                fast.as_ref(),
                Tier::Fast,
                &cancel,
                artifact,
                &policies_text,
                &persona_prompt,
            )
            .await;
            let terminal = event.error.as_ref().is_some_and(GavelError::is_cancellation);
            if !emit(&inner, &tx, event).await || terminal {
                return;
            }
        }
    }

    for (index, artifact) in artifacts.iter().enumerate() {
        if cached[index] {
            continue;
        }
        if cancel.is_cancelled() {
            let _ = emit(&inner, &tx, cancelled_event(Tier::Comprehensive, artifact)).await;
            return;
        }
        let event = run_model_tier(
            inner.comprehensive.as_ref(),
            Tier::Comprehensive,
            &cancel,
            artifact,
            &policies_text,
            &persona_prompt,
        )
        .await;
        if event.error.is_none() {
            inner.cache.set(&keys[index], event.results.clone());
        }
        let terminal = event.error.as_ref().is_some_and(GavelError::is_cancellation);
        if !emit(&inner, &tx, event).await || terminal {
            return;
        }
    }
}

async fn run_model_tier(
    client: &dyn FindingProducer,
    tier: Tier,
    cancel: &CancellationToken,
    artifact: &Artifact,
    policies_text: &str,
    persona_prompt: &str,
) -> TierResult {
    let started = Instant::now();
    let produced = client
        .produce_findings(
            cancel,
            &artifact.content,
            policies_text,
            persona_prompt,
            &artifact.path,
        )
        .await;

    match produced {
        Ok(findings) => TierResult {
            tier,
            file_path: artifact.path.clone(),
            results: findings
                .into_iter()
                .map(|finding| finding.into_result(tier))
                .collect(),
            error: None,
            from_cache: false,
            duration: started.elapsed(),
        },
        Err(ModelError::Cancelled) => TierResult {
            tier,
            file_path: artifact.path.clone(),
            results: vec![],
            error: Some(GavelError::Cancelled),
            from_cache: false,
            duration: started.elapsed(),
        },
        Err(error) => TierResult {
            tier,
            file_path: artifact.path.clone(),
            results: vec![],
            error: Some(GavelError::Model(error)),
            from_cache: false,
            duration: started.elapsed(),
        },
    }
}

fn cancelled_event(tier: Tier, artifact: &Artifact) -> TierResult {
    TierResult {
        tier,
        file_path: artifact.path.clone(),
        results: vec![],
        error: Some(GavelError::Cancelled),
        from_cache: false,
        duration: Duration::ZERO,
    }
}

/// Send one event, recording metrics; false when the consumer is gone
async fn emit(inner: &Inner, tx: &mpsc::Sender<TierResult>, event: TierResult) -> bool {
    debug!(
        tier = %event.tier,
        file = %event.file_path,
        results = event.results.len(),
        from_cache = event.from_cache,
        duration_ms = event.duration.as_millis() as u64,
        "tier completed"
    );
    if let Some(metrics) = &inner.metrics {
        metrics.record_tier(
            event.tier,
            &event.file_path,
            event.duration,
            event.results.len(),
        );
    }
    tx.send(event).await.is_ok()
}

/// Collapse a raw result union, keeping the highest-tier result per
/// `(rule_id, uri, start_line)` key
///
/// Results without a location bypass deduplication and pass through
/// unchanged.
pub fn dedup_results(results: Vec<AnalysisResult>) -> Vec<AnalysisResult> {
    let mut kept: Vec<AnalysisResult> = Vec::with_capacity(results.len());
    let mut index: HashMap<(String, String, u32), usize> = HashMap::new();

    for result in results {
        let Some(location) = result.primary_location() else {
            kept.push(result);
            continue;
        };
        let key = (
            result.rule_id.clone(),
            location.uri.clone(),
            location.region.start_line,
        );
        match index.get(&key) {
            Some(&slot) => {
                let held = kept[slot].tier().map(|tier| tier.priority()).unwrap_or(0);
                let offered = result.tier().map(|tier| tier.priority()).unwrap_or(0);
                if offered > held {
                    kept[slot] = result;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(result);
            }
        }
    }
    kept
}
