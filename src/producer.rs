#![forbid(unsafe_code)]

//! The model-client capability consumed by the tiered analyzer
//!
//! Fast and comprehensive tiers delegate to an opaque [`FindingProducer`].
//! Gavel never constructs one itself; callers supply clients for whatever
//! model providers they use. Producers must honor the cancellation token.

use crate::types::Finding;

pub use tokio_util::sync::CancellationToken;

/// Result type for model-client operations
pub type ProducerResult = Result<Vec<Finding>, ModelError>;

/// Model-client error types
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("cancelled")]
    Cancelled,
}

/// Capability implemented by model clients
///
/// A producer inspects `code` under the given review policies and persona
/// and reports zero or more findings. If `cancel` fires mid-request, the
/// producer returns [`ModelError::Cancelled`].
#[async_trait::async_trait]
pub trait FindingProducer: Send + Sync {
    /// Human-readable client name, used in logs
    fn name(&self) -> &str;

    async fn produce_findings(
        &self,
        cancel: &CancellationToken,
        code: &str,
        policies_text: &str,
        persona_prompt: &str,
        additional_context: &str,
    ) -> ProducerResult;
}
