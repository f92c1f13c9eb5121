pub mod openrouter;

use crate::errors::ProviderError;
use crate::model::Usage;
use async_trait::async_trait;

/// One completion request to the remote inference API.
#[derive(Debug, Clone, Default)]
pub struct AskRequest {
    pub model: String,
    pub prompt: String,
    /// Optional system message (used for judge calls).
    pub system: Option<String>,
    pub max_tokens: Option<u32>,
    /// Reasoning-effort hint for models that support it.
    pub reasoning_effort: Option<String>,
}

/// A completed remote call, with whatever metadata the API reported.
#[derive(Debug, Clone)]
pub struct AskResponse {
    pub text: String,
    pub reasoning: Option<String>,
    pub usage: Option<Usage>,
    pub cost: Option<f64>,
    pub generation_id: Option<String>,
    /// Round-trip duration measured client-side.
    pub latency_ms: u64,
}

/// Remote Ask/Judge collaborator.
///
/// Failures come back as `ProviderError` values for the runner to inspect;
/// implementations never panic on remote misbehavior.
#[async_trait]
pub trait AskClient: Send + Sync {
    async fn ask(&self, req: &AskRequest) -> Result<AskResponse, ProviderError>;

    fn provider_name(&self) -> &'static str;
}
