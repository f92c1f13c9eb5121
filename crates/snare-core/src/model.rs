use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Judgment sentinel stored when a remote call failed for a pair.
pub const ERROR_JUDGMENT: &str = "ERROR";
/// Prefix of the answer text stored for a failed attempt.
pub const ERROR_ANSWER_PREFIX: &str = "ERROR:";

/// A single benchmark question, loaded once per run from the question file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier within the question set.
    pub id: String,
    /// The question text sent verbatim to each model.
    pub question: String,
    /// Per-question instructions for the judge model.
    pub judge_prompt: String,
    /// Completion-token cap for this question, overriding the run default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_limit: Option<u32>,
}

/// A model under benchmark, as listed in the models file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    /// API identifier, namespaced as `provider/modelname`.
    pub id: String,
    /// Display name used in reports.
    pub name: String,
    /// Optional reasoning-effort hint forwarded to the inference API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
}

/// Token usage reported by the inference API for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// One (model, question) evaluation outcome at a point in time.
///
/// Records are never mutated in place: a newer record with the same
/// `question_id` supersedes the old one through upsert, and at most one
/// record per `question_id` exists in a model's collection after any
/// reconciliation pass completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub question_id: String,
    pub model_id: String,
    pub model_name: String,
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub judgment: String,
    pub passed: bool,
    pub needs_human_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    /// ISO-8601 creation time.
    pub timestamp: String,
    /// Fingerprint of the question/judge configuration this record was
    /// produced under; a mismatch with the fresh fingerprint re-pends it.
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
}

impl ResultRecord {
    /// True when this record represents a failed or errored attempt.
    pub fn is_error(&self) -> bool {
        self.judgment == ERROR_JUDGMENT || self.answer.starts_with(ERROR_ANSWER_PREFIX)
    }

    /// True when this record carries a complete, non-error judgment.
    /// Anything else is treated as never-run by the reconciler.
    pub fn is_judged(&self) -> bool {
        !self.model_id.is_empty()
            && !self.question_id.is_empty()
            && !self.hash.is_empty()
            && !self.judgment.is_empty()
            && self.judgment != ERROR_JUDGMENT
    }
}

/// A (model, question) combination the reconciler determined must be
/// (re)executed this run. Ephemeral: rebuilt every run, never persisted.
#[derive(Debug, Clone)]
pub struct PendingPair {
    pub model_id: String,
    pub question: Question,
    /// Fresh fingerprint under the current judge configuration; stored on
    /// the record produced for this pair.
    pub hash: String,
}

/// Provider prefix of a model id (`openai/gpt-4o` → `openai`), falling
/// back to `unknown` when no prefix is present.
pub fn provider_of(model_id: &str) -> &str {
    match model_id.split_once('/') {
        Some((provider, _)) if !provider.is_empty() => provider,
        _ => "unknown",
    }
}

/// Load the question set from a JSON array file.
pub fn load_questions(path: &Path) -> anyhow::Result<Vec<Question>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read questions file: {}", path.display()))?;
    let questions: Vec<Question> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse questions file: {}", path.display()))?;
    Ok(questions)
}

/// Load the model list from a JSON array file.
pub fn load_models(path: &Path) -> anyhow::Result<Vec<ModelSpec>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read models file: {}", path.display()))?;
    let models: Vec<ModelSpec> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse models file: {}", path.display()))?;
    Ok(models)
}
