use crate::errors::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_JUDGE_MODEL: &str = "anthropic/claude-sonnet-4";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_JUDGE_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;

/// Global instructions for the judge model. The verdict parser in
/// `judge::parse_verdict` depends on the output format requested here, so
/// this prompt is part of the result fingerprint.
pub const DEFAULT_JUDGE_SYSTEM_PROMPT: &str = "\
You are a strict evaluator of answers to trick questions.\n\
Judge only against the grading instructions you are given.\n\
Reply with a verdict on the FIRST line: PASS or FAIL.\n\
Then explain your reasoning in one short paragraph.\n\
If you cannot decide from the answer alone, include the token\n\
NEEDS_HUMAN_REVIEW on its own line.\n\
End with a line of the form CONFIDENCE: LOW, MEDIUM, or HIGH.";

/// Explicit run configuration handed to the runner.
///
/// Everything the original read from mutable process-global state lives
/// here instead; constructing a `Config` is the only place the environment
/// is consulted.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer key for the inference API.
    pub api_key: String,
    /// Base URL of the inference API, without the `/chat/completions` path.
    pub api_base: String,
    /// Model identifier used for judging answers.
    pub judge_model: String,
    /// Global system prompt for the judge model.
    pub judge_system_prompt: String,
    /// Completion-token cap for judge calls.
    pub judge_max_tokens: u32,
    /// Default completion-token cap for answers, unless the question
    /// carries its own `token_limit`.
    pub default_max_tokens: u32,
    pub questions_path: PathBuf,
    pub models_path: PathBuf,
    pub results_dir: PathBuf,
    /// Fixed delay between remote calls. Rate-limit courtesy, not backoff.
    pub request_delay: Duration,
    /// Only run the first N models that have pending work.
    pub model_limit: Option<usize>,
}

impl Config {
    /// Build a config from an already-resolved API key and defaults for
    /// everything else. Callers override fields as needed.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            judge_model: DEFAULT_JUDGE_MODEL.to_string(),
            judge_system_prompt: DEFAULT_JUDGE_SYSTEM_PROMPT.to_string(),
            judge_max_tokens: DEFAULT_JUDGE_MAX_TOKENS,
            default_max_tokens: DEFAULT_MAX_TOKENS,
            questions_path: PathBuf::from("questions.json"),
            models_path: PathBuf::from("models.json"),
            results_dir: PathBuf::from("results"),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            model_limit: None,
        }
    }

    /// Resolve the API key from the environment. Missing key is fatal at
    /// startup, before any remote call is attempted.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        Ok(Self::new(api_key))
    }
}
