//! Judge collaborator: sends a model's answer to the judge model and
//! parses the verdict text into structured fields.

use crate::errors::ProviderError;
use crate::model::Question;
use crate::providers::{AskClient, AskRequest};
use regex::Regex;
use std::sync::{Arc, LazyLock};

static CONFIDENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CONFIDENCE:\s*(LOW|MEDIUM|HIGH)").unwrap());

/// Judgment stored for answers that never reached the judge because the
/// model returned nothing to evaluate.
const EMPTY_ANSWER_JUDGMENT: &str =
    "FAIL\nThe model returned an empty answer.\nCONFIDENCE: HIGH";

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Model identifier used for judging.
    pub model: String,
    /// Global system prompt; part of the result fingerprint.
    pub system_prompt: String,
    pub max_tokens: u32,
}

/// A parsed judgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Full judgment text as returned by the judge model.
    pub text: String,
    pub passed: bool,
    pub needs_human_review: bool,
    /// Normalized to uppercase LOW/MEDIUM/HIGH when present.
    pub confidence: Option<String>,
}

pub struct JudgeService {
    config: JudgeConfig,
    client: Arc<dyn AskClient>,
}

/// Parse raw judgment text.
///
/// PASS only when the first line starts with `PASS` and does not start
/// with `FAIL`; a `NEEDS_HUMAN_REVIEW` token anywhere (case-insensitive)
/// sets the review flag; an optional `CONFIDENCE: LOW|MEDIUM|HIGH` token
/// is extracted and uppercased.
pub fn parse_verdict(judgment: &str) -> Verdict {
    let first_line = judgment.lines().next().unwrap_or("").trim_start();
    let passed = first_line.starts_with("PASS") && !first_line.starts_with("FAIL");
    let needs_human_review = judgment.to_uppercase().contains("NEEDS_HUMAN_REVIEW");
    let confidence = CONFIDENCE_RE
        .captures(judgment)
        .map(|c| c[1].to_uppercase());
    Verdict {
        text: judgment.to_string(),
        passed,
        needs_human_review,
        confidence,
    }
}

fn build_prompt(question: &Question, answer: &str) -> String {
    format!(
        "{}\n\nQuestion:\n{}\n\nCandidate answer:\n{}",
        question.judge_prompt, question.question, answer
    )
}

impl JudgeService {
    pub fn new(config: JudgeConfig, client: Arc<dyn AskClient>) -> Self {
        Self { config, client }
    }

    /// Judge one answer. Empty answers short-circuit to FAIL with HIGH
    /// confidence without a remote call.
    pub async fn judge(
        &self,
        question: &Question,
        answer: &str,
    ) -> Result<Verdict, ProviderError> {
        if answer.trim().is_empty() {
            tracing::debug!(question = %question.id, "empty answer, skipping judge call");
            return Ok(parse_verdict(EMPTY_ANSWER_JUDGMENT));
        }

        let req = AskRequest {
            model: self.config.model.clone(),
            prompt: build_prompt(question, answer),
            system: Some(self.config.system_prompt.clone()),
            max_tokens: Some(self.config.max_tokens),
            reasoning_effort: None,
        };
        let resp = self.client.ask(&req).await?;
        Ok(parse_verdict(&resp.text))
    }
}
