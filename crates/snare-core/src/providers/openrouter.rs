use super::{AskClient, AskRequest, AskResponse};
use crate::errors::ProviderError;
use crate::model::Usage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Longest error-body excerpt kept in a `ProviderError::Status`.
const ERROR_BODY_LIMIT: usize = 500;

pub struct OpenRouterClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<ReasoningRequest<'a>>,
    usage: UsageRequest,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ReasoningRequest<'a> {
    effort: &'a str,
}

/// Asks the API to include token accounting (and cost) in the response.
#[derive(Serialize)]
struct UsageRequest {
    include: bool,
}

// Strict response shape: decoding fails closed on a missing or mismatched
// required field instead of probing the payload dynamically.
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    id: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
    #[serde(default)]
    cost: Option<f64>,
}

impl OpenRouterClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

fn truncate_body(body: String) -> String {
    if body.len() > ERROR_BODY_LIMIT {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < ERROR_BODY_LIMIT)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body
    }
}

fn decode_response(parsed: ChatResponse, latency_ms: u64) -> Result<AskResponse, ProviderError> {
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Decode("response has no choices".into()))?;
    let text = choice
        .message
        .content
        .ok_or_else(|| ProviderError::Decode("choice message has no content".into()))?;

    Ok(AskResponse {
        text,
        reasoning: choice.message.reasoning,
        usage: parsed.usage.as_ref().map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
        cost: parsed.usage.and_then(|u| u.cost),
        generation_id: parsed.id,
        latency_ms,
    })
}

#[async_trait]
impl AskClient for OpenRouterClient {
    async fn ask(&self, req: &AskRequest) -> Result<AskResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::new();
        if let Some(system) = &req.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &req.prompt,
        });

        let body = ChatRequest {
            model: &req.model,
            messages,
            max_tokens: req.max_tokens,
            reasoning: req
                .reasoning_effort
                .as_deref()
                .map(|effort| ReasoningRequest { effort }),
            usage: UsageRequest { include: true },
        };

        let started = Instant::now();
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                url: url.clone(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| String::new());
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        tracing::debug!(model = %req.model, latency_ms, "completion received");
        decode_response(parsed, latency_ms)
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}
