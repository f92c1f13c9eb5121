//! Aggregate summary over all per-model stores.
//!
//! Fully recomputed on every invocation and written as a single JSON file
//! for the dashboard. Derived data only, never authoritative: the
//! per-model stores remain the source of truth.

use crate::model::{provider_of, ResultRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const AGGREGATE_FILE: &str = "aggregate.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    /// ISO-8601 generation time.
    pub generated_at: String,
    pub totals: Totals,
    pub providers: Vec<ProviderBreakdown>,
    pub models: Vec<ModelBreakdown>,
    pub questions: Vec<QuestionBreakdown>,
    /// Flattened copy of every record, for dashboard drill-down.
    pub records: Vec<ResultRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub models: usize,
    pub questions: usize,
    pub records: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub needs_human_review: usize,
    /// passed / (passed + failed); error records are attempts, not
    /// judgments, and stay out of the denominator.
    pub pass_rate: f64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub total_latency_ms: u64,
    pub avg_latency_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderBreakdown {
    pub provider: String,
    pub models: usize,
    pub records: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub pass_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelBreakdown {
    pub model_id: String,
    pub model_name: String,
    pub provider: String,
    pub records: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub needs_human_review: usize,
    pub pass_rate: f64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub avg_latency_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBreakdown {
    pub question_id: String,
    pub question: String,
    pub records: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub needs_human_review: usize,
    /// Fraction of models that passed this question; low rates are what
    /// makes a trick question interesting.
    pub pass_rate: f64,
}

fn rate(passed: usize, failed: usize) -> f64 {
    let judged = passed + failed;
    if judged == 0 {
        0.0
    } else {
        passed as f64 / judged as f64
    }
}

#[derive(Default)]
struct Tally {
    records: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    needs_human_review: usize,
    total_tokens: u64,
    total_cost: f64,
    latency_ms: u64,
    latency_samples: usize,
}

impl Tally {
    fn add(&mut self, r: &ResultRecord) {
        self.records += 1;
        if r.is_error() {
            self.errors += 1;
        } else if r.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        if r.needs_human_review {
            self.needs_human_review += 1;
        }
        if let Some(u) = &r.usage {
            self.total_tokens += u.total_tokens;
        }
        if let Some(c) = r.cost {
            self.total_cost += c;
        }
        if let Some(l) = r.latency_ms {
            self.latency_ms += l;
            self.latency_samples += 1;
        }
    }

    fn avg_latency_ms(&self) -> f64 {
        if self.latency_samples == 0 {
            0.0
        } else {
            self.latency_ms as f64 / self.latency_samples as f64
        }
    }
}

/// Compute the aggregate over every per-model collection.
pub fn compute(collections: &[Vec<ResultRecord>]) -> Aggregate {
    let mut totals = Totals::default();
    let mut by_model: BTreeMap<String, (String, Tally)> = BTreeMap::new();
    let mut by_question: BTreeMap<String, (String, Tally)> = BTreeMap::new();
    let mut records: Vec<ResultRecord> = Vec::new();

    for collection in collections {
        for r in collection {
            let model = by_model
                .entry(r.model_id.clone())
                .or_insert_with(|| (r.model_name.clone(), Tally::default()));
            model.1.add(r);

            let question = by_question
                .entry(r.question_id.clone())
                .or_insert_with(|| (r.question.clone(), Tally::default()));
            question.1.add(r);

            totals.records += 1;
            if r.is_error() {
                totals.errors += 1;
            } else if r.passed {
                totals.passed += 1;
            } else {
                totals.failed += 1;
            }
            if r.needs_human_review {
                totals.needs_human_review += 1;
            }
            if let Some(u) = &r.usage {
                totals.prompt_tokens += u.prompt_tokens;
                totals.completion_tokens += u.completion_tokens;
                totals.total_tokens += u.total_tokens;
            }
            if let Some(c) = r.cost {
                totals.total_cost += c;
            }
            if let Some(l) = r.latency_ms {
                totals.total_latency_ms += l;
            }
            records.push(r.clone());
        }
    }

    totals.models = by_model.len();
    totals.questions = by_question.len();
    totals.pass_rate = rate(totals.passed, totals.failed);
    let latency_samples = records.iter().filter(|r| r.latency_ms.is_some()).count();
    totals.avg_latency_ms = if latency_samples == 0 {
        0.0
    } else {
        totals.total_latency_ms as f64 / latency_samples as f64
    };

    let mut by_provider: BTreeMap<String, (usize, Tally)> = BTreeMap::new();
    for (model_id, (_, tally)) in &by_model {
        let entry = by_provider
            .entry(provider_of(model_id).to_string())
            .or_insert_with(|| (0, Tally::default()));
        entry.0 += 1;
        entry.1.records += tally.records;
        entry.1.passed += tally.passed;
        entry.1.failed += tally.failed;
        entry.1.errors += tally.errors;
    }

    let models = by_model
        .into_iter()
        .map(|(model_id, (model_name, t))| ModelBreakdown {
            provider: provider_of(&model_id).to_string(),
            model_id,
            model_name,
            records: t.records,
            passed: t.passed,
            failed: t.failed,
            errors: t.errors,
            needs_human_review: t.needs_human_review,
            pass_rate: rate(t.passed, t.failed),
            total_tokens: t.total_tokens,
            total_cost: t.total_cost,
            avg_latency_ms: t.avg_latency_ms(),
        })
        .collect();

    let providers = by_provider
        .into_iter()
        .map(|(provider, (models, t))| ProviderBreakdown {
            provider,
            models,
            records: t.records,
            passed: t.passed,
            failed: t.failed,
            errors: t.errors,
            pass_rate: rate(t.passed, t.failed),
        })
        .collect();

    let questions = by_question
        .into_iter()
        .map(|(question_id, (question, t))| QuestionBreakdown {
            question_id,
            question,
            records: t.records,
            passed: t.passed,
            failed: t.failed,
            errors: t.errors,
            needs_human_review: t.needs_human_review,
            pass_rate: rate(t.passed, t.failed),
        })
        .collect();

    // Stable record order for diff-friendly output.
    records.sort_by(|a, b| {
        (a.model_id.as_str(), a.question_id.as_str())
            .cmp(&(b.model_id.as_str(), b.question_id.as_str()))
    });

    Aggregate {
        generated_at: chrono::Utc::now().to_rfc3339(),
        totals,
        providers,
        models,
        questions,
        records,
    }
}

/// Write the aggregate as pretty JSON.
pub fn write(aggregate: &Aggregate, out: &Path) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(aggregate)?;
    json.push('\n');
    std::fs::write(out, json)?;
    Ok(())
}
