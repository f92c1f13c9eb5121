//! Pending-pair computation.
//!
//! Given the model list, the question list, and every model's previously
//! persisted result collection, decide exactly which (model, question)
//! pairs must be (re)executed this run. Pure over its inputs; all I/O is
//! the caller's job.

use crate::fingerprint;
use crate::model::{PendingPair, Question, ResultRecord};
use std::collections::HashMap;

/// Output of one reconciliation pass.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// All pending pairs, model-list order outer, question-list order inner.
    pub pending_pairs: Vec<PendingPair>,
    /// Pending pairs grouped by model. A model with zero pending questions
    /// is entirely absent.
    pub pending_by_model: HashMap<String, Vec<PendingPair>>,
    /// Up-to-date (deduplicated) in-memory copy of every model's collection.
    pub collections: HashMap<String, Vec<ResultRecord>>,
    /// Models whose loaded store contained duplicate question ids. Their
    /// deduplicated collection must be persisted before any remote call.
    pub healed: Vec<String>,
}

/// Collapse duplicate `question_id` entries, keeping the most recently
/// appended record for each id (array order, not timestamp; this mirrors
/// append-only upsert semantics). Relative order of survivors is preserved.
/// Returns the collection and whether anything was removed.
pub fn dedup_last_wins(records: &[ResultRecord]) -> (Vec<ResultRecord>, bool) {
    let mut last_index: HashMap<&str, usize> = HashMap::new();
    for (i, r) in records.iter().enumerate() {
        last_index.insert(r.question_id.as_str(), i);
    }
    let deduped: Vec<ResultRecord> = records
        .iter()
        .enumerate()
        .filter(|(i, r)| last_index.get(r.question_id.as_str()) == Some(i))
        .map(|(_, r)| r.clone())
        .collect();
    let changed = deduped.len() != records.len();
    (deduped, changed)
}

/// Whether a question must be (re)executed given its prior record (if any)
/// and the fresh fingerprint under the current judge configuration.
fn needs_run(prior: Option<&ResultRecord>, fresh_hash: &str) -> bool {
    let Some(record) = prior else {
        return true;
    };
    if record.is_error() {
        return true;
    }
    if record.hash != fresh_hash {
        return true;
    }
    !record.is_judged()
}

/// Compute the pending set for this run.
///
/// `judge_system_prompt` and `judge_model` feed the fingerprint; a change
/// to either re-pends every question for every model.
pub fn compute_pending(
    model_ids: &[String],
    questions: &[Question],
    prior_by_model: HashMap<String, Vec<ResultRecord>>,
    judge_system_prompt: &str,
    judge_model: &str,
) -> Reconciliation {
    let mut out = Reconciliation::default();

    for model_id in model_ids {
        let prior = prior_by_model.get(model_id).cloned().unwrap_or_default();
        let (deduped, changed) = dedup_last_wins(&prior);
        if changed {
            tracing::warn!(
                model = %model_id,
                removed = prior.len() - deduped.len(),
                "duplicate question ids in stored results; keeping last occurrence"
            );
            out.healed.push(model_id.clone());
        }

        let by_id: HashMap<&str, &ResultRecord> = deduped
            .iter()
            .map(|r| (r.question_id.as_str(), r))
            .collect();

        let mut pending = Vec::new();
        for question in questions {
            let fresh = fingerprint::compute(question, judge_system_prompt, judge_model);
            if needs_run(by_id.get(question.id.as_str()).copied(), &fresh.hex) {
                pending.push(PendingPair {
                    model_id: model_id.clone(),
                    question: question.clone(),
                    hash: fresh.hex,
                });
            }
        }

        out.collections.insert(model_id.clone(), deduped);
        if !pending.is_empty() {
            tracing::debug!(model = %model_id, pending = pending.len(), "model has pending work");
            out.pending_pairs.extend(pending.iter().cloned());
            out.pending_by_model.insert(model_id.clone(), pending);
        }
    }

    out
}
