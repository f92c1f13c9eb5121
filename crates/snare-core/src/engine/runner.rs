//! Sequential run driver.
//!
//! One (model, question) pair is in flight at a time: ask, judge, upsert,
//! persist, then a fixed courtesy delay before the next remote call.
//! Remote failures never abort the run; they become stored ERROR records
//! that the reconciler re-pends deterministically next time.

use crate::config::Config;
use crate::judge::{JudgeConfig, JudgeService};
use crate::model::{
    self, ModelSpec, PendingPair, ResultRecord, ERROR_JUDGMENT,
};
use crate::providers::{AskClient, AskRequest};
use crate::reconcile;
use crate::report::{aggregate, console};
use crate::store::{merge, ResultStore};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Pairs the reconciler marked for execution this run.
    pub pending: usize,
    /// Pairs actually executed (pending minus deferred).
    pub executed: usize,
    pub passed: usize,
    pub failed: usize,
    pub needs_review: usize,
    pub errors: usize,
    /// Pairs already up to date and not touched.
    pub skipped: usize,
    /// Pending pairs left alone because of `--model-limit`.
    pub deferred: usize,
}

pub struct Runner {
    config: Config,
    store: ResultStore,
    client: Arc<dyn AskClient>,
    judge: JudgeService,
}

impl Runner {
    pub fn new(config: Config, client: Arc<dyn AskClient>) -> Self {
        let store = ResultStore::new(&config.results_dir);
        let judge = JudgeService::new(
            JudgeConfig {
                model: config.judge_model.clone(),
                system_prompt: config.judge_system_prompt.clone(),
                max_tokens: config.judge_max_tokens,
            },
            client.clone(),
        );
        Self {
            config,
            store,
            client,
            judge,
        }
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Execute every pending pair and persist as it goes, then recompute
    /// the aggregate. Per-pair remote failures are contained; only I/O on
    /// our own store or unreadable input files abort the run.
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        let questions = model::load_questions(&self.config.questions_path)?;
        let models = model::load_models(&self.config.models_path)?;
        let specs: HashMap<&str, &ModelSpec> =
            models.iter().map(|m| (m.id.as_str(), m)).collect();

        let mut prior = HashMap::new();
        for m in &models {
            prior.insert(m.id.clone(), self.store.load(&m.id)?);
        }

        let model_ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
        let mut rec = reconcile::compute_pending(
            &model_ids,
            &questions,
            prior,
            &self.config.judge_system_prompt,
            &self.config.judge_model,
        );

        // Self-healing: a store that held duplicates is rewritten in its
        // deduplicated form before any remote call.
        for model_id in &rec.healed {
            self.store.save(model_id, &rec.collections[model_id])?;
        }

        let mut active: Vec<String> = model_ids
            .iter()
            .filter(|id| rec.pending_by_model.contains_key(*id))
            .cloned()
            .collect();
        let total_with_pending = active.len();
        if let Some(limit) = self.config.model_limit {
            active.truncate(limit);
            if active.len() < total_with_pending {
                tracing::info!(
                    limit,
                    deferred_models = total_with_pending - active.len(),
                    "model limit active"
                );
            }
        }

        let mut summary = RunSummary {
            pending: rec.pending_pairs.len(),
            skipped: model_ids.len() * questions.len() - rec.pending_pairs.len(),
            ..Default::default()
        };
        let total: usize = active
            .iter()
            .map(|id| rec.pending_by_model[id].len())
            .sum();
        summary.deferred = summary.pending - total;

        tracing::info!(
            models = model_ids.len(),
            questions = questions.len(),
            pending = summary.pending,
            executing = total,
            "reconciliation complete"
        );

        let mut done = 0usize;
        for model_id in &active {
            let pairs = rec.pending_by_model[model_id].clone();
            let spec = specs[model_id.as_str()];
            for pair in &pairs {
                done += 1;
                console::emit_progress_line(&console::format_progress_line(
                    done,
                    total,
                    model_id,
                    &pair.question.id,
                ));

                let record = self.execute_pair(spec, pair).await;
                console::print_outcome(&record);
                match console::outcome_tag(&record) {
                    "PASS" => summary.passed += 1,
                    "FAIL" => summary.failed += 1,
                    "REVIEW" => summary.needs_review += 1,
                    _ => summary.errors += 1,
                }
                summary.executed += 1;

                let collection = rec
                    .collections
                    .get_mut(model_id)
                    .expect("reconciler returns a collection per model");
                merge::upsert(collection, record);
                self.store.save(model_id, collection)?;

                if done < total && !self.config.request_delay.is_zero() {
                    tokio::time::sleep(self.config.request_delay).await;
                }
            }
        }

        self.write_aggregate()?;
        console::print_summary(&summary);
        Ok(summary)
    }

    /// Recompute the aggregate from everything on disk.
    pub fn write_aggregate(&self) -> anyhow::Result<()> {
        let collections = self.store.load_all()?;
        let agg = aggregate::compute(&collections);
        let out = self.store.root().join(aggregate::AGGREGATE_FILE);
        std::fs::create_dir_all(self.store.root())?;
        aggregate::write(&agg, &out)?;
        tracing::debug!(path = %out.display(), records = agg.totals.records, "aggregate written");
        Ok(())
    }

    /// Ask then judge one pair. Never fails: any remote error is folded
    /// into an ERROR record so the run keeps moving and the pair re-pends
    /// on the next reconciliation.
    async fn execute_pair(&self, spec: &ModelSpec, pair: &PendingPair) -> ResultRecord {
        let req = AskRequest {
            model: spec.id.clone(),
            prompt: pair.question.question.clone(),
            system: None,
            max_tokens: pair
                .question
                .token_limit
                .or(Some(self.config.default_max_tokens)),
            reasoning_effort: spec.reasoning_effort.clone(),
        };

        let response = match self.client.ask(&req).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(model = %spec.id, question = %pair.question.id, error = %e, "ask failed");
                return self.error_record(spec, pair, &format!("ERROR: {e}"));
            }
        };

        match self.judge.judge(&pair.question, &response.text).await {
            Ok(verdict) => ResultRecord {
                question_id: pair.question.id.clone(),
                model_id: spec.id.clone(),
                model_name: spec.name.clone(),
                question: pair.question.question.clone(),
                answer: response.text,
                reasoning: response.reasoning,
                judgment: verdict.text,
                passed: verdict.passed,
                needs_human_review: verdict.needs_human_review,
                confidence: verdict.confidence,
                timestamp: chrono::Utc::now().to_rfc3339(),
                hash: pair.hash.clone(),
                usage: response.usage,
                cost: response.cost,
                latency_ms: Some(response.latency_ms),
                generation_id: response.generation_id,
            },
            Err(e) => {
                tracing::warn!(model = %spec.id, question = %pair.question.id, error = %e, "judge failed");
                self.error_record(spec, pair, &format!("ERROR: judge: {e}"))
            }
        }
    }

    fn error_record(&self, spec: &ModelSpec, pair: &PendingPair, answer: &str) -> ResultRecord {
        ResultRecord {
            question_id: pair.question.id.clone(),
            model_id: spec.id.clone(),
            model_name: spec.name.clone(),
            question: pair.question.question.clone(),
            answer: answer.to_string(),
            reasoning: None,
            judgment: ERROR_JUDGMENT.to_string(),
            passed: false,
            needs_human_review: true,
            confidence: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            hash: pair.hash.clone(),
            usage: None,
            cost: None,
            latency_ms: None,
            generation_id: None,
        }
    }
}
