//! End-to-end runs against a scripted in-process client: reconcile,
//! execute, persist, and reconcile again across simulated runs.

use async_trait::async_trait;
use snare_core::config::Config;
use snare_core::errors::ProviderError;
use snare_core::model::Usage;
use snare_core::providers::{AskClient, AskRequest, AskResponse};
use snare_core::{RunSummary, Runner};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

enum Reply {
    Text(&'static str),
    Fail(&'static str),
}

struct ScriptedClient {
    replies: Mutex<Vec<Reply>>,
    calls: Mutex<usize>,
}

impl ScriptedClient {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(0),
        })
    }

    fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl AskClient for ScriptedClient {
    async fn ask(&self, _req: &AskRequest) -> Result<AskResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(ProviderError::Decode("script exhausted".into()));
        }
        match replies.remove(0) {
            Reply::Text(text) => Ok(AskResponse {
                text: text.to_string(),
                reasoning: None,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                cost: Some(0.001),
                generation_id: Some("gen-1".to_string()),
                latency_ms: 42,
            }),
            Reply::Fail(msg) => Err(ProviderError::Status {
                status: 500,
                body: msg.to_string(),
            }),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

fn write_inputs(dir: &Path, models: &str, questions: &str) {
    std::fs::write(dir.join("models.json"), models).unwrap();
    std::fs::write(dir.join("questions.json"), questions).unwrap();
}

fn config(dir: &Path) -> Config {
    let mut cfg = Config::new("test-key");
    cfg.questions_path = dir.join("questions.json");
    cfg.models_path = dir.join("models.json");
    cfg.results_dir = dir.join("results");
    cfg.request_delay = Duration::ZERO;
    cfg.judge_model = "judge/model-a".to_string();
    cfg
}

const ONE_MODEL: &str = r#"[{"id": "acme/wizard-7b", "name": "Wizard 7B"}]"#;
const ONE_QUESTION: &str = r#"[{
    "id": "q1",
    "question": "How many r's are in strawberry?",
    "judgePrompt": "PASS only if the answer says three."
}]"#;

async fn run(cfg: &Config, client: Arc<ScriptedClient>) -> RunSummary {
    Runner::new(cfg.clone(), client).run().await.unwrap()
}

#[tokio::test]
async fn first_run_executes_second_run_is_idempotent_hash_change_repends() {
    let tmp = tempdir().unwrap();
    write_inputs(tmp.path(), ONE_MODEL, ONE_QUESTION);
    let cfg = config(tmp.path());

    // Run 1: no prior results, one pending pair, ask + judge succeed.
    let client = ScriptedClient::new(vec![
        Reply::Text("There are three r's."),
        Reply::Text("PASS\nSays three.\nCONFIDENCE: HIGH"),
    ]);
    let summary = run(&cfg, client.clone()).await;
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.executed, 1);
    assert_eq!(summary.passed, 1);
    assert_eq!(client.call_count(), 2, "one ask, one judge");

    let stored = std::fs::read_to_string(
        cfg.results_dir.join("acme").join("wizard-7b.json"),
    )
    .unwrap();
    let records: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
    assert_eq!(records[0]["passed"], true);
    assert_eq!(records[0]["confidence"], "HIGH");
    assert_eq!(records[0]["usage"]["totalTokens"], 15);

    // Run 2: nothing changed, nothing pending, no remote calls.
    let idle = ScriptedClient::new(vec![]);
    let summary = run(&cfg, idle.clone()).await;
    assert_eq!(summary.pending, 0);
    assert_eq!(summary.executed, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(idle.call_count(), 0);

    // Run 3: judge model changed, the stored hash no longer matches.
    let mut changed = cfg.clone();
    changed.judge_model = "judge/model-b".to_string();
    let client = ScriptedClient::new(vec![
        Reply::Text("Three."),
        Reply::Text("PASS\nStill three.\nCONFIDENCE: MEDIUM"),
    ]);
    let summary = run(&changed, client).await;
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.executed, 1);
    assert_eq!(summary.passed, 1);
}

#[tokio::test]
async fn remote_failure_stores_error_record_and_repends_next_run() {
    let tmp = tempdir().unwrap();
    write_inputs(tmp.path(), ONE_MODEL, ONE_QUESTION);
    let cfg = config(tmp.path());

    // Ask blows up: the run continues and stores an ERROR record.
    let failing = ScriptedClient::new(vec![Reply::Fail("upstream 500")]);
    let summary = run(&cfg, failing).await;
    assert_eq!(summary.executed, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.passed, 0);

    let stored = std::fs::read_to_string(
        cfg.results_dir.join("acme").join("wizard-7b.json"),
    )
    .unwrap();
    let records: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(records[0]["judgment"], "ERROR");
    assert!(records[0]["answer"]
        .as_str()
        .unwrap()
        .starts_with("ERROR:"));
    assert_eq!(records[0]["needsHumanReview"], true);

    // The failed pair re-pends despite the stored hash being current, and
    // a successful retry replaces the error record.
    let retry = ScriptedClient::new(vec![
        Reply::Text("Three r's."),
        Reply::Text("PASS\nCorrect.\nCONFIDENCE: HIGH"),
    ]);
    let summary = run(&cfg, retry).await;
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.passed, 1);

    let stored = std::fs::read_to_string(
        cfg.results_dir.join("acme").join("wizard-7b.json"),
    )
    .unwrap();
    let records: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1, "upsert, not append");
    assert_eq!(records[0]["passed"], true);
}

#[tokio::test]
async fn judge_failure_after_successful_ask_is_an_error_record() {
    let tmp = tempdir().unwrap();
    write_inputs(tmp.path(), ONE_MODEL, ONE_QUESTION);
    let cfg = config(tmp.path());

    let client = ScriptedClient::new(vec![
        Reply::Text("An answer."),
        Reply::Fail("judge unavailable"),
    ]);
    let summary = run(&cfg, client).await;
    assert_eq!(summary.errors, 1);

    let stored = std::fs::read_to_string(
        cfg.results_dir.join("acme").join("wizard-7b.json"),
    )
    .unwrap();
    let records: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(records[0]["judgment"], "ERROR");
}

#[tokio::test]
async fn empty_answer_fails_without_a_judge_call() {
    let tmp = tempdir().unwrap();
    write_inputs(tmp.path(), ONE_MODEL, ONE_QUESTION);
    let cfg = config(tmp.path());

    let client = ScriptedClient::new(vec![Reply::Text("")]);
    let summary = run(&cfg, client.clone()).await;
    assert_eq!(summary.failed, 1);
    assert_eq!(client.call_count(), 1, "no judge call for empty answers");

    let stored = std::fs::read_to_string(
        cfg.results_dir.join("acme").join("wizard-7b.json"),
    )
    .unwrap();
    let records: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(records[0]["passed"], false);
    assert_eq!(records[0]["confidence"], "HIGH");
}

#[tokio::test]
async fn model_limit_defers_later_models() {
    let tmp = tempdir().unwrap();
    let models = r#"[
        {"id": "acme/wizard-7b", "name": "Wizard 7B"},
        {"id": "acme/sorcerer-13b", "name": "Sorcerer 13B"}
    ]"#;
    write_inputs(tmp.path(), models, ONE_QUESTION);
    let mut cfg = config(tmp.path());
    cfg.model_limit = Some(1);

    let client = ScriptedClient::new(vec![
        Reply::Text("Three."),
        Reply::Text("PASS\nYes.\nCONFIDENCE: HIGH"),
    ]);
    let summary = run(&cfg, client.clone()).await;
    assert_eq!(summary.pending, 2);
    assert_eq!(summary.executed, 1);
    assert_eq!(summary.deferred, 1);
    assert_eq!(client.call_count(), 2);

    assert!(cfg.results_dir.join("acme").join("wizard-7b.json").exists());
    assert!(!cfg
        .results_dir
        .join("acme")
        .join("sorcerer-13b.json")
        .exists());
}

#[tokio::test]
async fn run_writes_a_fresh_aggregate() {
    let tmp = tempdir().unwrap();
    write_inputs(tmp.path(), ONE_MODEL, ONE_QUESTION);
    let cfg = config(tmp.path());

    let client = ScriptedClient::new(vec![
        Reply::Text("Three."),
        Reply::Text("FAIL\nIt hedged.\nCONFIDENCE: LOW"),
    ]);
    run(&cfg, client).await;

    let raw = std::fs::read_to_string(cfg.results_dir.join("aggregate.json")).unwrap();
    let agg: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(agg["totals"]["records"], 1);
    assert_eq!(agg["totals"]["failed"], 1);
    assert_eq!(agg["models"][0]["modelId"], "acme/wizard-7b");
    assert_eq!(agg["questions"][0]["questionId"], "q1");
    assert_eq!(agg["records"][0]["judgment"], "FAIL\nIt hedged.\nCONFIDENCE: LOW");
}

#[tokio::test]
async fn corrupted_store_is_healed_before_execution() {
    let tmp = tempdir().unwrap();
    write_inputs(tmp.path(), ONE_MODEL, ONE_QUESTION);
    let cfg = config(tmp.path());

    // Hand-build a store with duplicate question ids; the later entry has
    // a stale hash, so after healing the question re-pends.
    let dup = serde_json::json!([
        {
            "questionId": "q1", "modelId": "acme/wizard-7b", "modelName": "Wizard 7B",
            "question": "How many r's are in strawberry?", "answer": "two",
            "judgment": "FAIL", "passed": false, "needsHumanReview": false,
            "timestamp": "2026-01-01T00:00:00Z", "hash": "stale-1"
        },
        {
            "questionId": "q1", "modelId": "acme/wizard-7b", "modelName": "Wizard 7B",
            "question": "How many r's are in strawberry?", "answer": "three",
            "judgment": "PASS", "passed": true, "needsHumanReview": false,
            "timestamp": "2026-01-02T00:00:00Z", "hash": "stale-2"
        }
    ]);
    let dir = cfg.results_dir.join("acme");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("wizard-7b.json"),
        serde_json::to_string_pretty(&dup).unwrap(),
    )
    .unwrap();

    let client = ScriptedClient::new(vec![
        Reply::Text("Three."),
        Reply::Text("PASS\nRight.\nCONFIDENCE: HIGH"),
    ]);
    let summary = run(&cfg, client).await;
    assert_eq!(summary.pending, 1, "stale hash re-pends after dedup");

    let stored = std::fs::read_to_string(dir.join("wizard-7b.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1, "duplicates healed");
    assert_ne!(records[0]["hash"], "stale-2", "fresh record replaced it");
}
