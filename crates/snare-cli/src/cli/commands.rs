use super::args::{Cli, Command, RunArgs, StatsArgs};
use crate::exit_codes;
use snare_core::config::Config;
use snare_core::providers::openrouter::OpenRouterClient;
use snare_core::report::aggregate;
use snare_core::store::ResultStore;
use snare_core::Runner;
use std::sync::Arc;
use std::time::Duration;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run(args).await,
        Command::Stats(args) => stats(args),
    }
}

async fn run(args: RunArgs) -> anyhow::Result<i32> {
    // Missing key is a startup error, surfaced before any remote call.
    let Some(api_key) = args.api_key.filter(|k| !k.trim().is_empty()) else {
        eprintln!("error: no API key configured: set OPENROUTER_API_KEY or pass --api-key");
        return Ok(exit_codes::CONFIG_ERROR);
    };

    let mut cfg = Config::new(api_key);
    cfg.questions_path = args.questions;
    cfg.models_path = args.models;
    cfg.results_dir = args.results_dir;
    cfg.request_delay = Duration::from_millis(args.delay_ms);
    cfg.model_limit = args.model_limit;
    if let Some(judge_model) = args.judge_model {
        cfg.judge_model = judge_model;
    }

    tracing::info!(
        judge_model = %cfg.judge_model,
        results_dir = %cfg.results_dir.display(),
        "starting run"
    );
    let client = Arc::new(OpenRouterClient::new(
        cfg.api_base.clone(),
        cfg.api_key.clone(),
    ));
    let runner = Runner::new(cfg, client);
    runner.run().await?;
    Ok(exit_codes::SUCCESS)
}

fn stats(args: StatsArgs) -> anyhow::Result<i32> {
    let store = ResultStore::new(&args.results_dir);
    let collections = store.load_all()?;
    let agg = aggregate::compute(&collections);
    std::fs::create_dir_all(store.root())?;
    let out = store.root().join(aggregate::AGGREGATE_FILE);
    aggregate::write(&agg, &out)?;
    eprintln!(
        "Aggregate: {} records across {} models, pass rate {:.1}% → {}",
        agg.totals.records,
        agg.totals.models,
        agg.totals.pass_rate * 100.0,
        out.display()
    );
    Ok(exit_codes::SUCCESS)
}
