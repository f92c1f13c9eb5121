use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "snare",
    version,
    about = "Benchmark language models against trick questions, incrementally"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute pending (model, question) pairs and persist results
    Run(RunArgs),
    /// Recompute the aggregate summary from stored results (no remote calls)
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only run the first N models that have pending work
    #[arg(long, value_name = "N", value_parser = parse_model_limit)]
    pub model_limit: Option<usize>,

    /// Question set (JSON array)
    #[arg(long, default_value = "questions.json")]
    pub questions: PathBuf,

    /// Model list (JSON array)
    #[arg(long, default_value = "models.json")]
    pub models: PathBuf,

    /// Directory holding per-model result files and the aggregate
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Milliseconds to wait between remote calls
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Inference API key; read from the environment when not passed
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Judge model identifier (changing it re-pends every question)
    #[arg(long)]
    pub judge_model: Option<String>,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Directory holding per-model result files and the aggregate
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,
}

fn parse_model_limit(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("must be a positive integer, got '{s}'")),
    }
}
