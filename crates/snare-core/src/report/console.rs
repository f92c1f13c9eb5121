//! Human-facing progress and summary lines, written to stderr.

use crate::engine::runner::RunSummary;
use crate::model::ResultRecord;

/// Format a single progress line. Deterministic, unit-testable.
#[must_use]
pub fn format_progress_line(done: usize, total: usize, model_id: &str, question_id: &str) -> String {
    format!("[{done}/{total}] {model_id} {question_id}")
}

pub fn emit_progress_line(line: &str) {
    eprintln!("{line}");
}

/// Short outcome tag for a freshly produced record.
#[must_use]
pub fn outcome_tag(record: &ResultRecord) -> &'static str {
    if record.is_error() {
        "ERROR"
    } else if record.needs_human_review {
        "REVIEW"
    } else if record.passed {
        "PASS"
    } else {
        "FAIL"
    }
}

pub fn print_outcome(record: &ResultRecord) {
    let icon = match outcome_tag(record) {
        "PASS" => "✅",
        "FAIL" => "❌",
        "REVIEW" => "⚠️ ",
        _ => "💥",
    };
    let latency = record
        .latency_ms
        .map(|l| format!(" ({:.1}s)", l as f64 / 1000.0))
        .unwrap_or_default();
    eprintln!(
        "    {} {:<8} {}{}",
        icon,
        outcome_tag(record),
        record.question_id,
        latency
    );
}

pub fn print_summary(summary: &RunSummary) {
    eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!(
        "Summary: {} passed, {} failed, {} needs review, {} errors, {} skipped (up to date)",
        summary.passed, summary.failed, summary.needs_review, summary.errors, summary.skipped
    );
    if summary.deferred > 0 {
        eprintln!(
            "Deferred: {} pending pairs beyond --model-limit",
            summary.deferred
        );
    }
}
