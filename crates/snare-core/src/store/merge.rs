//! Collection merge rules.
//!
//! `upsert` keeps the in-memory collection keyed by question id while the
//! run is executing; `merge_on_write` reconciles a batch against whatever
//! is already on disk so a partial or failed run can never clobber entries
//! it did not touch.

use crate::model::ResultRecord;
use std::collections::BTreeMap;

/// Insert-or-replace keyed by `question_id`.
///
/// Removes every existing entry with the record's question id (there
/// should be at most one after a prior pass, but the operation removes all
/// matches), then appends. Collection order afterwards reflects
/// insertion/replacement order, not question order; persistence sorts.
pub fn upsert(collection: &mut Vec<ResultRecord>, record: ResultRecord) {
    collection.retain(|r| r.question_id != record.question_id);
    collection.push(record);
}

/// Merge an incoming batch into the previously persisted entries.
///
/// - Empty incoming against non-empty existing returns existing unchanged;
///   the store layer skips the write entirely, so a degenerate run that
///   produced nothing can never wipe a populated store.
/// - Otherwise incoming wins per `question_id`, existing-only entries are
///   preserved verbatim, and the result is sorted ascending by
///   `question_id` for deterministic, diff-friendly files.
pub fn merge_on_write(
    existing: Vec<ResultRecord>,
    incoming: Vec<ResultRecord>,
) -> Vec<ResultRecord> {
    if incoming.is_empty() && !existing.is_empty() {
        return existing;
    }

    let mut by_id: BTreeMap<String, ResultRecord> = BTreeMap::new();
    for record in existing {
        by_id.insert(record.question_id.clone(), record);
    }
    for record in incoming {
        by_id.insert(record.question_id.clone(), record);
    }
    by_id.into_values().collect()
}
