//! # Shallow Record Merge
//!
//! `merge_field` lets a collaborator write a handful of keys into one tab
//! record without rebuilding it. The merge is shallow: each top-level key
//! of the partial replaces the stored one, with three exceptions that keep
//! the record's invariants.
//!
//! - `state` never moves backward. A lower or sideways phase is clamped to
//!   the stored one.
//! - `puzzleSolved` never goes from `true` back to `false`.
//! - A string array merged over a string array is unioned, so append-only
//!   collections never shrink and never gain duplicates.

use shared_types::{append_unique, StoreError, TabRecord};
use serde_json::{Map, Value};
use tracing::debug;

/// Merge `partial` into `current`.
///
/// # Errors
///
/// `StoreError::InvalidDocument` when the result is not a valid record
/// (an unknown phase name, `puzzleSolved` that is not a boolean, ...).
pub fn merge_tab_record(
    current: &TabRecord,
    partial: &Map<String, Value>,
) -> Result<TabRecord, StoreError> {
    let mut base = match serde_json::to_value(current) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(StoreError::InvalidDocument("record is not an object".into())),
        Err(e) => return Err(StoreError::InvalidDocument(e.to_string())),
    };

    for (key, incoming) in partial {
        let merged = match (base.get(key), incoming) {
            (Some(Value::Array(stored)), Value::Array(added)) => {
                match (string_items(stored), string_items(added)) {
                    (Some(mut items), Some(added)) => {
                        for id in &added {
                            append_unique(&mut items, id);
                        }
                        Value::Array(items.into_iter().map(Value::String).collect())
                    }
                    _ => incoming.clone(),
                }
            }
            _ => incoming.clone(),
        };
        base.insert(key.clone(), merged);
    }

    let mut record: TabRecord = serde_json::from_value(Value::Object(base))
        .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;

    if record.state != current.state && !current.state.can_advance_to(record.state) {
        debug!(
            stored = current.state.as_str(),
            requested = record.state.as_str(),
            "Phase regression clamped"
        );
        record.state = current.state;
    }
    record.puzzle_solved |= current.puzzle_solved;

    Ok(record)
}

fn string_items(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
