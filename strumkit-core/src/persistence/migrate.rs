//! Upgrades for stored documents.
//!
//! Everything read back, from the database or from a legacy JSON file,
//! goes through these functions. Entries that cannot be upgraded are
//! logged and dropped so one bad pattern never blocks the rest.

use serde_json::{Map, Value};
use strumkit_types::{PatternGrid, PracticeSetItem, RhythmPattern, SavedSet};

use crate::patterns::normalize_lane;

/// Format written for custom patterns. Version 1 documents may hold
/// strum patterns stored as plain strings and cells without a duration.
pub const CUSTOM_PATTERNS_VERSION: i64 = 2;
pub const SAVED_SETS_VERSION: i64 = 1;

/// Read custom patterns from any stored format.
pub fn custom_patterns(value: Value) -> Vec<RhythmPattern> {
    let Value::Array(entries) = value else {
        log::warn!(target: "persistence", "custom patterns are not a list; ignoring");
        return Vec::new();
    };
    entries.into_iter().filter_map(custom_pattern).collect()
}

fn custom_pattern(mut entry: Value) -> Option<RhythmPattern> {
    let id = entry
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string();

    if is_legacy_strum(&entry) {
        log::info!(target: "persistence", "dropping old-format strum pattern {}", id);
        return None;
    }
    if let Some(cells) = entry.get_mut("pattern") {
        fill_cell_defaults(cells);
    }

    let mut pattern: RhythmPattern = match serde_json::from_value(entry) {
        Ok(p) => p,
        Err(e) => {
            log::warn!(target: "persistence", "dropping unreadable pattern {}: {}", id, e);
            return None;
        }
    };
    normalize_grid(&mut pattern);
    Some(pattern)
}

/// Strum patterns from the first format were lists of strings.
fn is_legacy_strum(entry: &Value) -> bool {
    entry.get("type").and_then(Value::as_str) == Some("strum")
        && entry
            .get("pattern")
            .and_then(Value::as_array)
            .and_then(|cells| cells.first())
            .is_some_and(Value::is_string)
}

/// Cells without a duration get 1, without an accent get none.
fn fill_cell_defaults(value: &mut Value) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(fill_cell_defaults),
        Value::Object(cell) => {
            insert_missing(cell, "duration", Value::from(1));
            insert_missing(cell, "accent", Value::Bool(false));
        }
        _ => {}
    }
}

fn insert_missing(cell: &mut Map<String, Value>, key: &str, default: Value) {
    if !cell.contains_key(key) {
        cell.insert(key.to_string(), default);
    }
}

/// Fit every lane to the measure and repair overlapping spans.
fn normalize_grid(pattern: &mut RhythmPattern) {
    let total = pattern.total_steps();
    let before = pattern.grid.clone();
    match &mut pattern.grid {
        PatternGrid::Strum(cells) => normalize_lane(cells, total),
        PatternGrid::Arpeggio(lanes) => lanes.iter_mut().for_each(|l| normalize_lane(l, total)),
    }
    if pattern.grid != before {
        log::info!(target: "persistence", "repaired grid of pattern {}", pattern.id);
    }
}

pub fn saved_sets(value: Value) -> Vec<SavedSet> {
    let Value::Array(entries) = value else {
        log::warn!(target: "persistence", "saved sets are not a list; ignoring");
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<SavedSet>(entry) {
            Ok(set) => Some(set),
            Err(e) => {
                log::warn!(target: "persistence", "dropping unreadable saved set: {}", e);
                None
            }
        })
        .collect()
}

pub fn practice_set(value: Value) -> Vec<PracticeSetItem> {
    match serde_json::from_value(value) {
        Ok(items) => items,
        Err(e) => {
            log::warn!(target: "persistence", "ignoring unreadable practice set: {}", e);
            Vec::new()
        }
    }
}

/// Values saved by a browser's local storage are JSON text inside a JSON
/// string. Unwrap those; anything else is returned as is.
pub fn unwrap_encoded(value: Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strumkit_types::{PatternKind, StrumKind};

    #[test]
    fn drops_string_strum_patterns() {
        let patterns = custom_patterns(json!([
            {"id": "old", "name": "Old", "timeSignature": "4/4", "type": "strum",
             "pattern": ["down", "up"]},
            {"id": "new", "name": "New", "timeSignature": "4/4", "type": "strum",
             "pattern": [{"type": "down", "accent": true, "duration": 2}]}
        ]));
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].id, "new");
    }

    #[test]
    fn arpeggio_cells_get_duration() {
        let patterns = custom_patterns(json!([
            {"id": "a", "name": "A", "timeSignature": "2/4", "type": "arpeggio",
             "pattern": [
                 [{"active": true, "accent": false}, {"active": false, "accent": false}],
                 [{"active": false, "accent": true}]
             ]}
        ]));
        let PatternGrid::Arpeggio(lanes) = &patterns[0].grid else {
            panic!("expected arpeggio grid");
        };
        assert_eq!(patterns[0].kind(), PatternKind::Arpeggio);
        assert!(lanes.iter().all(|l| l.len() == 8));
        assert_eq!(lanes[0][0].duration, 1);
        assert!(lanes[0][0].active);
        // A placeholder cannot carry an accent.
        assert!(!lanes[1][0].accented);
    }

    #[test]
    fn strum_grid_is_padded_and_repaired() {
        let patterns = custom_patterns(json!([
            {"id": "s", "name": "S", "timeSignature": "3/8", "type": "strum",
             "pattern": [
                 {"type": "down", "accent": false, "duration": 3},
                 {"type": "up", "accent": false, "duration": 1}
             ]}
        ]));
        let PatternGrid::Strum(cells) = &patterns[0].grid else {
            panic!("expected strum grid");
        };
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0].duration, 3);
        assert_eq!(cells[1].kind, StrumKind::Rest);
        assert!(patterns[0].grid.is_valid());
    }

    #[test]
    fn unreadable_entries_are_dropped() {
        let patterns = custom_patterns(json!([
            {"id": "x", "name": "X", "timeSignature": "4/4", "type": "strum",
             "pattern": [[{"active": true, "accent": false, "duration": 1}]]},
            {"name": "no id"},
            7
        ]));
        assert!(patterns.is_empty());
        assert!(custom_patterns(json!({"not": "a list"})).is_empty());
    }

    #[test]
    fn saved_sets_skip_bad_entries() {
        let sets = saved_sets(json!([
            {"name": "ok", "voicings": []},
            {"voicings": []}
        ]));
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "ok");
    }

    #[test]
    fn encoded_strings_are_unwrapped() {
        assert_eq!(unwrap_encoded(json!("[1, 2]")), json!([1, 2]));
        assert_eq!(unwrap_encoded(json!("not json")), json!("not json"));
        assert_eq!(unwrap_encoded(json!([3])), json!([3]));
    }
}
