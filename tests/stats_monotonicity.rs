//! Statistics Monotonicity Tests
//!
//! After any further accepted batch, for every field:
//! - nullCount and emptyCount never decrease
//! - min never increases and max never decreases
//!
//! Rejected batches leave statistics untouched.

use std::sync::Arc;

use dataset_engine::dataset::{Dataset, MemoryRecordStore};
use dataset_engine::schema::SchemaStore;
use dataset_engine::stats::StatsSnapshot;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn open_dataset() -> Dataset {
    let schema = SchemaStore::from_value(&json!({
        "actorSpecification": 1,
        "fields": {
            "type": "object",
            "properties": {
                "count": {"type": ["integer", "null"]},
                "label": {"type": ["string", "null"]},
                "flag": {"type": ["boolean", "null"]},
                "items": {"type": ["array", "null"]},
                "meta": {
                    "type": ["object", "null"],
                    "properties": {"score": {"type": ["number", "null"]}}
                }
            }
        },
        "views": {}
    }))
    .unwrap();
    Dataset::open(schema, Arc::new(MemoryRecordStore::new())).unwrap()
}

fn field_value() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(Value::Null)),
        (-1000i64..1000).prop_map(|n| Some(json!(n))),
    ]
}

fn record() -> impl Strategy<Value = Value> {
    (
        field_value(),
        prop::option::of(prop::option::of("[a-z]{0,12}")),
        prop::option::of(prop::option::of(any::<bool>())),
        prop::option::of(prop::collection::vec(0u8..5, 0..6)),
        prop::option::of(prop::option::of(-50.0f64..50.0)),
    )
        .prop_map(|(count, label, flag, items, score)| {
            let mut record = Map::new();
            if let Some(count) = count {
                record.insert("count".into(), count);
            }
            if let Some(label) = label {
                record.insert("label".into(), json!(label));
            }
            if let Some(flag) = flag {
                record.insert("flag".into(), json!(flag));
            }
            if let Some(items) = items {
                record.insert("items".into(), json!(items));
            }
            if let Some(score) = score {
                record.insert("meta".into(), json!({"score": score}));
            }
            Value::Object(record)
        })
}

fn assert_extends(after: &StatsSnapshot, before: &StatsSnapshot) -> Result<(), TestCaseError> {
    prop_assert!(after.item_count >= before.item_count);
    for (path, earlier) in &before.fields {
        let later = after.fields.get(path).unwrap();
        prop_assert!(
            later.extends(earlier),
            "field {} regressed: {:?} -> {:?}",
            path,
            earlier,
            later
        );
    }
    Ok(())
}

// =============================================================================
// Monotonicity Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_stats_only_widen(
        batches in prop::collection::vec(prop::collection::vec(record(), 0..8), 1..8)
    ) {
        let dataset = open_dataset();
        let mut before = dataset.stats_snapshot().unwrap();

        for batch in &batches {
            dataset.push_items(batch).unwrap();
            let after = dataset.stats_snapshot().unwrap();
            assert_extends(&after, &before)?;
            before = after;
        }

        let pushed: usize = batches.iter().map(Vec::len).sum();
        prop_assert_eq!(before.item_count, pushed as u64);
    }

    #[test]
    fn test_rejected_batch_changes_nothing(good in prop::collection::vec(record(), 1..6)) {
        let dataset = open_dataset();
        dataset.push_items(&good).unwrap();
        let before = dataset.stats_snapshot().unwrap();

        let mut bad = good.clone();
        bad.push(json!({"count": "not a number"}));
        prop_assert!(dataset.push_items(&bad).is_err());
        prop_assert_eq!(dataset.stats_snapshot().unwrap(), before);
    }
}

// =============================================================================
// Field Rules
// =============================================================================

#[test]
fn test_boolean_max_flips_once_true_seen() {
    let dataset = open_dataset();
    dataset.push_items(&[json!({"flag": false})]).unwrap();
    let flag = *dataset.stats_snapshot().unwrap().field("flag").unwrap();
    assert_eq!((flag.min, flag.max), (Some(0.0), Some(0.0)));

    dataset.push_items(&[json!({"flag": true}), json!({"flag": false})]).unwrap();
    let flag = *dataset.stats_snapshot().unwrap().field("flag").unwrap();
    assert_eq!((flag.min, flag.max), (Some(0.0), Some(1.0)));
}

#[test]
fn test_nested_field_under_null_parent_is_empty() {
    let dataset = open_dataset();
    dataset
        .push_items(&[json!({"meta": null}), json!({}), json!({"meta": {"score": null}})])
        .unwrap();
    let snapshot = dataset.stats_snapshot().unwrap();
    let score = snapshot.field("meta.score").unwrap();
    assert_eq!(score.empty_count, 2);
    assert_eq!(score.null_count, 1);
    let meta = snapshot.field("meta").unwrap();
    assert_eq!((meta.null_count, meta.empty_count), (1, 1));
}

#[test]
fn test_string_length_counts_characters() {
    let dataset = open_dataset();
    dataset.push_items(&[json!({"label": "ñandú"}), json!({"label": "ab"})]).unwrap();
    let label = *dataset.stats_snapshot().unwrap().field("label").unwrap();
    assert_eq!((label.min, label.max), (Some(2.0), Some(5.0)));
}
