//! Write-Path Atomicity Tests
//!
//! A batch is accepted or rejected as a unit:
//! - one invalid item rejects the whole batch
//! - the failure lists every invalid position with its violations
//! - a rejected or failed batch changes neither records nor statistics

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dataset_engine::dataset::{
    Dataset, MemoryRecordStore, RecordStore, StoreError, StoreResult, WriteError,
};
use dataset_engine::schema::SchemaStore;
use dataset_engine::stats::StatsSnapshot;
use dataset_engine::validator::BatchValidator;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn product_schema() -> SchemaStore {
    SchemaStore::from_value(&json!({
        "actorSpecification": 1,
        "fields": {
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "price": {"type": ["number", "null"]},
                "status": {"enum": ["active", "retired", null]},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["name"],
            "additionalProperties": false
        },
        "views": {
            "all": {
                "title": "All",
                "transformation": {"fields": ["name", "price"]},
                "display": {"component": "table"}
            }
        }
    }))
    .unwrap()
}

/// Store that fails commits while `failing` is set.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryRecordStore,
    failing: AtomicBool,
}

impl RecordStore for FlakyStore {
    fn commit(&self, items: &[Value], stats: &StatsSnapshot) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk full".into()));
        }
        self.inner.commit(items, stats)
    }

    fn records(&self) -> StoreResult<Vec<Value>> {
        self.inner.records()
    }
}

// =============================================================================
// Validation Outcome Tests
// =============================================================================

/// The canonical example: the second item has a non-string name.
#[test]
fn test_single_invalid_item_is_reported_by_position() {
    let schema = product_schema();
    let err = BatchValidator::new(&schema)
        .validate(&[json!({"name": "a"}), json!({"name": 5})])
        .unwrap_err();

    assert_eq!(err.positions(), vec![1]);
    let violation = &err.invalid_items()[0].validation_errors[0];
    assert_eq!(violation.instance_path, "/name");
    assert_eq!(violation.keyword, "type");

    let payload = serde_json::to_value(err.to_payload()).unwrap();
    assert_eq!(payload["error"]["type"], "schema-validation-error");
    assert_eq!(payload["error"]["message"], "Schema validation failed");
    assert_eq!(payload["error"]["data"]["invalidItems"][0]["itemPosition"], 1);
}

/// All failing items are listed, in position order, with all violations.
#[test]
fn test_every_invalid_item_is_listed() {
    let schema = product_schema();
    let batch = [
        json!({"name": 1, "extra": true}),
        json!({"name": "ok"}),
        json!({"price": "free"}),
        json!("not an object"),
    ];
    let err = BatchValidator::new(&schema).validate(&batch).unwrap_err();

    assert_eq!(err.positions(), vec![0, 2, 3]);
    assert_eq!(err.invalid_items()[0].validation_errors.len(), 2);
    let keywords: Vec<&str> = err.invalid_items()[1]
        .validation_errors
        .iter()
        .map(|v| v.keyword.as_str())
        .collect();
    assert!(keywords.contains(&"required"));
    assert!(keywords.contains(&"type"));
    assert_eq!(err.invalid_items()[2].validation_errors[0].keyword, "type");
}

/// Null membership in union types and enums is honored.
#[test]
fn test_null_in_type_and_enum() {
    let schema = product_schema();
    let batch = [
        json!({"name": "a", "price": null, "status": null}),
        json!({"name": "b", "price": 2.5, "status": "active", "tags": ["x"]}),
    ];
    assert!(BatchValidator::new(&schema).validate(&batch).is_ok());

    let err = BatchValidator::new(&schema)
        .validate(&[json!({"name": "c", "status": "gone"})])
        .unwrap_err();
    assert_eq!(err.invalid_items()[0].validation_errors[0].keyword, "enum");
}

/// An empty batch is trivially valid.
#[test]
fn test_empty_batch_is_valid() {
    let schema = product_schema();
    assert!(BatchValidator::new(&schema).validate(&[]).is_ok());
}

/// Without `fields` every batch is accepted.
#[test]
fn test_absent_fields_skips_validation() {
    let schema = SchemaStore::from_value(&json!({
        "actorSpecification": 1,
        "views": {}
    }))
    .unwrap();
    assert!(BatchValidator::new(&schema)
        .validate(&[json!(1), json!([]), json!({"anything": true})])
        .is_ok());
}

/// Recursive schemas accept items of any nesting depth.
#[test]
fn test_deeply_nested_recursive_item_is_accepted() {
    let schema = SchemaStore::from_value(&json!({
        "actorSpecification": 1,
        "fields": {
            "type": "object",
            "properties": {"child": {"$ref": "#"}}
        },
        "views": {}
    }))
    .unwrap();
    let nest = |leaf: Value| (0..200).fold(leaf, |inner, _| json!({"child": inner}));

    let dataset = Dataset::open(schema, Arc::new(MemoryRecordStore::new())).unwrap();
    dataset.push_items(&[nest(json!({}))]).unwrap();

    let err = dataset.push_items(&[nest(json!("leaf"))]).unwrap_err();
    match err {
        WriteError::Validation(e) => {
            let violation = &e.invalid_items()[0].validation_errors[0];
            assert_eq!(violation.keyword, "type");
            assert_eq!(violation.instance_path.matches("/child").count(), 200);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// =============================================================================
// Persistence Atomicity Tests
// =============================================================================

/// Valid items of a rejected batch are not stored.
#[test]
fn test_rejected_batch_persists_nothing() {
    let store = Arc::new(MemoryRecordStore::new());
    let dataset = Dataset::open(product_schema(), store.clone()).unwrap();

    dataset.push_items(&[json!({"name": "first"})]).unwrap();
    let before = dataset.stats_snapshot().unwrap();

    let result = dataset.push_items(&[
        json!({"name": "valid"}),
        json!({"name": "also valid"}),
        json!({"name": null}),
    ]);
    assert!(matches!(result, Err(WriteError::Validation(_))));

    assert_eq!(store.records().unwrap(), vec![json!({"name": "first"})]);
    assert_eq!(dataset.stats_snapshot().unwrap(), before);
}

/// A store failure leaves statistics exactly as they were.
#[test]
fn test_store_failure_leaves_stats_unchanged() {
    let store = Arc::new(FlakyStore::default());
    let dataset = Dataset::open(product_schema(), store.clone()).unwrap();

    dataset.push_items(&[json!({"name": "a", "price": 1})]).unwrap();
    let before = dataset.stats_snapshot().unwrap();

    store.failing.store(true, Ordering::SeqCst);
    let err = dataset
        .push_items(&[json!({"name": "b", "price": 100})])
        .unwrap_err();
    assert_eq!(err.code(), "DATASET_STORE_ERROR");
    assert_eq!(dataset.stats_snapshot().unwrap(), before);
    assert_eq!(store.records().unwrap().len(), 1);

    store.failing.store(false, Ordering::SeqCst);
    dataset.push_items(&[json!({"name": "b", "price": 100})]).unwrap();
    let after = dataset.stats_snapshot().unwrap();
    assert_eq!(after.item_count, 2);
    assert_eq!(after.field("price").unwrap().max, Some(100.0));
}

/// Validation is deterministic.
#[test]
fn test_validation_is_deterministic() {
    let schema = product_schema();
    let batch = [json!({"name": 1}), json!({"name": "x", "tags": [1, "a", 2]})];
    let first = BatchValidator::new(&schema).validate(&batch).unwrap_err();
    for _ in 0..50 {
        assert_eq!(BatchValidator::new(&schema).validate(&batch).unwrap_err(), first);
    }
}
