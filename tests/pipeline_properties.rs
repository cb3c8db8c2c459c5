//! Transformation Pipeline Property Tests
//!
//! - limit after desc returns the N newest records, after asc the N oldest
//! - every row has one cell per selected field
//! - omit of an unselected path changes nothing
//! - flatten is idempotent; unwind and flatten give different key names
//! - output is identical across repeated runs

use dataset_engine::path::FieldPath;
use dataset_engine::pipeline::{flatten, transform, unwind, TransformPlan, ViewQuery};
use dataset_engine::schema::ViewTransformation;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn paths(names: &[&str]) -> Vec<FieldPath> {
    names.iter().map(|n| FieldPath::parse(n).unwrap()).collect()
}

fn numbered(count: usize) -> Vec<Value> {
    (0..count).map(|n| json!({"n": n, "even": n % 2 == 0})).collect()
}

fn n_values(rows: &[dataset_engine::pipeline::Row]) -> Vec<u64> {
    rows.iter()
        .map(|row| {
            row.get(&FieldPath::key("n"))
                .as_present()
                .and_then(Value::as_u64)
                .unwrap()
        })
        .collect()
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

// =============================================================================
// Ordering and Limit Properties
// =============================================================================

proptest! {
    /// `limit` applied after ordering picks the newest (desc) or oldest
    /// (asc) records, and a limit past the end returns everything in order.
    #[test]
    fn test_limit_after_order(total in 0usize..40, limit in 0u64..60, desc in any::<bool>()) {
        let records = numbered(total);
        let mut t = ViewTransformation::select(paths(&["n"]));
        t.limit = Some(limit);
        t.desc = desc;

        let got = n_values(&transform(&records, &t).unwrap());

        let mut expected: Vec<u64> = (0..total as u64).collect();
        if desc {
            expected.reverse();
        }
        expected.truncate(limit as usize);
        prop_assert_eq!(got, expected);
    }

    /// Offset skips rows after ordering; total ignores offset and limit.
    #[test]
    fn test_offset_paging(total in 0usize..30, offset in 0usize..40, limit in 1u64..10) {
        let plan = TransformPlan::compile(&ViewTransformation::select(paths(&["n"]))).unwrap();
        let page = plan.run_page(
            &numbered(total),
            &ViewQuery { offset, limit: Some(limit), ..ViewQuery::default() },
        );

        prop_assert_eq!(page.total, total);
        let expected: Vec<u64> = (0..total as u64).skip(offset).take(limit as usize).collect();
        prop_assert_eq!(n_values(&page.rows), expected);
    }

    /// Column count never depends on which fields a record carries.
    #[test]
    fn test_constant_column_count(mask in proptest::collection::vec(0u8..8, 0..20)) {
        let records: Vec<Value> = mask
            .iter()
            .map(|bits| {
                let mut record = Map::new();
                if bits & 1 != 0 { record.insert("a".into(), json!(1)); }
                if bits & 2 != 0 { record.insert("b".into(), Value::Null); }
                if bits & 4 != 0 { record.insert("c".into(), json!({"d": 2})); }
                Value::Object(record)
            })
            .collect();

        let rows = transform(&records, &ViewTransformation::select(paths(&["a", "b", "c.d"]))).unwrap();
        prop_assert_eq!(rows.len(), records.len());
        for row in &rows {
            prop_assert_eq!(row.len(), 3);
        }
    }

    /// Omitting a path that was never selected is a no-op.
    #[test]
    fn test_omit_unselected_is_noop(total in 0usize..15, extra in "[a-z]{1,8}") {
        prop_assume!(extra != "n" && extra != "even");
        let records = numbered(total);
        let base = ViewTransformation::select(paths(&["n", "even"]));
        let mut omitted = base.clone();
        omitted.omit = vec![FieldPath::key(extra)];

        prop_assert_eq!(transform(&records, &base).unwrap(), transform(&records, &omitted).unwrap());
    }
}

// =============================================================================
// Unwind / Flatten Properties
// =============================================================================

/// flatten on an already flat path changes nothing.
#[test]
fn test_flatten_idempotent() {
    let mut record = object(json!({"foo": {"bar": {"baz": 1}, "qux": [1, 2]}, "id": 3}));
    flatten(&mut record, &FieldPath::key("foo"));
    let once = record.clone();
    flatten(&mut record, &FieldPath::key("foo"));
    assert_eq!(record, once);
    assert_eq!(
        Value::Object(once),
        json!({"foo.bar.baz": 1, "foo.qux": [1, 2], "id": 3})
    );
}

/// Unwind promotes bare keys, flatten promotes dotted keys.
#[test]
fn test_unwind_and_flatten_are_distinguishable() {
    let source = json!({"foo": {"bar": "hello"}});

    let mut flattened = object(source.clone());
    flatten(&mut flattened, &FieldPath::key("foo"));
    let unwound = unwind(object(source), &FieldPath::key("foo"));

    assert_eq!(Value::Object(flattened), json!({"foo.bar": "hello"}));
    assert_eq!(unwound.len(), 1);
    assert_eq!(Value::Object(unwound[0].clone()), json!({"bar": "hello"}));
}

/// Unwinding an array then flattening each element's object.
#[test]
fn test_unwind_then_flatten_rows() {
    let records = [json!({
        "id": 1,
        "offers": [
            {"seller": {"name": "a", "rating": 4}},
            {"seller": {"name": "b"}}
        ]
    })];
    let mut t = ViewTransformation::select(paths(&["id", "seller.name", "seller.rating"]));
    t.unwind = paths(&["offers"]);
    t.flatten = paths(&["seller"]);

    let rows = transform(&records, &t).unwrap();
    let json: Vec<Value> = rows.iter().map(|r| Value::Object(r.to_record())).collect();
    assert_eq!(
        json,
        vec![
            json!({"id": 1, "seller.name": "a", "seller.rating": 4}),
            json!({"id": 1, "seller.name": "b"}),
        ]
    );
    assert!(rows[1].get(&FieldPath::parse("seller.rating").unwrap()).is_absent());
}

/// Same input, same output, byte for byte.
#[test]
fn test_output_is_deterministic() {
    let records = vec![
        json!({"id": 1, "tags": ["x", "y"], "meta": {"a": {"b": 1}}}),
        json!({"id": 2, "tags": [], "meta": null}),
        json!({"id": 3}),
    ];
    let mut t = ViewTransformation::select(paths(&["id", "tags", "meta.a.b"]));
    t.unwind = paths(&["tags"]);
    t.flatten = paths(&["meta"]);
    t.desc = true;

    let first = serde_json::to_string(&transform(&records, &t).unwrap()).unwrap();
    for _ in 0..20 {
        assert_eq!(serde_json::to_string(&transform(&records, &t).unwrap()).unwrap(), first);
    }
}

/// The worked example: desc + limit 1 returns the newest record.
#[test]
fn test_desc_limit_example() {
    let mut t = ViewTransformation::select(paths(&["a", "b"]));
    t.desc = true;
    t.limit = Some(1);
    let rows = transform(&[json!({"a": 1}), json!({"a": 2, "b": 3})], &t).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(Value::Object(rows[0].to_record()), json!({"a": 2, "b": 3}));
}
