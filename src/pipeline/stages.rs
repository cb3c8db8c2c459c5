//! Record-level stages: unwind and flatten
//!
//! Both stages address structure by walking nested objects. A literal
//! top-level key equal to the path's canonical form (left by an earlier
//! flatten) takes precedence.

use serde_json::{Map, Value};

use crate::path::FieldPath;

/// Where a taken value lived, so scalars can be put back.
enum Slot {
    /// A literal top-level key
    Literal(String),
    /// The leaf segment inside nested objects
    Nested,
}

/// Removes the value at `path` if `accept` holds for it.
fn take_if<F>(record: &mut Map<String, Value>, path: &FieldPath, accept: F) -> Option<(Value, Slot)>
where
    F: Fn(&Value) -> bool,
{
    if path.depth() > 1 {
        let literal = path.canonical();
        if record.get(&literal).map_or(false, &accept) {
            let value = record.remove(&literal)?;
            return Some((value, Slot::Literal(literal)));
        }
    }
    if path.walk(record).map_or(false, &accept) {
        let value = path.take(record)?;
        return Some((value, Slot::Nested));
    }
    None
}

fn put_back(record: &mut Map<String, Value>, path: &FieldPath, slot: &Slot, value: Value) {
    match slot {
        Slot::Literal(key) => {
            record.insert(key.clone(), value);
        }
        Slot::Nested => {
            if let Some(parent) = path.parent_mut(record) {
                parent.insert(path.leaf().to_string(), value);
            }
        }
    }
}

/// Unwinds `path` on one record.
///
/// - object: its keys are merged into the top level, replacing the
///   wrapping key; on a key collision the unwound value wins
/// - array: one record per element; object elements are merged like an
///   object, any other element stays under the original key
/// - empty array: the record is kept once without the wrapping key
/// - missing or scalar: the record is returned unchanged
pub fn unwind(mut record: Map<String, Value>, path: &FieldPath) -> Vec<Map<String, Value>> {
    let Some((value, slot)) = take_if(&mut record, path, |v| v.is_object() || v.is_array()) else {
        return vec![record];
    };

    match value {
        Value::Object(child) => {
            merge_top_level(&mut record, child);
            vec![record]
        }
        Value::Array(elements) if elements.is_empty() => vec![record],
        Value::Array(elements) => elements
            .into_iter()
            .map(|element| {
                let mut expanded = record.clone();
                match element {
                    Value::Object(child) => merge_top_level(&mut expanded, child),
                    other => put_back(&mut expanded, path, &slot, other),
                }
                expanded
            })
            .collect(),
        // take_if only accepts objects and arrays
        other => {
            put_back(&mut record, path, &slot, other);
            vec![record]
        }
    }
}

fn merge_top_level(record: &mut Map<String, Value>, child: Map<String, Value>) {
    for (key, value) in child {
        record.insert(key, value);
    }
}

/// Flattens the object at `path` into dotted top-level keys.
///
/// Nested objects under the path are flattened all the way down; arrays,
/// scalars and empty objects become leaves. A non-object (or empty object)
/// at the path is left untouched, which makes flatten idempotent.
pub fn flatten(record: &mut Map<String, Value>, path: &FieldPath) {
    let non_empty_object = |v: &Value| v.as_object().map_or(false, |o| !o.is_empty());
    let Some((Value::Object(child), _)) = take_if(record, path, non_empty_object) else {
        return;
    };

    let mut leaves = Vec::new();
    collect_leaves(path, child, &mut leaves);
    for (key, value) in leaves {
        record.insert(key, value);
    }
}

fn collect_leaves(prefix: &FieldPath, object: Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, value) in object {
        let path = prefix.child(key);
        match value {
            Value::Object(nested) if !nested.is_empty() => collect_leaves(&path, nested, out),
            leaf => out.push((path.canonical(), leaf)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    fn records(out: Vec<Map<String, Value>>) -> Value {
        Value::Array(out.into_iter().map(Value::Object).collect())
    }

    #[test]
    fn test_unwind_object_promotes_keys() {
        let out = unwind(obj(json!({"foo": {"bar": "hello"}})), &path("foo"));
        assert_eq!(records(out), json!([{"bar": "hello"}]));
    }

    #[test]
    fn test_unwind_object_collision_unwound_wins() {
        let out = unwind(obj(json!({"id": 1, "name": "parent", "child": {"name": "kid"}})), &path("child"));
        assert_eq!(records(out), json!([{"id": 1, "name": "kid"}]));
    }

    #[test]
    fn test_unwind_array_of_objects() {
        let out = unwind(
            obj(json!({"id": 7, "offers": [{"price": 1}, {"price": 2, "id": 99}]})),
            &path("offers"),
        );
        assert_eq!(records(out), json!([{"id": 7, "price": 1}, {"id": 99, "price": 2}]));
    }

    #[test]
    fn test_unwind_array_of_scalars_keeps_key() {
        let out = unwind(obj(json!({"id": 1, "tags": ["a", null, [2]]})), &path("tags"));
        assert_eq!(
            records(out),
            json!([{"id": 1, "tags": "a"}, {"id": 1, "tags": null}, {"id": 1, "tags": [2]}])
        );
    }

    #[test]
    fn test_unwind_empty_array_keeps_parent() {
        let out = unwind(obj(json!({"id": 1, "tags": []})), &path("tags"));
        assert_eq!(records(out), json!([{"id": 1}]));
    }

    #[test]
    fn test_unwind_missing_or_scalar_is_noop() {
        let record = json!({"id": 1, "x": "scalar"});
        assert_eq!(records(unwind(obj(record.clone()), &path("missing"))), json!([record]));
        assert_eq!(records(unwind(obj(record.clone()), &path("x"))), json!([record]));
    }

    #[test]
    fn test_unwind_nested_path() {
        let out = unwind(obj(json!({"a": {"b": {"c": 1}, "keep": true}})), &path("a.b"));
        assert_eq!(records(out), json!([{"a": {"keep": true}, "c": 1}]));

        let out = unwind(obj(json!({"a": {"list": [1, 2]}})), &path("a.list"));
        assert_eq!(records(out), json!([{"a": {"list": 1}}, {"a": {"list": 2}}]));
    }

    #[test]
    fn test_flatten_recursive() {
        let mut record = obj(json!({"id": 1, "foo": {"bar": "hello", "deep": {"x": 1, "y": [1]}, "empty": {}}}));
        flatten(&mut record, &path("foo"));
        assert_eq!(
            Value::Object(record),
            json!({"id": 1, "foo.bar": "hello", "foo.deep.x": 1, "foo.deep.y": [1], "foo.empty": {}})
        );
    }

    #[test]
    fn test_flatten_non_object_is_noop() {
        for value in [json!({"foo": 5}), json!({"foo": [{"a": 1}]}), json!({"foo": {}}), json!({"bar": 1})] {
            let mut record = obj(value.clone());
            flatten(&mut record, &path("foo"));
            assert_eq!(Value::Object(record), value);
        }
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let mut once = obj(json!({"foo": {"bar": {"baz": 1}}}));
        flatten(&mut once, &path("foo"));
        let mut twice = once.clone();
        flatten(&mut twice, &path("foo"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_flatten_nested_path() {
        let mut record = obj(json!({"a": {"b": {"c": 1}, "d": 2}}));
        flatten(&mut record, &path("a.b"));
        assert_eq!(Value::Object(record), json!({"a": {"d": 2}, "a.b.c": 1}));
    }

    #[test]
    fn test_flatten_escapes_dotted_keys() {
        let mut record = obj(json!({"site": {"example.com": 1}}));
        flatten(&mut record, &path("site"));
        assert_eq!(Value::Object(record), json!({"site.example\\.com": 1}));
    }

    #[test]
    fn test_unwind_then_flatten_differs_from_flatten() {
        let source = json!({"foo": {"bar": "hello"}});

        let mut flattened = obj(source.clone());
        flatten(&mut flattened, &path("foo"));
        assert_eq!(Value::Object(flattened), json!({"foo.bar": "hello"}));

        let mut unwound = unwind(obj(source), &path("foo")).remove(0);
        flatten(&mut unwound, &path("foo"));
        assert_eq!(Value::Object(unwound), json!({"bar": "hello"}));
    }
}
