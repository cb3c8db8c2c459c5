//! Batch validator
//!
//! Validation semantics:
//! - every item is validated independently against the compiled schema
//! - all violations of an item are collected, not just the first
//! - the batch is accepted or rejected as a unit
//! - a dataset without `fields` accepts every batch
//!
//! Validation never mutates items and is deterministic.

use serde_json::{json, Map, Number, Value};

use super::errors::{SchemaValidationError, SchemaViolation, ValidationError, ValidationResult};
use crate::schema::{
    escape_pointer, Additional, ArrayRules, CompiledSchema, Items, NumberRules,
    ObjectRules, SchemaNode, SchemaStore, StringRules, TypeNode, TypeUnion, TypedNode,
};

/// Validates write batches against a dataset's structural schema.
pub struct BatchValidator<'a> {
    schema: Option<&'a CompiledSchema>,
}

impl<'a> BatchValidator<'a> {
    /// Creates a validator for the store's schema.
    pub fn new(store: &'a SchemaStore) -> Self {
        Self {
            schema: store.compiled(),
        }
    }

    /// Creates a validator from a compiled schema; `None` skips validation.
    pub fn with_schema(schema: Option<&'a CompiledSchema>) -> Self {
        Self { schema }
    }

    /// Validates a batch.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError` listing every failing item with its
    /// zero-based position and all of its violations.
    pub fn validate(&self, batch: &[Value]) -> ValidationResult<()> {
        let Some(schema) = self.schema else {
            return Ok(());
        };

        let invalid_items: Vec<ValidationError> = batch
            .iter()
            .enumerate()
            .filter_map(|(position, item)| {
                let violations = check_item(schema, item);
                (!violations.is_empty()).then(|| ValidationError {
                    item_position: position,
                    validation_errors: violations,
                })
            })
            .collect();

        if invalid_items.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::new(invalid_items))
        }
    }

    /// Returns the violations of a single item (empty when valid).
    pub fn validate_item(&self, item: &Value) -> Vec<SchemaViolation> {
        match self.schema {
            Some(schema) => check_item(schema, item),
            None => Vec::new(),
        }
    }
}

/// Validates `batch` against the store's schema.
pub fn validate(store: &SchemaStore, batch: &[Value]) -> ValidationResult<()> {
    BatchValidator::new(store).validate(batch)
}

fn check_item(schema: &CompiledSchema, item: &Value) -> Vec<SchemaViolation> {
    let mut walk = Walk::new(schema);
    walk.node(schema.root(), item, "", "#");
    walk.errors
}

struct Walk<'s> {
    schema: &'s CompiledSchema,
    errors: Vec<SchemaViolation>,
}

impl<'s> Walk<'s> {
    fn new(schema: &'s CompiledSchema) -> Self {
        Self {
            schema,
            errors: Vec::new(),
        }
    }

    /// Runs `node` in a fresh error buffer and returns what it collected.
    fn isolated(&mut self, node: &SchemaNode, value: &Value, instance: &str, at: &str) -> Vec<SchemaViolation> {
        let saved = std::mem::take(&mut self.errors);
        self.node(node, value, instance, at);
        std::mem::replace(&mut self.errors, saved)
    }

    fn fail(&mut self, instance: &str, at: &str, keyword: &str, message: String, params: Value) {
        self.errors.push(SchemaViolation {
            instance_path: instance.to_string(),
            schema_path: format!("{}/{}", at, keyword),
            keyword: keyword.to_string(),
            message,
            params,
        });
    }

    fn node(&mut self, node: &SchemaNode, value: &Value, instance: &str, at: &str) {
        // ref cycles that stay on one instance are rejected at compile time,
        // so recursion here is bounded by the depth of `value`
        match node {
            SchemaNode::Any => {}
            SchemaNode::Never => self.errors.push(SchemaViolation {
                instance_path: instance.to_string(),
                schema_path: at.to_string(),
                keyword: "false schema".to_string(),
                message: "boolean schema is false".to_string(),
                params: json!({}),
            }),
            SchemaNode::Ref(target) => {
                if let Some(resolved) = self.schema.resolve(target) {
                    let pointer = target.as_pointer();
                    self.node(resolved, value, instance, &pointer);
                }
            }
            SchemaNode::Typed(typed) => self.typed(typed, value, instance, at),
        }
    }

    fn typed(&mut self, typed: &TypedNode, value: &Value, instance: &str, at: &str) {
        match &typed.types {
            TypeUnion::Untyped(nodes) => {
                if let Some(matched) = nodes.iter().find(|t| t.accepts(value)) {
                    self.type_rules(matched, value, instance, at);
                }
            }
            TypeUnion::Declared(nodes) => match nodes.iter().find(|t| t.accepts(value)) {
                Some(matched) => self.type_rules(matched, value, instance, at),
                None => {
                    let expected = nodes.iter().map(TypeNode::name).collect::<Vec<_>>().join(",");
                    self.fail(
                        instance,
                        at,
                        "type",
                        format!("must be {}", expected),
                        json!({ "type": expected }),
                    );
                }
            },
        }

        if let Some(allowed) = &typed.enum_values {
            if !allowed.iter().any(|candidate| json_equal(candidate, value)) {
                self.fail(
                    instance,
                    at,
                    "enum",
                    "must be equal to one of the allowed values".to_string(),
                    json!({ "allowedValues": allowed }),
                );
            }
        }

        if let Some(constant) = &typed.const_value {
            if !json_equal(constant, value) {
                self.fail(
                    instance,
                    at,
                    "const",
                    "must be equal to constant".to_string(),
                    json!({ "allowedValue": constant }),
                );
            }
        }

        for (i, sub) in typed.all_of.iter().enumerate() {
            self.node(sub, value, instance, &format!("{}/allOf/{}", at, i));
        }

        if !typed.any_of.is_empty() {
            let mut branch_errors = Vec::new();
            let mut matched = false;
            for (i, sub) in typed.any_of.iter().enumerate() {
                let errors = self.isolated(sub, value, instance, &format!("{}/anyOf/{}", at, i));
                if errors.is_empty() {
                    matched = true;
                    break;
                }
                branch_errors.extend(errors);
            }
            if !matched {
                self.errors.extend(branch_errors);
                self.fail(
                    instance,
                    at,
                    "anyOf",
                    "must match a schema in anyOf".to_string(),
                    json!({}),
                );
            }
        }

        if !typed.one_of.is_empty() {
            let mut branch_errors = Vec::new();
            let mut passing = Vec::new();
            for (i, sub) in typed.one_of.iter().enumerate() {
                let errors = self.isolated(sub, value, instance, &format!("{}/oneOf/{}", at, i));
                if errors.is_empty() {
                    passing.push(i);
                } else {
                    branch_errors.extend(errors);
                }
            }
            match passing.len() {
                1 => {}
                0 => {
                    self.errors.extend(branch_errors);
                    self.fail(
                        instance,
                        at,
                        "oneOf",
                        "must match exactly one schema in oneOf".to_string(),
                        json!({ "passingSchemas": Value::Null }),
                    );
                }
                _ => self.fail(
                    instance,
                    at,
                    "oneOf",
                    "must match exactly one schema in oneOf".to_string(),
                    json!({ "passingSchemas": passing }),
                ),
            }
        }

        if let Some(not) = &typed.not {
            if self.isolated(not, value, instance, &format!("{}/not", at)).is_empty() {
                self.fail(instance, at, "not", "must NOT be valid".to_string(), json!({}));
            }
        }
    }

    fn type_rules(&mut self, node: &TypeNode, value: &Value, instance: &str, at: &str) {
        match (node, value) {
            (TypeNode::Integer(rules), Value::Number(n)) | (TypeNode::Number(rules), Value::Number(n)) => {
                self.number(rules, n, instance, at)
            }
            (TypeNode::String(rules), Value::String(s)) => self.string(rules, s, instance, at),
            (TypeNode::Array(rules), Value::Array(items)) => self.array(rules, items, instance, at),
            (TypeNode::Object(rules), Value::Object(obj)) => self.object(rules, obj, instance, at),
            _ => {}
        }
    }

    fn number(&mut self, rules: &NumberRules, n: &Number, instance: &str, at: &str) {
        let Some(v) = n.as_f64() else {
            return;
        };

        let bounds = [
            ("minimum", rules.minimum, ">=", v >= rules.minimum.unwrap_or(f64::NEG_INFINITY)),
            ("maximum", rules.maximum, "<=", v <= rules.maximum.unwrap_or(f64::INFINITY)),
            (
                "exclusiveMinimum",
                rules.exclusive_minimum,
                ">",
                rules.exclusive_minimum.map_or(true, |limit| v > limit),
            ),
            (
                "exclusiveMaximum",
                rules.exclusive_maximum,
                "<",
                rules.exclusive_maximum.map_or(true, |limit| v < limit),
            ),
        ];
        for (keyword, limit, comparison, ok) in bounds {
            if let (Some(limit), false) = (limit, ok) {
                self.fail(
                    instance,
                    at,
                    keyword,
                    format!("must be {} {}", comparison, limit),
                    json!({ "comparison": comparison, "limit": number_value(limit) }),
                );
            }
        }

        if let Some(divisor) = rules.multiple_of {
            let quotient = v / divisor;
            let tolerance = f64::EPSILON * quotient.abs().max(1.0) * 4.0;
            if !quotient.is_finite() || (quotient - quotient.round()).abs() > tolerance {
                self.fail(
                    instance,
                    at,
                    "multipleOf",
                    format!("must be multiple of {}", divisor),
                    json!({ "multipleOf": number_value(divisor) }),
                );
            }
        }
    }

    fn string(&mut self, rules: &StringRules, s: &str, instance: &str, at: &str) {
        let length = s.chars().count() as u64;
        if let Some(limit) = rules.min_length {
            if length < limit {
                self.fail(
                    instance,
                    at,
                    "minLength",
                    format!("must NOT have fewer than {} characters", limit),
                    json!({ "limit": limit }),
                );
            }
        }
        if let Some(limit) = rules.max_length {
            if length > limit {
                self.fail(
                    instance,
                    at,
                    "maxLength",
                    format!("must NOT have more than {} characters", limit),
                    json!({ "limit": limit }),
                );
            }
        }
        if let Some(pattern) = &rules.pattern {
            if !pattern.is_match(s) {
                self.fail(
                    instance,
                    at,
                    "pattern",
                    format!("must match pattern \"{}\"", pattern.as_str()),
                    json!({ "pattern": pattern.as_str() }),
                );
            }
        }
    }

    fn array(&mut self, rules: &ArrayRules, items: &[Value], instance: &str, at: &str) {
        let count = items.len() as u64;
        if let Some(limit) = rules.min_items {
            if count < limit {
                self.fail(
                    instance,
                    at,
                    "minItems",
                    format!("must NOT have fewer than {} items", limit),
                    json!({ "limit": limit }),
                );
            }
        }
        if let Some(limit) = rules.max_items {
            if count > limit {
                self.fail(
                    instance,
                    at,
                    "maxItems",
                    format!("must NOT have more than {} items", limit),
                    json!({ "limit": limit }),
                );
            }
        }

        match &rules.items {
            Items::Unconstrained => {}
            Items::Single(schema) => {
                let items_at = format!("{}/items", at);
                for (i, item) in items.iter().enumerate() {
                    self.node(schema, item, &format!("{}/{}", instance, i), &items_at);
                }
            }
            Items::Tuple(schemas) => {
                for (i, (schema, item)) in schemas.iter().zip(items).enumerate() {
                    self.node(schema, item, &format!("{}/{}", instance, i), &format!("{}/items/{}", at, i));
                }
                if items.len() > schemas.len() {
                    match &rules.additional_items {
                        Additional::Allowed => {}
                        Additional::Forbidden => self.fail(
                            instance,
                            at,
                            "additionalItems",
                            format!("must NOT have more than {} items", schemas.len()),
                            json!({ "limit": schemas.len() }),
                        ),
                        Additional::Schema(schema) => {
                            let extra_at = format!("{}/additionalItems", at);
                            for (i, item) in items.iter().enumerate().skip(schemas.len()) {
                                self.node(schema, item, &format!("{}/{}", instance, i), &extra_at);
                            }
                        }
                    }
                }
            }
        }

        if let Some(contains) = &rules.contains {
            let contains_at = format!("{}/contains", at);
            let found = items.iter().enumerate().any(|(i, item)| {
                self.isolated(contains, item, &format!("{}/{}", instance, i), &contains_at)
                    .is_empty()
            });
            if !found {
                self.fail(
                    instance,
                    at,
                    "contains",
                    "must contain at least 1 valid item(s)".to_string(),
                    json!({ "minContains": 1 }),
                );
            }
        }

        if rules.unique_items {
            'outer: for i in (1..items.len()).rev() {
                for j in (0..i).rev() {
                    if json_equal(&items[i], &items[j]) {
                        self.fail(
                            instance,
                            at,
                            "uniqueItems",
                            format!("must NOT have duplicate items (items ## {} and {} are identical)", j, i),
                            json!({ "i": i, "j": j }),
                        );
                        break 'outer;
                    }
                }
            }
        }
    }

    fn object(&mut self, rules: &ObjectRules, obj: &Map<String, Value>, instance: &str, at: &str) {
        let count = obj.len() as u64;
        if let Some(limit) = rules.min_properties {
            if count < limit {
                self.fail(
                    instance,
                    at,
                    "minProperties",
                    format!("must NOT have fewer than {} properties", limit),
                    json!({ "limit": limit }),
                );
            }
        }
        if let Some(limit) = rules.max_properties {
            if count > limit {
                self.fail(
                    instance,
                    at,
                    "maxProperties",
                    format!("must NOT have more than {} properties", limit),
                    json!({ "limit": limit }),
                );
            }
        }

        for name in &rules.required {
            if !obj.contains_key(name) {
                self.fail(
                    instance,
                    at,
                    "required",
                    format!("must have required property '{}'", name),
                    json!({ "missingProperty": name }),
                );
            }
        }

        if let Some(names) = &rules.property_names {
            let names_at = format!("{}/propertyNames", at);
            for key in obj.keys() {
                let key_value = Value::String(key.clone());
                if !self.isolated(names, &key_value, instance, &names_at).is_empty() {
                    self.fail(
                        instance,
                        at,
                        "propertyNames",
                        "property name must be valid".to_string(),
                        json!({ "propertyName": key }),
                    );
                }
            }
        }

        for (key, value) in obj {
            let child = format!("{}/{}", instance, escape_pointer(key));
            let mut matched = false;

            if let Some(schema) = rules.properties.get(key) {
                matched = true;
                self.node(schema, value, &child, &format!("{}/properties/{}", at, escape_pointer(key)));
            }

            for (regex, schema) in &rules.pattern_properties {
                if regex.is_match(key) {
                    matched = true;
                    let pattern_at = format!("{}/patternProperties/{}", at, escape_pointer(regex.as_str()));
                    self.node(schema, value, &child, &pattern_at);
                }
            }

            if matched {
                continue;
            }

            match &rules.additional {
                Additional::Allowed => {}
                Additional::Forbidden => self.fail(
                    instance,
                    at,
                    "additionalProperties",
                    "must NOT have additional properties".to_string(),
                    json!({ "additionalProperty": key }),
                ),
                Additional::Schema(schema) => {
                    self.node(schema, value, &child, &format!("{}/additionalProperties", at))
                }
            }
        }
    }
}

/// JSON equality where numerically equal numbers are equal (`1 == 1.0`).
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) if !(x.is_u64() && y.is_u64()) && !(x.is_i64() && y.is_i64()) => fx == fy,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).map_or(false, |y| json_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Integral limits render without a fractional part.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}
