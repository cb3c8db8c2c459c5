//! Compiled structural schema
//!
//! The `fields` JSON schema is compiled once at load into a tagged-union
//! tree. Validation walks this tree; it never re-reads raw keyword JSON.
//!
//! Keyword handling follows draft-07:
//! - a missing `type` accepts every instance type, and type-specific
//!   keywords only constrain instances of their own type
//! - `$ref` replaces its sibling keywords
//! - `format` and unknown keywords are annotations

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde_json::{Map, Value};

use super::errors::{ConfigResult, ConfigurationError, DRAFT_07_ID};
use crate::path::FieldPath;

/// A node of the compiled schema tree.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    /// `true` or `{}`
    Any,
    /// `false`
    Never,
    /// Local `$ref`
    Ref(RefTarget),
    /// Any schema object with at least one validating keyword
    Typed(Box<TypedNode>),
}

/// Target of a local `$ref`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// `#`
    Root,
    /// `#/definitions/<name>`
    Definition(String),
}

impl RefTarget {
    pub fn as_pointer(&self) -> String {
        match self {
            RefTarget::Root => "#".to_string(),
            RefTarget::Definition(name) => format!("#/definitions/{}", escape_pointer(name)),
        }
    }
}

/// Keywords of one schema object.
#[derive(Debug, Clone)]
pub struct TypedNode {
    pub types: TypeUnion,
    pub enum_values: Option<Vec<Value>>,
    pub const_value: Option<Value>,
    pub all_of: Vec<SchemaNode>,
    pub any_of: Vec<SchemaNode>,
    pub one_of: Vec<SchemaNode>,
    pub not: Option<SchemaNode>,
}

/// The instance types a node accepts and the rules for each.
#[derive(Debug, Clone)]
pub enum TypeUnion {
    /// No `type` keyword: every instance type passes; listed kinds carry
    /// the type-specific keywords that were present
    Untyped(Vec<TypeNode>),
    /// `type` keyword (single name or array)
    Declared(Vec<TypeNode>),
}

impl TypeUnion {
    pub fn nodes(&self) -> &[TypeNode] {
        match self {
            TypeUnion::Untyped(nodes) | TypeUnion::Declared(nodes) => nodes,
        }
    }
}

/// Type-specific rules.
#[derive(Debug, Clone)]
pub enum TypeNode {
    Null,
    Boolean,
    Integer(NumberRules),
    Number(NumberRules),
    String(StringRules),
    Array(ArrayRules),
    Object(ObjectRules),
}

impl TypeNode {
    pub fn name(&self) -> &'static str {
        match self {
            TypeNode::Null => "null",
            TypeNode::Boolean => "boolean",
            TypeNode::Integer(_) => "integer",
            TypeNode::Number(_) => "number",
            TypeNode::String(_) => "string",
            TypeNode::Array(_) => "array",
            TypeNode::Object(_) => "object",
        }
    }

    /// True if `value` is an instance of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeNode::Null, Value::Null) => true,
            (TypeNode::Boolean, Value::Bool(_)) => true,
            (TypeNode::Integer(_), Value::Number(n)) => is_integer(n),
            (TypeNode::Number(_), Value::Number(_)) => true,
            (TypeNode::String(_), Value::String(_)) => true,
            (TypeNode::Array(_), Value::Array(_)) => true,
            (TypeNode::Object(_), Value::Object(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NumberRules {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

impl NumberRules {
    fn is_empty(&self) -> bool {
        self.minimum.is_none()
            && self.maximum.is_none()
            && self.exclusive_minimum.is_none()
            && self.exclusive_maximum.is_none()
            && self.multiple_of.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Regex>,
}

impl StringRules {
    fn is_empty(&self) -> bool {
        self.min_length.is_none() && self.max_length.is_none() && self.pattern.is_none()
    }
}

/// `items`
#[derive(Debug, Clone, Default)]
pub enum Items {
    #[default]
    Unconstrained,
    Single(Box<SchemaNode>),
    Tuple(Vec<SchemaNode>),
}

/// `additionalProperties` / `additionalItems`
#[derive(Debug, Clone, Default)]
pub enum Additional {
    #[default]
    Allowed,
    Forbidden,
    Schema(Box<SchemaNode>),
}

#[derive(Debug, Clone, Default)]
pub struct ArrayRules {
    pub items: Items,
    pub additional_items: Additional,
    pub contains: Option<Box<SchemaNode>>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
}

impl ArrayRules {
    fn is_empty(&self) -> bool {
        matches!(self.items, Items::Unconstrained)
            && matches!(self.additional_items, Additional::Allowed)
            && self.contains.is_none()
            && self.min_items.is_none()
            && self.max_items.is_none()
            && !self.unique_items
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectRules {
    pub properties: BTreeMap<String, SchemaNode>,
    pub required: Vec<String>,
    pub additional: Additional,
    pub pattern_properties: Vec<(Regex, SchemaNode)>,
    pub property_names: Option<Box<SchemaNode>>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
}

impl ObjectRules {
    fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.required.is_empty()
            && matches!(self.additional, Additional::Allowed)
            && self.pattern_properties.is_empty()
            && self.property_names.is_none()
            && self.min_properties.is_none()
            && self.max_properties.is_none()
    }
}

/// The compiled `fields` schema with its local definitions.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    root: SchemaNode,
    definitions: BTreeMap<String, SchemaNode>,
}

impl CompiledSchema {
    /// Compiles the `fields` schema of a dataset.
    ///
    /// The root must declare `"type": "object"`: a dataset item is always a
    /// single object, never an array of items.
    pub fn compile(fields: &Value) -> ConfigResult<Self> {
        let obj = fields
            .as_object()
            .ok_or_else(|| ConfigurationError::FieldsNotObject(json_kind(fields).into()))?;

        if let Some(draft) = obj.get("$schema") {
            match draft.as_str() {
                Some(DRAFT_07_ID) => {}
                Some(other) => return Err(ConfigurationError::UnsupportedDraft(other.into())),
                None => return Err(ConfigurationError::UnsupportedDraft(draft.to_string())),
            }
        }

        match obj.get("type") {
            Some(Value::String(t)) if t == "object" => {}
            Some(other) => return Err(ConfigurationError::FieldsNotObject(other.to_string())),
            None => return Err(ConfigurationError::FieldsNotObject("no type".into())),
        }

        let mut compiler = Compiler::default();

        let mut definitions = BTreeMap::new();
        if let Some(defs) = obj.get("definitions") {
            let defs = defs
                .as_object()
                .ok_or_else(|| ConfigurationError::keyword("#/definitions", "must be an object"))?;
            for (name, schema) in defs {
                let path = format!("#/definitions/{}", escape_pointer(name));
                definitions.insert(name.clone(), compiler.node(schema, &path)?);
            }
        }

        let root = compiler.node(fields, "#")?;

        for target in &compiler.references {
            if let RefTarget::Definition(name) = target {
                if !definitions.contains_key(name) {
                    return Err(ConfigurationError::UnresolvedReference(target.as_pointer()));
                }
            }
        }

        let compiled = Self { root, definitions };
        compiled.check_cycles()?;
        Ok(compiled)
    }

    /// Rejects reference cycles that evaluate the same instance again
    /// (`$ref`, `allOf`, `anyOf`, `oneOf`, `not`). Cycles through
    /// `properties`, `items` and the like consume one level of the instance
    /// per hop and are fine.
    fn check_cycles(&self) -> ConfigResult<()> {
        let mut targets = vec![RefTarget::Root];
        targets.extend(self.definitions.keys().cloned().map(RefTarget::Definition));

        let mut done = Vec::new();
        for target in &targets {
            self.visit_in_place(target, &mut Vec::new(), &mut done)?;
        }
        Ok(())
    }

    fn visit_in_place(
        &self,
        target: &RefTarget,
        stack: &mut Vec<RefTarget>,
        done: &mut Vec<RefTarget>,
    ) -> ConfigResult<()> {
        if done.contains(target) {
            return Ok(());
        }
        if stack.contains(target) {
            return Err(ConfigurationError::CyclicReference(target.as_pointer()));
        }
        let Some(node) = self.resolve(target) else {
            return Ok(());
        };

        stack.push(target.clone());
        let mut next = Vec::new();
        in_place_refs(node, &mut next);
        for reached in &next {
            self.visit_in_place(reached, stack, done)?;
        }
        stack.pop();
        done.push(target.clone());
        Ok(())
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Resolves a `$ref` target. Targets are checked at compile time.
    pub fn resolve(&self, target: &RefTarget) -> Option<&SchemaNode> {
        match target {
            RefTarget::Root => Some(&self.root),
            RefTarget::Definition(name) => self.definitions.get(name),
        }
    }

    /// Object rules of a node, following references.
    pub fn object_rules<'a>(&'a self, node: &'a SchemaNode) -> Option<&'a ObjectRules> {
        let mut current = node;
        // ref-only cycles fail compile, so every chain ends
        loop {
            match current {
                SchemaNode::Ref(target) => current = self.resolve(target)?,
                SchemaNode::Typed(typed) => {
                    return typed.types.nodes().iter().find_map(|t| match t {
                        TypeNode::Object(rules) => Some(rules),
                        _ => None,
                    })
                }
                SchemaNode::Any | SchemaNode::Never => return None,
            }
        }
    }

    /// Every field path declared through nested `properties`, parents before
    /// children, siblings in key order.
    pub fn declared_paths(&self) -> Vec<FieldPath> {
        let mut out = Vec::new();
        let mut visiting = Vec::new();
        self.collect_paths(&self.root, None, &mut visiting, &mut out);
        out
    }

    fn collect_paths<'a>(
        &'a self,
        node: &'a SchemaNode,
        prefix: Option<&FieldPath>,
        visiting: &mut Vec<*const ObjectRules>,
        out: &mut Vec<FieldPath>,
    ) {
        let Some(rules) = self.object_rules(node) else {
            return;
        };
        let id = rules as *const ObjectRules;
        if visiting.contains(&id) {
            return;
        }
        visiting.push(id);

        for (key, child) in &rules.properties {
            let path = match prefix {
                Some(p) => p.child(key.clone()),
                None => FieldPath::key(key.clone()),
            };
            out.push(path.clone());
            self.collect_paths(child, Some(&path), visiting, out);
        }

        visiting.pop();
    }
}

/// References a node applies to the instance it is evaluating.
fn in_place_refs(node: &SchemaNode, out: &mut Vec<RefTarget>) {
    match node {
        SchemaNode::Ref(target) => out.push(target.clone()),
        SchemaNode::Typed(typed) => {
            let applicators = typed
                .all_of
                .iter()
                .chain(&typed.any_of)
                .chain(&typed.one_of)
                .chain(typed.not.as_ref());
            for sub in applicators {
                in_place_refs(sub, out);
            }
        }
        SchemaNode::Any | SchemaNode::Never => {}
    }
}

#[derive(Default)]
struct Compiler {
    references: Vec<RefTarget>,
}

impl Compiler {
    fn node(&mut self, schema: &Value, path: &str) -> ConfigResult<SchemaNode> {
        let obj = match schema {
            Value::Bool(true) => return Ok(SchemaNode::Any),
            Value::Bool(false) => return Ok(SchemaNode::Never),
            Value::Object(obj) => obj,
            _ => return Err(ConfigurationError::keyword(path, "schema must be an object or boolean")),
        };

        if let Some(reference) = obj.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| ConfigurationError::keyword(format!("{}/$ref", path), "must be a string"))?;
            let target = parse_ref(reference)?;
            self.references.push(target.clone());
            return Ok(SchemaNode::Ref(target));
        }

        let number = self.number_rules(obj, path)?;
        let string = self.string_rules(obj, path)?;
        let array = self.array_rules(obj, path)?;
        let object = self.object_rules(obj, path)?;

        let types = match obj.get("type") {
            None => {
                let mut nodes = Vec::new();
                if !number.is_empty() {
                    nodes.push(TypeNode::Number(number));
                }
                if !string.is_empty() {
                    nodes.push(TypeNode::String(string));
                }
                if !array.is_empty() {
                    nodes.push(TypeNode::Array(array));
                }
                if !object.is_empty() {
                    nodes.push(TypeNode::Object(object));
                }
                TypeUnion::Untyped(nodes)
            }
            Some(declared) => {
                let names = type_names(declared, path)?;
                let mut nodes = Vec::with_capacity(names.len());
                for name in names {
                    nodes.push(match name {
                        "null" => TypeNode::Null,
                        "boolean" => TypeNode::Boolean,
                        "integer" => TypeNode::Integer(number.clone()),
                        "number" => TypeNode::Number(number.clone()),
                        "string" => TypeNode::String(string.clone()),
                        "array" => TypeNode::Array(array.clone()),
                        "object" => TypeNode::Object(object.clone()),
                        other => {
                            return Err(ConfigurationError::keyword(
                                format!("{}/type", path),
                                format!("unknown type '{}'", other),
                            ))
                        }
                    });
                }
                TypeUnion::Declared(nodes)
            }
        };

        let enum_values = match obj.get("enum") {
            None => None,
            Some(Value::Array(values)) if !values.is_empty() => Some(values.clone()),
            Some(_) => {
                return Err(ConfigurationError::keyword(
                    format!("{}/enum", path),
                    "must be a non-empty array",
                ))
            }
        };

        let typed = TypedNode {
            types,
            enum_values,
            const_value: obj.get("const").cloned(),
            all_of: self.node_list(obj, "allOf", path)?,
            any_of: self.node_list(obj, "anyOf", path)?,
            one_of: self.node_list(obj, "oneOf", path)?,
            not: match obj.get("not") {
                Some(schema) => Some(self.node(schema, &format!("{}/not", path))?),
                None => None,
            },
        };

        let trivial = matches!(&typed.types, TypeUnion::Untyped(nodes) if nodes.is_empty())
            && typed.enum_values.is_none()
            && typed.const_value.is_none()
            && typed.all_of.is_empty()
            && typed.any_of.is_empty()
            && typed.one_of.is_empty()
            && typed.not.is_none();

        if trivial {
            Ok(SchemaNode::Any)
        } else {
            Ok(SchemaNode::Typed(Box::new(typed)))
        }
    }

    fn node_list(
        &mut self,
        obj: &Map<String, Value>,
        keyword: &str,
        path: &str,
    ) -> ConfigResult<Vec<SchemaNode>> {
        let Some(value) = obj.get(keyword) else {
            return Ok(Vec::new());
        };
        let keyword_path = format!("{}/{}", path, keyword);
        let list = value
            .as_array()
            .filter(|list| !list.is_empty())
            .ok_or_else(|| ConfigurationError::keyword(&keyword_path, "must be a non-empty array"))?;
        list.iter()
            .enumerate()
            .map(|(i, schema)| self.node(schema, &format!("{}/{}", keyword_path, i)))
            .collect()
    }

    fn number_rules(&mut self, obj: &Map<String, Value>, path: &str) -> ConfigResult<NumberRules> {
        let multiple_of = number_keyword(obj, "multipleOf", path)?;
        if matches!(multiple_of, Some(m) if m <= 0.0) {
            return Err(ConfigurationError::keyword(
                format!("{}/multipleOf", path),
                "must be greater than 0",
            ));
        }
        Ok(NumberRules {
            minimum: number_keyword(obj, "minimum", path)?,
            maximum: number_keyword(obj, "maximum", path)?,
            exclusive_minimum: number_keyword(obj, "exclusiveMinimum", path)?,
            exclusive_maximum: number_keyword(obj, "exclusiveMaximum", path)?,
            multiple_of,
        })
    }

    fn string_rules(&mut self, obj: &Map<String, Value>, path: &str) -> ConfigResult<StringRules> {
        let pattern = match obj.get("pattern") {
            None => None,
            Some(Value::String(p)) => Some(compile_regex(p, &format!("{}/pattern", path))?),
            Some(_) => {
                return Err(ConfigurationError::keyword(
                    format!("{}/pattern", path),
                    "must be a string",
                ))
            }
        };
        Ok(StringRules {
            min_length: count_keyword(obj, "minLength", path)?,
            max_length: count_keyword(obj, "maxLength", path)?,
            pattern,
        })
    }

    fn array_rules(&mut self, obj: &Map<String, Value>, path: &str) -> ConfigResult<ArrayRules> {
        let items = match obj.get("items") {
            None => Items::Unconstrained,
            Some(Value::Array(list)) => Items::Tuple(
                list.iter()
                    .enumerate()
                    .map(|(i, schema)| self.node(schema, &format!("{}/items/{}", path, i)))
                    .collect::<ConfigResult<_>>()?,
            ),
            Some(schema) => Items::Single(Box::new(self.node(schema, &format!("{}/items", path))?)),
        };

        Ok(ArrayRules {
            items,
            additional_items: self.additional(obj, "additionalItems", path)?,
            contains: match obj.get("contains") {
                Some(schema) => Some(Box::new(self.node(schema, &format!("{}/contains", path))?)),
                None => None,
            },
            min_items: count_keyword(obj, "minItems", path)?,
            max_items: count_keyword(obj, "maxItems", path)?,
            unique_items: match obj.get("uniqueItems") {
                None => false,
                Some(Value::Bool(b)) => *b,
                Some(_) => {
                    return Err(ConfigurationError::keyword(
                        format!("{}/uniqueItems", path),
                        "must be a boolean",
                    ))
                }
            },
        })
    }

    fn object_rules(&mut self, obj: &Map<String, Value>, path: &str) -> ConfigResult<ObjectRules> {
        let mut properties = BTreeMap::new();
        if let Some(props) = obj.get("properties") {
            let props = props.as_object().ok_or_else(|| {
                ConfigurationError::keyword(format!("{}/properties", path), "must be an object")
            })?;
            for (key, schema) in props {
                let child_path = format!("{}/properties/{}", path, escape_pointer(key));
                properties.insert(key.clone(), self.node(schema, &child_path)?);
            }
        }

        let required = match obj.get("required") {
            None => Vec::new(),
            Some(Value::Array(names)) => {
                let mut seen = BTreeSet::new();
                let mut out = Vec::with_capacity(names.len());
                for name in names {
                    let name = name.as_str().ok_or_else(|| {
                        ConfigurationError::keyword(
                            format!("{}/required", path),
                            "must contain only strings",
                        )
                    })?;
                    if seen.insert(name) {
                        out.push(name.to_string());
                    }
                }
                out
            }
            Some(_) => {
                return Err(ConfigurationError::keyword(
                    format!("{}/required", path),
                    "must be an array",
                ))
            }
        };

        let mut pattern_properties = Vec::new();
        if let Some(patterns) = obj.get("patternProperties") {
            let patterns = patterns.as_object().ok_or_else(|| {
                ConfigurationError::keyword(format!("{}/patternProperties", path), "must be an object")
            })?;
            for (pattern, schema) in patterns {
                let child_path = format!("{}/patternProperties/{}", path, escape_pointer(pattern));
                let regex = compile_regex(pattern, &child_path)?;
                pattern_properties.push((regex, self.node(schema, &child_path)?));
            }
        }

        Ok(ObjectRules {
            properties,
            required,
            additional: self.additional(obj, "additionalProperties", path)?,
            pattern_properties,
            property_names: match obj.get("propertyNames") {
                Some(schema) => Some(Box::new(
                    self.node(schema, &format!("{}/propertyNames", path))?,
                )),
                None => None,
            },
            min_properties: count_keyword(obj, "minProperties", path)?,
            max_properties: count_keyword(obj, "maxProperties", path)?,
        })
    }

    fn additional(
        &mut self,
        obj: &Map<String, Value>,
        keyword: &str,
        path: &str,
    ) -> ConfigResult<Additional> {
        Ok(match obj.get(keyword) {
            None | Some(Value::Bool(true)) => Additional::Allowed,
            Some(Value::Bool(false)) => Additional::Forbidden,
            Some(schema) => Additional::Schema(Box::new(
                self.node(schema, &format!("{}/{}", path, keyword))?,
            )),
        })
    }
}

fn type_names<'a>(declared: &'a Value, path: &str) -> ConfigResult<Vec<&'a str>> {
    let invalid = || {
        ConfigurationError::keyword(
            format!("{}/type", path),
            "must be a type name or a non-empty array of unique type names",
        )
    };
    match declared {
        Value::String(name) => Ok(vec![name.as_str()]),
        Value::Array(list) if !list.is_empty() => {
            let mut names: Vec<&str> = Vec::with_capacity(list.len());
            for item in list {
                let name = item.as_str().ok_or_else(invalid)?;
                if names.contains(&name) {
                    return Err(invalid());
                }
                names.push(name);
            }
            Ok(names)
        }
        _ => Err(invalid()),
    }
}

fn number_keyword(obj: &Map<String, Value>, keyword: &str, path: &str) -> ConfigResult<Option<f64>> {
    match obj.get(keyword) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(_) => Err(ConfigurationError::keyword(
            format!("{}/{}", path, keyword),
            "must be a number",
        )),
    }
}

fn count_keyword(obj: &Map<String, Value>, keyword: &str, path: &str) -> ConfigResult<Option<u64>> {
    match obj.get(keyword) {
        None => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            ConfigurationError::keyword(
                format!("{}/{}", path, keyword),
                "must be a non-negative integer",
            )
        }),
    }
}

fn compile_regex(pattern: &str, path: &str) -> ConfigResult<Regex> {
    Regex::new(pattern).map_err(|e| ConfigurationError::keyword(path, format!("invalid pattern: {}", e)))
}

fn parse_ref(reference: &str) -> ConfigResult<RefTarget> {
    if reference == "#" {
        return Ok(RefTarget::Root);
    }
    match reference.strip_prefix("#/definitions/") {
        Some(name) if !name.is_empty() && !name.contains('/') => {
            Ok(RefTarget::Definition(unescape_pointer(name)))
        }
        _ => Err(ConfigurationError::UnresolvedReference(reference.to_string())),
    }
}

/// True for numbers with no fractional part (`1.0` counts as an integer).
pub fn is_integer(n: &serde_json::Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().map_or(false, |f| f.fract() == 0.0)
}

/// Escapes a key for use in a JSON pointer.
pub fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn unescape_pointer(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
