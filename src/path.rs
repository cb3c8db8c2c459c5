//! Field path grammar
//!
//! A field path addresses a value inside a record as a sequence of key
//! segments. The textual form joins segments with `.`; a literal dot or
//! backslash inside a key is written `\.` / `\\`.
//!
//! Paths are parsed once (at configuration load or request decode) and then
//! passed around as [`FieldPath`], never re-split at use sites.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Path syntax errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path string was empty
    #[error("field path is empty")]
    Empty,

    /// A segment between two dots was empty
    #[error("field path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Path ended in the middle of an escape sequence
    #[error("field path '{0}' ends with a dangling escape")]
    DanglingEscape(String),

    /// Unknown escape sequence
    #[error("field path '{path}' has invalid escape '\\{found}'")]
    InvalidEscape { path: String, found: char },
}

/// A parsed, non-empty sequence of key segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses the dotted textual form.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = input.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('.') => current.push('.'),
                    Some('\\') => current.push('\\'),
                    Some(other) => {
                        return Err(PathError::InvalidEscape {
                            path: input.to_string(),
                            found: other,
                        })
                    }
                    None => return Err(PathError::DanglingEscape(input.to_string())),
                },
                '.' => {
                    if current.is_empty() {
                        return Err(PathError::EmptySegment(input.to_string()));
                    }
                    segments.push(std::mem::take(&mut current));
                }
                c => current.push(c),
            }
        }

        if current.is_empty() {
            return Err(PathError::EmptySegment(input.to_string()));
        }
        segments.push(current);

        Ok(Self { segments })
    }

    /// Builds a single-segment path from a literal key (no parsing).
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            segments: vec![key.into()],
        }
    }

    /// Returns the key segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the first segment.
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    /// Returns the number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns a new path with `key` appended.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Self { segments }
    }

    /// Returns true if `self` is a strict prefix of `other`.
    pub fn is_prefix_of(&self, other: &FieldPath) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// Canonical textual form; this is also the top-level key `flatten`
    /// produces for a leaf at this path.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            for c in segment.chars() {
                match c {
                    '.' => out.push_str("\\."),
                    '\\' => out.push_str("\\\\"),
                    c => out.push(c),
                }
            }
        }
        out
    }

    /// Resolves the path against a record.
    ///
    /// A literal top-level key equal to the canonical form wins; otherwise
    /// the segments are walked through nested objects.
    pub fn resolve<'a>(&self, record: &'a Map<String, Value>) -> Option<&'a Value> {
        if self.segments.len() > 1 {
            if let Some(value) = record.get(&self.canonical()) {
                return Some(value);
            }
        }
        self.walk(record)
    }

    /// Walks nested objects segment by segment, ignoring flattened keys.
    pub fn walk<'a>(&self, record: &'a Map<String, Value>) -> Option<&'a Value> {
        let (last, parents) = self.segments.split_last()?;
        let mut current = record;
        for segment in parents {
            current = current.get(segment)?.as_object()?;
        }
        current.get(last)
    }

    /// Removes and returns the value at this path, walking nested objects.
    pub fn take(&self, record: &mut Map<String, Value>) -> Option<Value> {
        let (last, parents) = self.segments.split_last()?;
        let mut current = record;
        for segment in parents {
            current = current.get_mut(segment)?.as_object_mut()?;
        }
        current.remove(last)
    }

    /// Returns a mutable reference to the object that holds the last segment.
    pub fn parent_mut<'a>(
        &self,
        record: &'a mut Map<String, Value>,
    ) -> Option<&'a mut Map<String, Value>> {
        let (_, parents) = self.segments.split_last()?;
        let mut current = record;
        for segment in parents {
            current = current.get_mut(segment)?.as_object_mut()?;
        }
        Some(current)
    }

    /// Returns the last segment.
    pub fn leaf(&self) -> &str {
        // segments is never empty
        &self.segments[self.segments.len() - 1]
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl std::str::FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FieldPath::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_simple_and_nested() {
        assert_eq!(FieldPath::parse("name").unwrap().segments(), ["name"]);
        assert_eq!(
            FieldPath::parse("foo.bar.baz").unwrap().segments(),
            ["foo", "bar", "baz"]
        );
    }

    #[test]
    fn test_escaped_dot_is_literal() {
        let path = FieldPath::parse("a\\.b.c").unwrap();
        assert_eq!(path.segments(), ["a.b", "c"]);
        assert_eq!(path.canonical(), "a\\.b.c");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(FieldPath::parse(""), Err(PathError::Empty));
        assert!(matches!(FieldPath::parse("a..b"), Err(PathError::EmptySegment(_))));
        assert!(matches!(FieldPath::parse("a."), Err(PathError::EmptySegment(_))));
        assert!(matches!(FieldPath::parse("a\\"), Err(PathError::DanglingEscape(_))));
        assert!(matches!(
            FieldPath::parse("a\\x"),
            Err(PathError::InvalidEscape { found: 'x', .. })
        ));
    }

    #[test]
    fn test_resolve_prefers_flattened_key() {
        let record = obj(json!({"foo.bar": 1, "foo": {"bar": 2}}));
        let path = FieldPath::parse("foo.bar").unwrap();
        assert_eq!(path.resolve(&record), Some(&json!(1)));
        assert_eq!(path.walk(&record), Some(&json!(2)));
    }

    #[test]
    fn test_resolve_nested_fallback() {
        let record = obj(json!({"foo": {"bar": "hello"}}));
        let path = FieldPath::parse("foo.bar").unwrap();
        assert_eq!(path.resolve(&record), Some(&json!("hello")));
        assert_eq!(FieldPath::parse("foo.missing").unwrap().resolve(&record), None);
    }

    #[test]
    fn test_take_removes_nested_key() {
        let mut record = obj(json!({"a": {"b": 1, "c": 2}}));
        let taken = FieldPath::parse("a.b").unwrap().take(&mut record);
        assert_eq!(taken, Some(json!(1)));
        assert_eq!(Value::Object(record), json!({"a": {"c": 2}}));
    }

    #[test]
    fn test_prefix() {
        let a = FieldPath::parse("a").unwrap();
        let ab = FieldPath::parse("a.b").unwrap();
        assert!(a.is_prefix_of(&ab));
        assert!(!ab.is_prefix_of(&a));
        assert!(!a.is_prefix_of(&a));
    }

    #[test]
    fn test_serde_uses_canonical_form() {
        let path: FieldPath = serde_json::from_value(json!("x\\.y.z")).unwrap();
        assert_eq!(path.segments(), ["x.y", "z"]);
        assert_eq!(serde_json::to_value(&path).unwrap(), json!("x\\.y.z"));
        assert!(serde_json::from_value::<FieldPath>(json!("")).is_err());
    }
}
