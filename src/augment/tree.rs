//! Path addressable object trees.

use super::labels::FieldLabel;
use super::meta::ObjectKind;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Separator between the parts of a compound value when rendered.
pub const COMPOUND_SEPARATOR: char = '\t';

pub const NIL_VALUE: &str = "<nil>";
pub const EMPTY_VALUE: &str = "<empty>";

/// A single leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    Compound(Vec<String>),
}

impl Value {
    pub fn str(value: impl Into<String>) -> Self {
        Value::Str(value.into())
    }

    pub fn compound<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Compound(parts.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Str(s) => parse_bool(s),
            _ => None,
        }
    }

    /// String form used in evaluation results.
    pub fn render(&self) -> String {
        match self {
            Value::Null => NIL_VALUE.to_string(),
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Time(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
            Value::Compound(parts) => parts.join(&COMPOUND_SEPARATOR.to_string()),
        }
    }
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// A node of an augmented object tree.
///
/// Children are reference counted so a cached tree can be extended by
/// copying only the path to the new child.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Values stored under one label. Scalars hold exactly one value, which is
    /// [`Value::Null`] when absent; multi-valued leaves may be empty.
    Leaf(Vec<Value>),
    Object(BTreeMap<&'static str, Arc<Node>>),
    Array(Vec<Arc<Node>>),
}

impl Node {
    pub fn as_object(&self) -> Option<&BTreeMap<&'static str, Arc<Node>>> {
        match self {
            Node::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_object()
            .and_then(|fields| fields.get(key))
            .map(|child| child.as_ref())
    }

    /// Values of a leaf directly under this object.
    pub fn leaf(&self, label: FieldLabel) -> Option<&[Value]> {
        match self.get(label.as_str()) {
            Some(Node::Leaf(values)) => Some(values),
            _ => None,
        }
    }

    pub fn elements(&self) -> &[Arc<Node>] {
        match self {
            Node::Array(elements) => elements,
            _ => &[],
        }
    }
}

/// Incrementally assembles an object node.
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    fields: BTreeMap<&'static str, Arc<Node>>,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, label: FieldLabel, value: Value) -> Self {
        self.fields
            .insert(label.as_str(), Arc::new(Node::Leaf(vec![value])));
        self
    }

    pub fn string(self, label: FieldLabel, value: &str) -> Self {
        self.scalar(label, Value::str(value))
    }

    /// Stores a string, or null when it is empty.
    pub fn optional_string(self, label: FieldLabel, value: &str) -> Self {
        if value.is_empty() {
            self.scalar(label, Value::Null)
        } else {
            self.string(label, value)
        }
    }

    pub fn boolean(self, label: FieldLabel, value: bool) -> Self {
        self.scalar(label, Value::Bool(value))
    }

    pub fn number(self, label: FieldLabel, value: f64) -> Self {
        self.scalar(label, Value::Float(value))
    }

    pub fn integer(self, label: FieldLabel, value: i64) -> Self {
        self.scalar(label, Value::Int(value))
    }

    pub fn time(self, label: FieldLabel, value: Option<DateTime<Utc>>) -> Self {
        self.scalar(label, value.map_or(Value::Null, Value::Time))
    }

    pub fn set(mut self, label: FieldLabel, values: Vec<Value>) -> Self {
        self.fields.insert(label.as_str(), Arc::new(Node::Leaf(values)));
        self
    }

    pub fn child(mut self, key: &'static str, node: Node) -> Self {
        self.fields.insert(key, Arc::new(node));
        self
    }

    pub fn array(self, key: &'static str, elements: Vec<Node>) -> Self {
        self.child(key, Node::Array(elements.into_iter().map(Arc::new).collect()))
    }

    pub fn build(self) -> Node {
        Node::Object(self.fields)
    }
}

/// An object tree tagged with the kind of object it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedObj {
    kind: ObjectKind,
    root: Arc<Node>,
}

impl AugmentedObj {
    pub fn new(kind: ObjectKind, root: Node) -> Self {
        Self {
            kind,
            root: Arc::new(root),
        }
    }

    pub(crate) fn from_shared(kind: ObjectKind, root: Arc<Node>) -> Self {
        Self { kind, root }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub(crate) fn shared_root(&self) -> &Arc<Node> {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_value_render() {
        assert_eq!(Value::Null.render(), "<nil>");
        assert_eq!(Value::Float(6.0).render(), "6");
        assert_eq!(Value::Float(7.5).render(), "7.5");
        assert_eq!(Value::Int(22).render(), "22");
        assert_eq!(Value::Bool(true).render(), "true");
        assert_eq!(Value::compound(["ADD", "deploy.sh"]).render(), "ADD\tdeploy.sh");
        let t = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(Value::Time(t).render(), "2020-01-02T03:04:05Z");
    }

    #[test]
    fn test_value_coercions() {
        assert_eq!(Value::str(" 1.5 ").as_f64(), Some(1.5));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::str("TRUE").as_bool(), Some(true));
        assert_eq!(Value::str("yes").as_bool(), None);
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_object_builder() {
        let node = ObjectBuilder::new()
            .string(FieldLabel::Namespace, "prod")
            .optional_string(FieldLabel::ServiceAccountName, "")
            .set(FieldLabel::AddCapabilities, vec![])
            .array("containers", vec![ObjectBuilder::new().build()])
            .build();

        assert_eq!(node.leaf(FieldLabel::Namespace), Some(&[Value::str("prod")][..]));
        assert_eq!(
            node.leaf(FieldLabel::ServiceAccountName),
            Some(&[Value::Null][..])
        );
        assert_eq!(node.leaf(FieldLabel::AddCapabilities), Some(&[][..]));
        assert_eq!(node.get("containers").map(|c| c.elements().len()), Some(1));
        assert!(node.get("missing").is_none());
    }
}
