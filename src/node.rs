//! Node - the value model panels bind to (v0.1)
//!
//! A recursive tagged value (map / sequence / scalar / callable) that stands in
//! for a host object graph. Everything the resolver and bindings do is expressed
//! over this type, so the engine can be exercised without a real UI.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Ordered member map (declaration order is preserved)
pub type NodeMap = IndexMap<String, Node>;

/// Shared zero-argument callable (button targets)
#[derive(Clone)]
pub struct Action(Arc<dyn Fn() + Send + Sync>);

impl Action {
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn invoke(&self) {
        (self.0)()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Seq(Vec<Node>),
    Map(NodeMap),
    Callable(Action),
}

impl Node {
    /// Empty map node
    pub fn map() -> Self {
        Node::Map(NodeMap::new())
    }

    pub fn callable(f: impl Fn() + Send + Sync + 'static) -> Self {
        Node::Callable(Action::new(f))
    }

    /// Look up a member by key (map member, or decimal index into a sequence)
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(map) => map.get(key),
            Node::Seq(items) => items.get(parse_index(key)?),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        match self {
            Node::Map(map) => map.get_mut(key),
            Node::Seq(items) => items.get_mut(parse_index(key)?),
            _ => None,
        }
    }

    /// Store a member. Maps gain the key if absent; sequences only accept an
    /// existing index or the one-past-the-end slot. Returns false when the
    /// node cannot hold members.
    pub fn set(&mut self, key: &str, value: Node) -> bool {
        match self {
            Node::Map(map) => {
                map.insert(key.to_string(), value);
                true
            }
            Node::Seq(items) => match parse_index(key) {
                Some(i) if i < items.len() => {
                    items[i] = value;
                    true
                }
                Some(i) if i == items.len() => {
                    items.push(value);
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Walk a key sequence from this node
    pub fn walk<'a, I>(&self, keys: I) -> Option<&Node>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut current = self;
        for key in keys {
            current = current.get(key)?;
        }
        Some(current)
    }

    pub fn walk_mut<'a, I>(&mut self, keys: I) -> Option<&mut Node>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut current = self;
        for key in keys {
            current = current.get_mut(key)?;
        }
        Some(current)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Node::Map(_) | Node::Seq(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Loose truthiness used for checkbox display
    pub fn is_truthy(&self) -> bool {
        match self {
            Node::Null => false,
            Node::Bool(b) => *b,
            Node::Number(n) => *n != 0.0 && !n.is_nan(),
            Node::Text(s) => !s.is_empty(),
            Node::Seq(_) | Node::Map(_) | Node::Callable(_) => true,
        }
    }

    /// Short type name for logs
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::Text(_) => "string",
            Node::Seq(_) => "array",
            Node::Map(_) => "object",
            Node::Callable(_) => "function",
        }
    }

    /// Convert to JSON (callables and non-finite numbers become null)
    pub fn to_json(&self) -> Value {
        match self {
            Node::Null | Node::Callable(_) => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => number_to_json(*n),
            Node::Text(s) => Value::String(s.clone()),
            Node::Seq(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Map(map) => Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Integral numbers serialize as JSON integers so `5.0` prints as `5`
pub(crate) fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn parse_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => Node::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Node::Text(s),
            Value::Array(items) => Node::Seq(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => {
                Node::Map(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        Node::from(value.clone())
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Node::Number(n)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Number(n as f64)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
