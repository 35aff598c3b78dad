//! Bindings - live read/write access to one bound member (v0.1)
//!
//! A binding is derived from a descriptor path when its control is
//! materialized. It keeps the path and re-resolves it on every write and
//! refresh, so containers that are replaced wholesale (an array swapped for a
//! new one) are still found. A binding whose path did not resolve at
//! materialization is inert: reads return the default, writes do nothing.

use tracing::debug;

use crate::node::{Action, Node};
use crate::path::{Location, PathResolver};
use crate::present::format_number;
use crate::scope::Scope;

/// Result of a successful write
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Container after the write (the new root for keyless bindings)
    pub container: Node,
    pub key: Option<String>,
    /// Value as stored, after coercion
    pub value: Node,
}

/// Map a raw input value to its stored representation
///
/// - `true` / `false` / `null` pass through unchanged
/// - finite numbers, and text that parses as one, are stored as numbers
/// - everything else is stored as given (text stays text: `"true"` is not a
///   boolean)
pub fn coerce(raw: Node) -> Node {
    match raw {
        Node::Number(n) if !n.is_finite() => Node::Text(format_number(n)),
        Node::Text(text) => match parse_finite(&text) {
            Some(n) => Node::Number(n),
            None => Node::Text(text),
        },
        other => other,
    }
}

/// Finite number spelled by `text`, if any
pub fn parse_finite(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    path: Option<String>,
    resolver: PathResolver,
    location: Option<Location>,
}

impl Binding {
    /// Resolve `path` against the scope's current state
    pub fn resolve(resolver: &PathResolver, path: Option<&str>, scope: &Scope) -> Self {
        let location = scope.read(|globals| resolver.resolve(path, globals));
        Self {
            path: path.map(str::to_string),
            resolver: resolver.clone(),
            location,
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Whether the path resolved at materialization
    pub fn is_resolved(&self) -> bool {
        self.location.is_some()
    }

    pub fn key(&self) -> Option<&str> {
        self.location.as_ref().and_then(Location::key)
    }

    /// Current value; `default` when unresolved or the member is missing
    pub fn read(&self, scope: &Scope, default: &Node) -> Node {
        self.current(scope).unwrap_or_else(|| default.clone())
    }

    /// Current value by re-resolving the path; `None` for inert bindings or
    /// when the chain is broken right now
    pub fn current(&self, scope: &Scope) -> Option<Node> {
        self.location.as_ref()?;
        scope.read(|globals| {
            self.resolver
                .resolve(self.path.as_deref(), globals)?
                .read(globals)
        })
    }

    /// Coerce `raw` and store it; `None` when nothing was written
    pub fn write(&self, scope: &Scope, raw: Node) -> Option<Change> {
        self.location.as_ref()?;
        let value = coerce(raw);
        let change = scope.write(|globals| {
            let location = self.resolver.resolve(self.path.as_deref(), globals)?;
            let container = location.write(globals, value.clone())?;
            Some(Change {
                container,
                key: location.key().map(str::to_string),
                value,
            })
        });
        if change.is_none() {
            debug!(path = ?self.path, "write skipped, target not writable");
        }
        change
    }

    /// The callable currently stored at the path
    pub fn action(&self, scope: &Scope) -> Option<Action> {
        match self.current(scope)? {
            Node::Callable(action) => Some(action),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> Scope {
        Scope::new().with_root("model", json!({"x": 3.5, "list": [1, 2], "flag": false}))
    }

    fn bind(path: &str, scope: &Scope) -> Binding {
        Binding::resolve(&PathResolver::new("model"), Some(path), scope)
    }

    #[test]
    fn coerce_rules() {
        assert_eq!(coerce(Node::Bool(true)), Node::Bool(true));
        assert_eq!(coerce(Node::Null), Node::Null);
        assert_eq!(coerce(Node::from("5")), Node::from(5.0));
        assert_eq!(coerce(Node::from(" -2.5 ")), Node::from(-2.5));
        assert_eq!(coerce(Node::from("1e3")), Node::from(1000.0));
        assert_eq!(coerce(Node::from("true")), Node::from("true"));
        assert_eq!(coerce(Node::from("")), Node::from(""));
        assert_eq!(coerce(Node::from("inf")), Node::from("inf"));
        assert_eq!(coerce(Node::from("12px")), Node::from("12px"));
        assert_eq!(coerce(Node::from(f64::NAN)), Node::from("NaN"));
    }

    #[test]
    fn read_resolved() {
        let scope = scope();
        let binding = bind("$['x']", &scope);
        assert!(binding.is_resolved());
        assert_eq!(binding.read(&scope, &Node::Null), Node::from(3.5));
    }

    #[test]
    fn read_unresolved_returns_default() {
        let scope = scope();
        let binding = Binding::resolve(&PathResolver::new("model"), None, &scope);
        assert!(!binding.is_resolved());
        assert_eq!(binding.read(&scope, &Node::from("dflt")), Node::from("dflt"));

        let binding = bind("nowhere['x']", &scope);
        assert_eq!(binding.read(&scope, &Node::from(1.0)), Node::from(1.0));
    }

    #[test]
    fn write_round_trip() {
        let scope = scope();
        let binding = bind("$['x']", &scope);
        let change = binding.write(&scope, Node::from("42")).unwrap();
        assert_eq!(change.key.as_deref(), Some("x"));
        assert_eq!(change.value, Node::from(42.0));
        assert_eq!(change.container.get("x"), Some(&Node::from(42.0)));
        assert_eq!(binding.read(&scope, &Node::Null), Node::from(42.0));
    }

    #[test]
    fn write_text_stays_text() {
        let scope = scope();
        let binding = bind("$['flag']", &scope);
        binding.write(&scope, Node::from("false")).unwrap();
        assert_eq!(binding.read(&scope, &Node::Null), Node::from("false"));
        binding.write(&scope, Node::Bool(true)).unwrap();
        assert_eq!(binding.read(&scope, &Node::Null), Node::Bool(true));
    }

    #[test]
    fn write_unresolved_is_noop() {
        let scope = scope();
        let before = scope.snapshot();
        let binding = bind("$['missing']['x']", &scope);
        assert!(binding.write(&scope, Node::from(1.0)).is_none());
        assert_eq!(scope.snapshot(), before);
    }

    #[test]
    fn write_follows_replaced_container() {
        let scope = scope();
        let binding = bind("$['list'][0]", &scope);
        scope.write(|g| {
            g.get_mut("model").unwrap().set("list", Node::from(json!([7, 8])));
        });
        assert_eq!(binding.current(&scope), Some(Node::from(7.0)));
        binding.write(&scope, Node::from(9.0)).unwrap();
        let list = scope.get("model").unwrap().get("list").cloned().unwrap();
        assert_eq!(list.to_json(), json!([9, 8]));
    }

    #[test]
    fn out_of_range_values_are_stored_verbatim() {
        let scope = scope();
        let binding = bind("$['x']", &scope);
        binding.write(&scope, Node::from(1e9)).unwrap();
        assert_eq!(binding.read(&scope, &Node::Null), Node::from(1e9));
    }

    #[test]
    fn action_lookup() {
        let scope = scope();
        scope.write(|g| {
            g.get_mut("model").unwrap().set("go", Node::callable(|| {}));
        });
        assert!(bind("$['go']", &scope).action(&scope).is_some());
        assert!(bind("$['x']", &scope).action(&scope).is_none());
    }
}
