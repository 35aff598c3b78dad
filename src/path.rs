//! Reference paths (v0.1)
//!
//! Supports:
//! - `$` (panel root reference, read/written as a whole)
//! - `$['a']['b']` / `$["a"][0]` (bracketed member keys)
//! - `globalThis['root']['a']`, `window[...]` (global namespace)
//!
//! Does NOT support:
//! - Dot notation: `$.a.b`
//! - Expressions inside brackets: `$['a'][i + 1]`

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::CtrlError;
use crate::node::Node;

/// Sigil naming the panel's root reference
pub const ROOT_SIGIL: &str = "$";

/// Anchors naming the global namespace itself
pub const GLOBAL_ANCHORS: [&str; 2] = ["globalThis", "window"];

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z_0-9]*$").expect("valid identifier regex"));

/// Whether `name` may name a root reference
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// `$`
    Root,
    /// `globalThis` / `window`
    Global,
}

/// A parsed (not yet resolved) reference path
#[derive(Debug, Clone, PartialEq)]
pub struct RefPath {
    pub anchor: Anchor,
    pub keys: Vec<String>,
}

/// Parse a reference path into its anchor and key segments
///
/// Examples:
/// - `"$"` → (Root, [])
/// - `"$['a'][\"b\"][0]"` → (Root, ["a", "b", "0"])
/// - `"window['cfg']"` → (Global, ["cfg"])
pub fn parse(path: &str) -> Result<RefPath, CtrlError> {
    let invalid = |reason: &str| CtrlError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let (anchor, mut rest) = if let Some(rest) = path.strip_prefix(ROOT_SIGIL) {
        (Anchor::Root, rest)
    } else if let Some(rest) = GLOBAL_ANCHORS.iter().find_map(|name| path.strip_prefix(name)) {
        (Anchor::Global, rest)
    } else {
        return Err(CtrlError::UnknownAnchor {
            path: path.to_string(),
        });
    };

    if !rest.is_empty() && !rest.starts_with('[') {
        return Err(match anchor {
            // `windowed['x']` is not the `window` anchor
            Anchor::Global => CtrlError::UnknownAnchor {
                path: path.to_string(),
            },
            Anchor::Root => invalid("expected '[' after anchor"),
        });
    }

    let mut keys = Vec::new();
    while let Some(after_open) = rest.strip_prefix('[') {
        let (key, after_key) = match after_open.chars().next() {
            Some(quote @ ('\'' | '"')) => {
                let body = &after_open[1..];
                let end = body
                    .find(quote)
                    .ok_or_else(|| invalid("unterminated quote"))?;
                (&body[..end], &body[end + 1..])
            }
            Some(_) => {
                let end = after_open
                    .find(']')
                    .ok_or_else(|| invalid("unbalanced brackets"))?;
                let key = &after_open[..end];
                if key.is_empty() || key.contains(['[', '\'', '"']) {
                    return Err(invalid("malformed key"));
                }
                (key, &after_open[end..])
            }
            None => return Err(invalid("unbalanced brackets")),
        };

        rest = after_key
            .strip_prefix(']')
            .ok_or_else(|| invalid("expected ']' after key"))?;
        keys.push(key.to_string());
    }

    if !rest.is_empty() {
        return Err(invalid("trailing characters"));
    }

    Ok(RefPath { anchor, keys })
}

/// A resolved binding target inside the global namespace
///
/// The container is found by walking `anchor_keys` then `parents` from the
/// global map; `key` is the bound member, or `None` when the anchor itself is
/// the bound value.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    anchor_keys: Vec<String>,
    parents: Vec<String>,
    key: Option<String>,
}

impl Location {
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn container_keys(&self) -> impl Iterator<Item = &String> {
        self.anchor_keys.iter().chain(self.parents.iter())
    }

    /// The container this location points into
    pub fn container<'a>(&self, globals: &'a Node) -> Option<&'a Node> {
        globals.walk(self.container_keys())
    }

    /// Current value, or `None` if the chain or member is missing
    pub fn read(&self, globals: &Node) -> Option<Node> {
        let container = self.container(globals)?;
        match &self.key {
            Some(key) => container.get(key).cloned(),
            None => Some(container.clone()),
        }
    }

    /// Store `value`, returning a snapshot of the container after the write
    ///
    /// A keyless location rooted at `$` replaces the whole root member; a
    /// keyless global location is read-only.
    pub fn write(&self, globals: &mut Node, value: Node) -> Option<Node> {
        match &self.key {
            Some(key) => {
                let keys: Vec<&String> = self.container_keys().collect();
                let container = globals.walk_mut(keys)?;
                if !container.set(key, value) {
                    return None;
                }
                Some(container.clone())
            }
            None => {
                let (last, init) = self.anchor_keys.split_last()?;
                let holder = globals.walk_mut(init)?;
                if !holder.set(last, value) {
                    return None;
                }
                holder.get(last).cloned()
            }
        }
    }
}

/// Resolves reference paths against a global namespace for one root name
#[derive(Debug, Clone, PartialEq)]
pub struct PathResolver {
    reference: Option<String>,
}

impl PathResolver {
    /// `reference` names the global member `$` stands for; names that are not
    /// identifiers leave `$` unresolvable
    pub fn new(reference: &str) -> Self {
        let reference = if is_identifier(reference) {
            Some(reference.to_string())
        } else {
            if !reference.is_empty() {
                warn!(reference, "root reference is not an identifier, $ paths stay unresolved");
            }
            None
        };
        Self { reference }
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Resolve `path` into a location whose container currently exists
    pub fn try_resolve(&self, path: &str, globals: &Node) -> Result<Location, CtrlError> {
        let parsed = parse(path)?;

        let anchor_keys = match parsed.anchor {
            Anchor::Global => Vec::new(),
            Anchor::Root => match &self.reference {
                Some(reference) => vec![reference.clone()],
                None => {
                    return Err(CtrlError::BrokenPath {
                        path: path.to_string(),
                        segment: ROOT_SIGIL.to_string(),
                    })
                }
            },
        };

        let mut keys = parsed.keys;
        let key = keys.pop();
        let location = Location {
            anchor_keys,
            parents: keys,
            key,
        };

        // Check the walk now so a broken chain yields an inert binding
        let mut current = globals;
        for segment in location.container_keys() {
            current = current.get(segment).ok_or_else(|| CtrlError::BrokenPath {
                path: path.to_string(),
                segment: segment.clone(),
            })?;
        }
        if location.key.is_some() && !current.is_container() {
            return Err(CtrlError::BrokenPath {
                path: path.to_string(),
                segment: location.key.clone().unwrap_or_default(),
            });
        }

        Ok(location)
    }

    /// Resolve an optional path; anything that fails is unresolved (`None`)
    pub fn resolve(&self, path: Option<&str>, globals: &Node) -> Option<Location> {
        let path = path?;
        match self.try_resolve(path, globals) {
            Ok(location) => Some(location),
            Err(err @ CtrlError::BrokenPath { .. }) => {
                debug!(path, error = %err, "path unresolved");
                None
            }
            Err(err) => {
                warn!(path, error = %err, "malformed path, binding left inert");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn globals() -> Node {
        Node::from(json!({
            "model": {"x": 1, "nested": {"y": [10, 20]}},
            "other": {"z": "zed"}
        }))
    }

    #[test]
    fn parse_root_only() {
        let parsed = parse("$").unwrap();
        assert_eq!(parsed.anchor, Anchor::Root);
        assert!(parsed.keys.is_empty());
    }

    #[test]
    fn parse_mixed_quotes_and_index() {
        let parsed = parse(r#"$['a']["b"][0]"#).unwrap();
        assert_eq!(parsed.keys, ["a", "b", "0"]);
    }

    #[test]
    fn parse_global_anchors() {
        assert_eq!(parse("globalThis['m']").unwrap().anchor, Anchor::Global);
        assert_eq!(parse("window").unwrap().anchor, Anchor::Global);
    }

    #[test]
    fn parse_rejects_unknown_anchor() {
        assert!(matches!(parse("model['x']"), Err(CtrlError::UnknownAnchor { .. })));
        assert!(matches!(parse("windowed['x']"), Err(CtrlError::UnknownAnchor { .. })));
        assert!(matches!(parse(""), Err(CtrlError::UnknownAnchor { .. })));
    }

    #[test]
    fn parse_rejects_malformed_brackets() {
        for bad in ["$['a'", "$['a]", "$[]", "$['a']x", "$x", "$['a'b]", "$[a[b]"] {
            assert!(
                matches!(parse(bad), Err(CtrlError::InvalidPath { .. })),
                "{bad} should be invalid"
            );
        }
    }

    #[test]
    fn parse_keeps_brackets_inside_quotes() {
        let parsed = parse("$['a]['][1]").unwrap();
        assert_eq!(parsed.keys, ["a][", "1"]);
    }

    #[test]
    fn resolve_member() {
        let g = globals();
        let resolver = PathResolver::new("model");
        let loc = resolver.try_resolve("$['x']", &g).unwrap();
        assert_eq!(loc.key(), Some("x"));
        assert_eq!(loc.read(&g), Some(Node::from(1.0)));
    }

    #[test]
    fn resolve_nested_index() {
        let g = globals();
        let resolver = PathResolver::new("model");
        let loc = resolver.try_resolve("$['nested']['y'][1]", &g).unwrap();
        assert_eq!(loc.read(&g), Some(Node::from(20.0)));
    }

    #[test]
    fn resolve_root_as_whole() {
        let g = globals();
        let resolver = PathResolver::new("model");
        let loc = resolver.try_resolve("$", &g).unwrap();
        assert_eq!(loc.key(), None);
        assert_eq!(loc.read(&g), g.get("model").cloned());
    }

    #[test]
    fn resolve_scalar_root_as_whole() {
        let g = Node::from(json!({"count": 3}));
        let loc = PathResolver::new("count").try_resolve("$", &g).unwrap();
        assert_eq!(loc.read(&g), Some(Node::from(3.0)));
    }

    #[test]
    fn resolve_global_anchor() {
        let g = globals();
        let resolver = PathResolver::new("model");
        let loc = resolver.try_resolve("globalThis['other']['z']", &g).unwrap();
        assert_eq!(loc.read(&g), Some(Node::from("zed")));
    }

    #[test]
    fn resolve_broken_chain_is_unresolved() {
        let g = globals();
        let resolver = PathResolver::new("model");
        assert!(matches!(
            resolver.try_resolve("$['missing']['x']", &g),
            Err(CtrlError::BrokenPath { .. })
        ));
        // traversing into a scalar
        assert!(resolver.resolve(Some("$['x']['y']"), &g).is_none());
    }

    #[test]
    fn resolve_missing_leaf_is_still_resolved() {
        let g = globals();
        let resolver = PathResolver::new("model");
        let loc = resolver.resolve(Some("$['fresh']"), &g).unwrap();
        assert_eq!(loc.read(&g), None);
    }

    #[test]
    fn resolve_without_valid_reference() {
        let g = globals();
        assert!(PathResolver::new("").resolve(Some("$['x']"), &g).is_none());
        assert!(PathResolver::new("9lives").resolve(Some("$['x']"), &g).is_none());
        assert!(PathResolver::new("nope").resolve(Some("$['x']"), &g).is_none());
        assert!(PathResolver::new("model").resolve(None, &g).is_none());
    }

    #[test]
    fn write_member_returns_container_snapshot() {
        let mut g = globals();
        let resolver = PathResolver::new("model");
        let loc = resolver.try_resolve("$['x']", &g).unwrap();
        let container = loc.write(&mut g, Node::from(5.0)).unwrap();
        assert_eq!(container.get("x"), Some(&Node::from(5.0)));
        assert_eq!(g.get("model").unwrap().get("x"), Some(&Node::from(5.0)));
    }

    #[test]
    fn write_whole_root_replaces_member() {
        let mut g = globals();
        let resolver = PathResolver::new("model");
        let loc = resolver.try_resolve("$", &g).unwrap();
        loc.write(&mut g, Node::from(7.0)).unwrap();
        assert_eq!(g.get("model"), Some(&Node::from(7.0)));
    }

    #[test]
    fn write_whole_global_is_refused() {
        let mut g = globals();
        let resolver = PathResolver::new("model");
        let loc = resolver.try_resolve("window", &g).unwrap();
        assert!(loc.write(&mut g, Node::Null).is_none());
        assert!(g.get("model").is_some());
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("_state"));
        assert!(is_identifier("model2"));
        assert!(!is_identifier("2model"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }
}
