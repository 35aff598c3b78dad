//! Auto-generation of controls from an object's shape
//!
//! Best effort: public members of the root map become controls by value type
//! (boolean → checkbox, number → numeric, colour hex → colorPicker,
//! other strings → text). Members starting with `_` are private and skipped,
//! as is anything else.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::descriptor::{ControlKind, Descriptor};
use crate::node::Node;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid colour regex")
});

pub fn is_hex_color(text: &str) -> bool {
    HEX_COLOR.is_match(text)
}

/// `$['key']`, quoted so the key survives parsing; `None` if it can't be
pub fn member_path(key: &str) -> Option<String> {
    if !key.contains('\'') {
        Some(format!("$['{key}']"))
    } else if !key.contains('"') {
        Some(format!("$[\"{key}\"]"))
    } else {
        None
    }
}

/// Descriptors for the members of `root`
pub fn descriptors_from(root: &Node) -> Vec<Descriptor> {
    let Node::Map(members) = root else {
        return Vec::new();
    };

    members
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .filter_map(|(key, value)| {
            let kind = match value {
                Node::Bool(_) => ControlKind::Checkbox,
                Node::Number(_) => ControlKind::Numeric,
                Node::Text(s) if is_hex_color(s) => ControlKind::ColorPicker,
                Node::Text(_) => ControlKind::Text,
                _ => return None,
            };
            let path = member_path(key)?;
            Some(Descriptor::new(kind).with_label(key.as_str()).with_path(path))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_members_by_type() {
        let root = Node::from(json!({
            "visible": true,
            "speed": 1.5,
            "title": "demo",
            "tint": "#ff8800",
            "_secret": 1,
            "nested": {"a": 1},
            "list": [1]
        }));
        let descriptors = descriptors_from(&root);
        let summary: Vec<_> = descriptors
            .iter()
            .map(|d| (d.kind, d.label.as_str(), d.single_path().unwrap()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ControlKind::Checkbox, "visible", "$['visible']"),
                (ControlKind::Numeric, "speed", "$['speed']"),
                (ControlKind::Text, "title", "$['title']"),
                (ControlKind::ColorPicker, "tint", "$['tint']"),
            ]
        );
    }

    #[test]
    fn non_map_root_yields_nothing() {
        assert!(descriptors_from(&Node::from(3.0)).is_empty());
    }

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#abc"));
        assert!(is_hex_color("#A0B1C2"));
        assert!(!is_hex_color("#abcd"));
        assert!(!is_hex_color("red"));
    }

    #[test]
    fn member_paths_quote_safely() {
        assert_eq!(member_path("it's").as_deref(), Some("$[\"it's\"]"));
        assert!(member_path("a'\"b").is_none());
    }
}
