//! Display values and formatting
//!
//! What a control shows is kept as a [`DisplayValue`] so refreshes can compare
//! against it and skip redundant display writes.

use std::fmt;

use crate::node::Node;

#[derive(Debug, Clone)]
pub enum DisplayValue {
    Empty,
    Text(String),
    Flag(bool),
    Number(f64),
    Fields(Vec<String>),
}

impl PartialEq for DisplayValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DisplayValue::Empty, DisplayValue::Empty) => true,
            (DisplayValue::Text(a), DisplayValue::Text(b)) => a == b,
            (DisplayValue::Flag(a), DisplayValue::Flag(b)) => a == b,
            // NaN shown twice is the same display
            (DisplayValue::Number(a), DisplayValue::Number(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            (DisplayValue::Fields(a), DisplayValue::Fields(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Empty => Ok(()),
            DisplayValue::Text(s) => f.write_str(s),
            DisplayValue::Flag(true) => f.write_str("[x]"),
            DisplayValue::Flag(false) => f.write_str("[ ]"),
            DisplayValue::Number(n) => f.write_str(&format_number(*n)),
            DisplayValue::Fields(fields) => write!(f, "({})", fields.join(", ")),
        }
    }
}

/// Shortest form of a number: `3` rather than `3.0`
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

/// Fixed fraction digits (`fractions: 2` → `3.14`), ties away from zero
pub fn format_fixed(n: f64, fractions: u32) -> String {
    if !n.is_finite() {
        return format_number(n);
    }
    format!("{:.*}", fractions as usize, round_to(n, fractions))
}

/// Round to `fractions` digits, keeping the result a number
///
/// Exact ties go away from zero (`0.125` → `0.13`), unlike `{:.2}` which
/// rounds them to even.
pub fn round_to(n: f64, fractions: u32) -> f64 {
    let scale = 10f64.powi(fractions.min(300) as i32);
    let scaled = n * scale;
    if !scaled.is_finite() {
        return n;
    }
    scaled.round() / scale
}

/// Human-readable text for output controls
///
/// Strings print raw, arrays as compact JSON, objects with one top-level
/// member per line.
pub fn stringify(node: &Node) -> String {
    match node {
        Node::Text(s) => s.clone(),
        Node::Number(n) => format_number(*n),
        Node::Callable(_) => "[fn]".to_string(),
        Node::Map(map) if !map.is_empty() => {
            let members: Vec<String> = map
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{}:{}",
                        serde_json::Value::String(key.clone()),
                        value.to_json()
                    )
                })
                .collect();
            format!("{{\n  {}\n}}", members.join(",\n  "))
        }
        other => other.to_json().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_in_shortest_form() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn fixed_fractions() {
        assert_eq!(format_fixed(3.14159, 2), "3.14");
        assert_eq!(format_fixed(5.0, 2), "5.00");
        assert_eq!(format_fixed(2.0, 0), "2");
        assert_eq!(round_to(3.14159, 3), 3.142);
    }

    #[test]
    fn fixed_ties_round_away_from_zero() {
        assert_eq!(format_fixed(0.125, 2), "0.13");
        assert_eq!(format_fixed(-0.125, 2), "-0.13");
        assert_eq!(format_fixed(2.5, 0), "3");
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(1e300, 20), 1e300);
    }

    #[test]
    fn stringify_scalars_and_arrays() {
        assert_eq!(stringify(&Node::from("raw text")), "raw text");
        assert_eq!(stringify(&Node::from(json!([1, 2.5, "a"]))), r#"[1,2.5,"a"]"#);
        assert_eq!(stringify(&Node::Bool(true)), "true");
        assert_eq!(stringify(&Node::Null), "null");
        assert_eq!(stringify(&Node::callable(|| {})), "[fn]");
    }

    #[test]
    fn stringify_object_one_member_per_line() {
        let node = Node::from(json!({"a": 1, "b": {"c": [1, 2]}}));
        assert_eq!(stringify(&node), "{\n  \"a\":1,\n  \"b\":{\"c\":[1,2]}\n}");
        assert_eq!(stringify(&Node::map()), "{}");
    }

    #[test]
    fn display_equality_treats_nan_as_equal() {
        assert_eq!(DisplayValue::Number(f64::NAN), DisplayValue::Number(f64::NAN));
        assert_ne!(DisplayValue::Number(1.0), DisplayValue::Text("1".into()));
    }

    #[test]
    fn display_formatting() {
        assert_eq!(DisplayValue::Flag(true).to_string(), "[x]");
        assert_eq!(
            DisplayValue::Fields(vec!["1".into(), "2".into()]).to_string(),
            "(1, 2)"
        );
        assert_eq!(DisplayValue::Number(4.0).to_string(), "4");
    }
}
