//! Control descriptors (v0.1)
//!
//! A descriptor is the declarative, serializable description of one control:
//! a `kind` tag plus optional common and kind-specific fields.
//!
//! ```json
//! [
//!   {"kind": "numeric", "label": "x", "path": "$['x']", "fractions": 2},
//!   {"kind": "vector", "label": "pos", "path": ["$['p'][0]", "$['p'][1]"]}
//! ]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::CtrlError;
use crate::node::Node;
use crate::present;

/// Recognized control kinds (short markup tags are accepted as aliases)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlKind {
    #[serde(alias = "hdr")]
    Header,
    #[serde(alias = "chk")]
    Checkbox,
    #[serde(alias = "num")]
    Numeric,
    #[serde(alias = "txt")]
    Text,
    #[serde(alias = "col")]
    ColorPicker,
    #[serde(alias = "rng")]
    RangeSlider,
    #[serde(alias = "sel")]
    Select,
    #[serde(alias = "sep")]
    Separator,
    #[serde(alias = "btn")]
    Button,
    #[serde(alias = "out")]
    Output,
    #[serde(alias = "mtr")]
    Meter,
    #[serde(alias = "vec")]
    Vector,
}

/// What a control stores into its bound member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// No bound value (header, separator)
    None,
    Flag,
    Number,
    Text,
    /// One of the declared options
    Choice,
    /// One value per path
    Fields,
    /// Zero-argument callable
    Action,
    /// Read-only display of any value
    Any,
}

impl ControlKind {
    pub const ALL: [ControlKind; 12] = [
        ControlKind::Header,
        ControlKind::Checkbox,
        ControlKind::Numeric,
        ControlKind::Text,
        ControlKind::ColorPicker,
        ControlKind::RangeSlider,
        ControlKind::Select,
        ControlKind::Separator,
        ControlKind::Button,
        ControlKind::Output,
        ControlKind::Meter,
        ControlKind::Vector,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ControlKind::Header => "header",
            ControlKind::Checkbox => "checkbox",
            ControlKind::Numeric => "numeric",
            ControlKind::Text => "text",
            ControlKind::ColorPicker => "colorPicker",
            ControlKind::RangeSlider => "rangeSlider",
            ControlKind::Select => "select",
            ControlKind::Separator => "separator",
            ControlKind::Button => "button",
            ControlKind::Output => "output",
            ControlKind::Meter => "meter",
            ControlKind::Vector => "vector",
        }
    }

    /// Expected stored type. Writes are not validated against it; hosts that
    /// want stricter checks can use it.
    pub fn value_type(self) -> ValueType {
        match self {
            ControlKind::Header | ControlKind::Separator => ValueType::None,
            ControlKind::Checkbox => ValueType::Flag,
            ControlKind::Numeric | ControlKind::RangeSlider | ControlKind::Meter => {
                ValueType::Number
            }
            ControlKind::Text | ControlKind::ColorPicker => ValueType::Text,
            ControlKind::Select => ValueType::Choice,
            ControlKind::Vector => ValueType::Fields,
            ControlKind::Button => ValueType::Action,
            ControlKind::Output => ValueType::Any,
        }
    }

    /// Whether user input on this kind writes back to the bound object
    pub fn is_editable(self) -> bool {
        matches!(
            self,
            ControlKind::Checkbox
                | ControlKind::Numeric
                | ControlKind::Text
                | ControlKind::ColorPicker
                | ControlKind::RangeSlider
                | ControlKind::Select
                | ControlKind::Vector
        )
    }
}

impl std::fmt::Display for ControlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `path` is a single path, or a list of paths for `vector`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSpec {
    One(String),
    Many(Vec<String>),
}

impl PathSpec {
    /// The single path; the first one of a list
    pub fn single(&self) -> Option<&str> {
        match self {
            PathSpec::One(path) => Some(path),
            PathSpec::Many(paths) => paths.first().map(String::as_str),
        }
    }

    pub fn all(&self) -> Vec<&str> {
        match self {
            PathSpec::One(path) => vec![path.as_str()],
            PathSpec::Many(paths) => paths.iter().map(String::as_str).collect(),
        }
    }
}

/// Select options: a list of values, or an object `label → value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectOptions {
    List(Vec<Value>),
    Labeled(serde_json::Map<String, Value>),
}

impl SelectOptions {
    /// `(label, value)` pairs in declaration order
    pub fn pairs(&self) -> Vec<(String, Node)> {
        match self {
            SelectOptions::List(values) => values
                .iter()
                .map(|v| {
                    let node = Node::from(v);
                    (present::stringify(&node), node)
                })
                .collect(),
            SelectOptions::Labeled(map) => map
                .iter()
                .map(|(label, v)| (label.clone(), Node::from(v)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(alias = "sec")]
    pub kind: ControlKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathSpec>,

    /// Fallback shown while the path is unresolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,

    /// Header text / button caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    /// Fraction digits for numeric display and rounding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fractions: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<SelectOptions>,

    /// Per-field width of vector inputs (CSS length)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Descriptor {
    pub fn new(kind: ControlKind) -> Self {
        Self {
            kind,
            id: None,
            label: String::new(),
            path: None,
            value: None,
            disabled: false,
            text: None,
            min: None,
            max: None,
            step: None,
            fractions: None,
            unit: None,
            low: None,
            high: None,
            optimum: None,
            options: None,
            width: None,
        }
    }

    /// Parse one descriptor from JSON
    pub fn parse(json: &str) -> Result<Self, CtrlError> {
        serde_json::from_str(json).map_err(|e| CtrlError::InvalidDescriptor {
            index: 0,
            details: e.to_string(),
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(PathSpec::One(path.into()));
        self
    }

    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = Some(PathSpec::Many(paths.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_fractions(mut self, fractions: u32) -> Self {
        self.fractions = Some(fractions);
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_options(mut self, options: SelectOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Single bound path, if any
    pub fn single_path(&self) -> Option<&str> {
        self.path.as_ref().and_then(PathSpec::single)
    }

    /// Configured `value` as a node
    pub fn value_node(&self) -> Option<Node> {
        self.value.as_ref().map(Node::from)
    }
}

/// Parse a JSON array of descriptors
///
/// Elements that are not valid descriptors (unknown `kind`, wrong field types)
/// are dropped with a warning; a malformed document is an error.
pub fn parse_list(json: &str) -> Result<Vec<Descriptor>, CtrlError> {
    let document: Value = serde_json::from_str(json)?;
    let Value::Array(items) = document else {
        return Err(CtrlError::NotAList);
    };

    let mut descriptors = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Descriptor>(item) {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(e) => {
                let err = CtrlError::InvalidDescriptor {
                    index,
                    details: e.to_string(),
                };
                warn!(error = %err, "control dropped");
            }
        }
    }
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_numeric() {
        let d = Descriptor::parse(
            r#"{"kind":"numeric","label":"x","path":"$['x']","min":0,"max":10,"fractions":2,"unit":"m"}"#,
        )
        .unwrap();
        assert_eq!(d.kind, ControlKind::Numeric);
        assert_eq!(d.single_path(), Some("$['x']"));
        assert_eq!(d.fractions, Some(2));
        assert_eq!(d.max, Some(10.0));
        assert_eq!(d.unit.as_deref(), Some("m"));
        assert!(!d.disabled);
    }

    #[test]
    fn parse_short_tags() {
        let d = Descriptor::parse(r#"{"sec":"chk","path":"$['on']"}"#).unwrap();
        assert_eq!(d.kind, ControlKind::Checkbox);
        let d = Descriptor::parse(r#"{"kind":"col"}"#).unwrap();
        assert_eq!(d.kind, ControlKind::ColorPicker);
    }

    #[test]
    fn parse_unknown_kind_is_rejected() {
        let err = Descriptor::parse(r#"{"kind":"slider3d"}"#).unwrap_err();
        assert!(err.to_string().contains("CTRL-022"));
    }

    #[test]
    fn parse_vector_paths() {
        let d = Descriptor::parse(r#"{"kind":"vector","path":["$['p'][0]","$['p'][1]"]}"#)
            .unwrap();
        assert_eq!(d.path.as_ref().unwrap().all(), ["$['p'][0]", "$['p'][1]"]);
    }

    #[test]
    fn select_option_pairs() {
        let list = SelectOptions::List(vec![json!("red"), json!(2)]);
        assert_eq!(
            list.pairs(),
            vec![("red".to_string(), Node::from("red")), ("2".to_string(), Node::from(2.0))]
        );

        let d = Descriptor::parse(r#"{"kind":"select","options":{"Low":1,"High":9}}"#).unwrap();
        let pairs = d.options.unwrap().pairs();
        assert_eq!(pairs[0], ("Low".to_string(), Node::from(1.0)));
        assert_eq!(pairs[1], ("High".to_string(), Node::from(9.0)));
    }

    #[test]
    fn parse_list_drops_invalid_entries() {
        let list = parse_list(
            r#"[{"kind":"header","text":"A"},{"kind":"nope"},{"kind":"separator"}]"#,
        )
        .unwrap();
        let kinds: Vec<_> = list.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, [ControlKind::Header, ControlKind::Separator]);
    }

    #[test]
    fn parse_list_rejects_malformed_json() {
        assert!(matches!(parse_list("{not valid"), Err(CtrlError::DescriptorParse(_))));
        assert!(matches!(parse_list(r#"{"kind":"text"}"#), Err(CtrlError::NotAList)));
    }

    #[test]
    fn serialize_skips_defaults() {
        let d = Descriptor::new(ControlKind::Text)
            .with_label("name")
            .with_path("$['name']");
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value, json!({"kind": "text", "label": "name", "path": "$['name']"}));
    }

    #[test]
    fn value_types() {
        assert_eq!(ControlKind::Checkbox.value_type(), ValueType::Flag);
        assert_eq!(ControlKind::Meter.value_type(), ValueType::Number);
        assert!(ControlKind::Vector.is_editable());
        assert!(!ControlKind::Output.is_editable());
        assert_eq!(ControlKind::ALL.len(), 12);
    }
}
