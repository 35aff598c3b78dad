//! Error types with fix suggestions (v0.1)
//!
//! Nothing in the binding engine is fatal: the panel recovers from every
//! variant locally (inline message, dropped control, inert binding). The
//! typed errors exist so callers and logs can tell *why* something degraded.

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum CtrlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // ─────────────────────────────────────────────────────────────
    // Path errors (CTRL-010 to CTRL-012)
    // ─────────────────────────────────────────────────────────────
    #[error("CTRL-010: Invalid path syntax '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("CTRL-011: Unknown anchor in path '{path}' (expected $, globalThis or window)")]
    UnknownAnchor { path: String },

    #[error("CTRL-012: Path '{path}' breaks at '{segment}'")]
    BrokenPath { path: String, segment: String },

    // ─────────────────────────────────────────────────────────────
    // Descriptor errors (CTRL-020 to CTRL-022)
    // ─────────────────────────────────────────────────────────────
    #[error("CTRL-020: {0}")]
    DescriptorParse(#[from] serde_json::Error),

    #[error("CTRL-021: Control list must be a JSON array")]
    NotAList,

    #[error("CTRL-022: Invalid control at position {index}: {details}")]
    InvalidDescriptor { index: usize, details: String },

    // ─────────────────────────────────────────────────────────────
    // Panel errors (CTRL-030 to CTRL-031)
    // ─────────────────────────────────────────────────────────────
    #[error("CTRL-030: Index {index} out of range (panel has {len} controls)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("CTRL-031: Control {handle} is not attached to this panel")]
    Detached { handle: u64 },
}

impl FixSuggestion for CtrlError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            CtrlError::Io(_) => Some("Check file path and permissions"),
            CtrlError::ConfigParse(_) => Some("Check YAML syntax: indentation and quoting"),
            CtrlError::InvalidPath { .. } => {
                Some("Use bracketed, quoted keys like $['a']['b']")
            }
            CtrlError::UnknownAnchor { .. } => {
                Some("Start the path with $ (panel root) or globalThis")
            }
            CtrlError::BrokenPath { .. } => {
                Some("Make sure every intermediate member exists in the bound object")
            }
            CtrlError::DescriptorParse(_) => Some("Check JSON syntax of the control list"),
            CtrlError::NotAList => Some("Wrap the controls in [ ... ]"),
            CtrlError::InvalidDescriptor { .. } => {
                Some("Use a known kind: header, checkbox, numeric, text, colorPicker, rangeSlider, select, separator, button, output, meter, vector")
            }
            CtrlError::IndexOutOfRange { .. } => None,
            CtrlError::Detached { .. } => None,
        }
    }
}
