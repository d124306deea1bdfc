//! Classification of generic editable elements.

use serde::{Deserialize, Serialize};

use crate::text::{parse_float_prefix, parse_int_prefix};

/// Line height assumed when computed style reports none.
pub const DEFAULT_LINE_HEIGHT: f64 = 16.0;

/// Rich text framework behind a contenteditable element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Framework {
    ProseMirror,
    Quill,
    Slate,
    DraftJs,
    /// Plain `<textarea>`.
    Native,
    Unknown,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::ProseMirror => "ProseMirror",
            Framework::Quill => "Quill",
            Framework::Slate => "Slate",
            Framework::DraftJs => "DraftJS",
            Framework::Native => "native",
            Framework::Unknown => "unknown-contenteditable",
        }
    }
}

/// Attributes framework detection looks at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditableTraits {
    pub class_list: Vec<String>,
    pub has_slate_attr: bool,
    pub has_draft_attr: bool,
    /// `data-editor-type`.
    pub editor_type: Option<String>,
    /// `data-editor`.
    pub editor: Option<String>,
}

impl EditableTraits {
    fn has_class(&self, class: &str) -> bool {
        self.class_list.iter().any(|c| c == class)
    }
}

pub fn detect_framework(traits: &EditableTraits) -> Framework {
    if traits.has_class("ProseMirror") {
        return Framework::ProseMirror;
    }
    if traits.has_class("ql-editor") {
        return Framework::Quill;
    }
    if traits.has_slate_attr {
        return Framework::Slate;
    }
    if traits.has_draft_attr {
        return Framework::DraftJs;
    }
    if traits.editor_type.as_deref() == Some("prosemirror")
        || traits.editor.as_deref() == Some("prosemirror")
    {
        return Framework::ProseMirror;
    }
    Framework::Unknown
}

/// Layout facts for the single-line check.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineMetrics {
    pub role: Option<String>,
    pub aria_multiline: Option<String>,
    /// Computed `line-height`, e.g. `"24px"` or `"normal"`.
    pub line_height: String,
    /// Computed `white-space`.
    pub white_space: String,
    pub client_height: f64,
}

impl LineMetrics {
    /// Line height in pixels, falling back to the default for `normal` or 0.
    pub fn line_height_px(&self) -> f64 {
        parse_float_prefix(&self.line_height)
            .filter(|h| *h != 0.0)
            .unwrap_or(DEFAULT_LINE_HEIGHT)
    }

    /// Whether the element only fits one line of text.
    pub fn is_single_line_height(&self) -> bool {
        self.client_height <= self.line_height_px() * 1.5
    }
}

/// Single-line editors are skipped: a textbox role without multiline, forced
/// `nowrap`, or a box only one line tall.
pub fn is_single_line(metrics: &LineMetrics) -> bool {
    let textbox = metrics.role.as_deref() == Some("textbox")
        && metrics.aria_multiline.as_deref() != Some("true");
    textbox || metrics.white_space.contains("nowrap") || metrics.is_single_line_height()
}

/// Whether a contenteditable element should be tracked.
pub fn tracks_contenteditable(framework: Framework, metrics: &LineMetrics) -> bool {
    framework == Framework::ProseMirror || !is_single_line(metrics)
}

/// A textarea's `rows` attribute decides if it is multi-line. Missing means
/// the browser default of 2; an unparsable value counts as multi-line.
pub fn textarea_is_multiline(rows: Option<&str>) -> bool {
    match rows {
        None => true,
        Some(raw) => parse_int_prefix(raw).is_none_or(|rows| rows > 1),
    }
}

/// Kind of a tracked generic editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    Textarea,
    ContentEditable,
}
