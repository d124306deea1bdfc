//! Canonical text for canvas-rendered documents.
//!
//! Canvas editors draw glyphs onto tiles and expose the text only as
//! positioned SVG rectangles carrying a label. Each rectangle becomes a
//! [`TextFragment`]; sorting fragments into reading order and joining them
//! with newlines yields the document's canonical text.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::text::parse_float_prefix;

/// Default vertical tolerance (in SVG units) for treating two fragments as
/// part of the same line.
pub const DEFAULT_Y_TOLERANCE: f64 = 5.0;

/// Selector for content tiles, excluding selection overlays.
pub const CONTENT_TILE_SELECTOR: &str =
    "div.kix-canvas-tile-content:not(.kix-canvas-tile-selection)";

/// Selector for labelled text rectangles inside a tile.
pub const TEXT_RECT_SELECTOR: &str = "rect[aria-label]";

static MATRIX_TRANSLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"matrix\(([^,]+),([^,]+),([^,]+),([^,]+),([^,]+),([^,]+)\)")
        .expect("matrix pattern is valid")
});

/// One positioned label fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
    /// Index of the containing content tile.
    pub page: usize,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64, page: usize) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            page,
        }
    }

    /// Build a fragment from a rectangle's `aria-label` and `transform`.
    ///
    /// Returns `None` when the transform carries no usable translation.
    pub fn from_rect(label: Option<String>, transform: &str, page: usize) -> Option<Self> {
        let (x, y) = parse_translation(transform)?;
        Some(Self::new(label.unwrap_or_default(), x, y, page))
    }
}

/// Extract the `(e, f)` translation of a `matrix(a,b,c,d,e,f)` transform.
pub fn parse_translation(transform: &str) -> Option<(f64, f64)> {
    let caps = MATRIX_TRANSLATION.captures(transform)?;
    let x = parse_float_prefix(caps.get(5)?.as_str())?;
    let y = parse_float_prefix(caps.get(6)?.as_str())?;
    Some((x, y))
}

/// Sort fragments into reading order: tile, then line, then x.
///
/// Fragments whose y lies within `y_tolerance` of the first fragment of the
/// current line belong to that line, so sub-pixel baseline jitter does not
/// split a line. The grouping keeps the ordering total.
pub fn sort_reading_order(fragments: &mut [TextFragment], y_tolerance: f64) {
    fragments.sort_by(|a, b| a.page.cmp(&b.page).then(a.y.total_cmp(&b.y)));

    let mut line_start = 0;
    for idx in 1..=fragments.len() {
        let breaks = match fragments.get(idx) {
            None => true,
            Some(frag) => {
                let anchor = &fragments[line_start];
                frag.page != anchor.page || frag.y - anchor.y > y_tolerance
            }
        };
        if breaks {
            fragments[line_start..idx].sort_by(|a, b| a.x.total_cmp(&b.x));
            line_start = idx;
        }
    }
}

/// Join fragments in reading order into the canonical document text.
pub fn canonical_text(mut fragments: Vec<TextFragment>, y_tolerance: f64) -> String {
    sort_reading_order(&mut fragments, y_tolerance);
    let parts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
    parts.join("\n")
}
