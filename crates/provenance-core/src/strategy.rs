//! The capture strategy contract.
//!
//! One strategy per editor family. The orchestrator owns the instances and
//! drives them through [`CaptureStrategy`]; nothing is looked up globally.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::CaptureError;
use crate::sink::CaptureSink;

/// Identity of a registered strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrategyId {
    Word,
    GoogleDocs,
    Generic,
}

impl StrategyId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Word => "word",
            StrategyId::GoogleDocs => "googleDocs",
            StrategyId::Generic => "generic",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline style properties a highlight may set. `None` leaves a property alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightStyle {
    pub border: Option<String>,
    pub box_shadow: Option<String>,
    pub outline: Option<String>,
}

/// Glow used while a tracked editor has focus.
pub const FOCUSED_SHADOW: &str = "0 0 15px rgba(0, 166, 126, 0.5)";

/// Glow used otherwise.
pub const RESTING_SHADOW: &str = "0 0 10px rgba(0, 166, 126, 0.3)";

impl HighlightStyle {
    /// Border-only style.
    pub fn border(border: impl Into<String>) -> Self {
        Self {
            border: Some(border.into()),
            ..Default::default()
        }
    }

    /// The "capture active" indicator.
    pub fn active() -> Self {
        Self {
            border: Some("3px solid #00a67e".to_string()),
            box_shadow: Some(RESTING_SHADOW.to_string()),
            outline: Some("none".to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.border.is_none() && self.box_shadow.is_none() && self.outline.is_none()
    }
}

/// Undoes exactly one highlight.
#[must_use = "dropping a Restore leaves the highlight applied"]
pub struct Restore(Option<Box<dyn FnOnce()>>);

impl Restore {
    pub fn new(undo: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(undo)))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    pub fn is_noop(&self) -> bool {
        self.0.is_none()
    }

    pub fn restore(mut self) {
        if let Some(undo) = self.0.take() {
            undo();
        }
    }

    /// Combine several restores; they run in reverse order of application.
    pub fn all(restores: Vec<Restore>) -> Self {
        if restores.iter().all(Restore::is_noop) {
            return Self::noop();
        }
        Self::new(move || {
            for r in restores.into_iter().rev() {
                r.restore();
            }
        })
    }
}

impl fmt::Debug for Restore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Restore")
            .field(&if self.0.is_some() { "pending" } else { "noop" })
            .finish()
    }
}

/// Selection offsets in UTF-16 units relative to an editor's text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Capability set every editor family implements.
///
/// `Node` is the host's element type and `Root` whatever discovery starts
/// from (a document or an element).
pub trait CaptureStrategy {
    type Node;
    type Root;

    fn id(&self) -> StrategyId;

    /// Pure hostname predicate.
    fn matches(&self, hostname: &str) -> bool;

    /// The catch-all strategy; it must be evaluated after all others.
    fn is_default(&self) -> bool {
        false
    }

    /// Discover editor elements under `root`.
    fn query_nodes(&mut self, root: &Self::Root) -> Vec<Self::Node>;

    fn extract_text(&self, node: &Self::Node) -> String;

    /// Start locating, observing and reporting to `sink`.
    fn initialize(&mut self, sink: Rc<dyn CaptureSink>) -> Result<(), CaptureError>;

    /// Undo everything `initialize` did. Safe to call repeatedly.
    fn cleanup(&mut self);

    /// Apply `style` to `node`, or to the strategy's own target when `None`.
    fn highlight(&mut self, style: &HighlightStyle, node: Option<&Self::Node>) -> Restore;

    /// Whether selections can be mapped to offsets for a document at `url`.
    fn can_track_selection(&self, _url: &str) -> bool {
        false
    }

    fn selection_range(&self, _node: &Self::Node) -> Option<SelectionRange> {
        None
    }

    /// Absolute offset where the next insertion lands.
    fn resolve_insertion(&self, node: &Self::Node) -> Option<usize> {
        self.selection_range(node).map(|range| range.start)
    }

    /// Whether an editor is currently attached and observed.
    fn is_active(&self) -> bool {
        false
    }
}
