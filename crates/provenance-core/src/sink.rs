//! Consumers of capture output.

use std::cell::RefCell;

use crate::clipboard::ClipboardSource;
use crate::diff::EditEvent;
use crate::events::LogEvent;

/// Receives everything a strategy produces.
///
/// All methods are best-effort and default to doing nothing, so a sink only
/// implements what its consumer understands.
pub trait CaptureSink {
    fn edit(&self, _event: &EditEvent) {}

    /// Full current text of a tracked editor.
    fn typed_text(&self, _text: &str) {}

    fn clipboard_source(&self, _source: &ClipboardSource) {}

    fn log_event(&self, _event: &LogEvent) {}
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl CaptureSink for NullSink {}

/// Collects everything; for tests and debugging.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub edits: RefCell<Vec<EditEvent>>,
    pub texts: RefCell<Vec<String>>,
    pub sources: RefCell<Vec<ClipboardSource>>,
    pub logs: RefCell<Vec<LogEvent>>,
}

impl CaptureSink for RecordingSink {
    fn edit(&self, event: &EditEvent) {
        self.edits.borrow_mut().push(event.clone());
    }

    fn typed_text(&self, text: &str) {
        self.texts.borrow_mut().push(text.to_string());
    }

    fn clipboard_source(&self, source: &ClipboardSource) {
        self.sources.borrow_mut().push(source.clone());
    }

    fn log_event(&self, event: &LogEvent) {
        self.logs.borrow_mut().push(event.clone());
    }
}
