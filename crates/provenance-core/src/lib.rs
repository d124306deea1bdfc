//! provenance-core: editor capture logic without browser dependencies.
//!
//! This crate provides:
//! - `diff` - single-hunk edit detection between text snapshots
//! - `fragments` / `walk` - canonical text for canvas and contenteditable editors
//! - `PageView` + `FrameSearch` - editor discovery across same-origin frames
//! - `acquire` - the bounded, cancellable search loop
//! - `CaptureStrategy` + `CaptureManager` - per-family strategies and their orchestration
//! - `ClipboardRecord` - clipboard provenance persisted between copy and paste

pub mod acquire;
pub mod clipboard;
pub mod config;
pub mod diff;
pub mod editable;
pub mod error;
pub mod events;
pub mod fragments;
pub mod hosts;
pub mod locator;
pub mod manager;
pub mod protocol;
pub mod reconcile;
pub mod sink;
pub mod strategy;
pub mod text;
pub mod walk;

pub use acquire::{
    AcquireOutcome, Acquisition, AcquisitionState, RetryPolicy, RetryTimer, acquire,
    acquire_cancellable,
};
pub use clipboard::{CLIPBOARD_STORAGE_KEY, ClipboardRecord, ClipboardSource, ForwardPolicy};
pub use config::CaptureConfig;
pub use diff::{EditEvent, EditKind, EditSpan, diff, diff_now};
pub use editable::{EditorKind, Framework};
pub use error::CaptureError;
pub use events::LogEvent;
pub use fragments::{TextFragment, canonical_text, sort_reading_order};
pub use locator::{
    EditorCandidate, EditorHandle, EditorLocator, FrameAccess, FrameSearch, LocatorDiagnostics,
    LocatorThresholds, PageLocator, PageView,
};
pub use manager::{CaptureManager, DynStrategy, StrategyRegistry};
pub use protocol::{FrameEnvelope, FrameMessage};
pub use reconcile::{PassOutcome, Reconciler};
pub use sink::{CaptureSink, NullSink, RecordingSink};
pub use smol_str::SmolStr;
pub use strategy::{CaptureStrategy, HighlightStyle, Restore, SelectionRange, StrategyId};
pub use walk::{WalkStep, reconstruct_with_newlines};

/// Milliseconds since the Unix epoch, 0 if the clock is before it.
pub fn now_ms() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
