//! Browser DOM layer for provenance capture.
//!
//! This crate implements the `provenance-core` abstractions over the live
//! DOM. It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `page`: `PageView` over real documents and same-origin iframes
//! - `extract`: SVG fragment collection, `innerText` and caret-walk text
//! - `observer`: MutationObserver wrapper and the debounced change tracker
//! - `clipboard` / `storage`: copy recording and paste provenance
//! - `sink` / `frames`: panel output and cross-frame relay
//! - `strategies`: Word, Google Docs and the generic fallback
//!
//! # Re-exports
//!
//! This crate re-exports `provenance-core` for convenience, so consumers
//! only need to depend on `provenance-browser`.

// Re-export core crate
pub use provenance_core;
pub use provenance_core::*;

pub mod clipboard;
pub mod dom;
pub mod extract;
pub mod frames;
pub mod observer;
pub mod page;
pub mod sink;
pub mod storage;
pub mod strategies;
pub mod style;
pub mod timer;

pub use clipboard::{ClipboardHooks, ClipboardTracker};
pub use dom::QueryRoot;
pub use frames::FrameListener;
pub use observer::{ChangeTracker, DomObserver, ObserveOptions};
pub use page::BrowserPage;
pub use sink::{FrameRelaySink, PanelSink};
pub use storage::ClipboardStore;
pub use strategies::{
    BrowserManager, BrowserStrategy, DefaultStrategy, GoogleDocsStrategy, WordStrategy,
    all_strategies, register_all,
};
pub use style::{Indicator, apply_style};
pub use timer::GlooTimer;
