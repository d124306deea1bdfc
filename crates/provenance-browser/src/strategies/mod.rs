//! The browser implementations of [`CaptureStrategy`], one per editor family.
//!
//! All three share the same shape: state behind `Rc<RefCell<..>>` so DOM
//! callbacks can reach it through a `Weak`, listeners and observers owned by
//! that state so dropping it detaches everything.

pub mod default;
pub mod google_docs;
pub mod word;

pub use default::{DefaultStrategy, TrackedEditor};
pub use google_docs::GoogleDocsStrategy;
pub use word::WordStrategy;

use wasm_bindgen::JsCast;
use web_sys::{ClipboardEvent, Element, Event, KeyboardEvent};

use provenance_core::{
    CaptureConfig, CaptureManager, CaptureStrategy, DynStrategy, LogEvent, SelectionRange,
    now_ms,
};

use crate::clipboard::describe_clipboard;
use crate::dom::QueryRoot;

/// A strategy over live DOM elements.
pub type BrowserStrategy = DynStrategy<Element, QueryRoot>;

pub type BrowserManager = CaptureManager<Element, QueryRoot>;

/// Every strategy in evaluation order; the catch-all comes last.
pub fn all_strategies(config: &CaptureConfig) -> Vec<BrowserStrategy> {
    vec![
        Box::new(WordStrategy::new(config.clone())),
        Box::new(GoogleDocsStrategy::new(config.clone())),
        Box::new(DefaultStrategy::new(config.clone())),
    ]
}

/// Register [`all_strategies`] with `manager`.
pub fn register_all(manager: &mut BrowserManager, config: &CaptureConfig) {
    for strategy in all_strategies(config) {
        let id = strategy.id();
        if !manager.register(strategy) {
            tracing::debug!(%id, "strategy already registered");
        }
    }
}

/// The element an event was dispatched to, if it was one.
pub(crate) fn target_element(event: &Event) -> Option<Element> {
    event.target().and_then(|t| t.dyn_into::<Element>().ok())
}

/// Activity record for a key or clipboard event.
pub(crate) fn log_event(event: &Event, selection: Option<SelectionRange>) -> LogEvent {
    let mut record = LogEvent::new(event.type_(), now_ms());
    record.key = event
        .dyn_ref::<KeyboardEvent>()
        .map(|key| key.key().into());
    record.data = event.dyn_ref::<ClipboardEvent>().map(describe_clipboard);
    record.target_tag = target_element(event).map(|el| el.tag_name().into());
    record.selection = selection;
    record
}
