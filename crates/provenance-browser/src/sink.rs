//! Sinks that hand capture output to the page.

use js_sys::{Function, Reflect};
use serde::Serialize;
use tracing::{debug, trace};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use provenance_core::protocol::FrameMessage;
use provenance_core::{CaptureSink, ClipboardSource, EditEvent, LogEvent};

use crate::frames;

/// Window property the panel registers itself under.
pub const PANEL_GLOBAL: &str = "wordCapturePanel";

/// Forwards to a JS panel object: `addEvent`, `addClipboardSource` and
/// `updateTypedText`.
///
/// Missing panels and missing methods are ignored, as are exceptions thrown
/// by the panel.
#[derive(Clone, Debug, Default)]
pub struct PanelSink {
    panel: Option<JsValue>,
}

impl PanelSink {
    /// Use `panel`, or look the panel up on `window` at call time when it is
    /// `undefined` or `null`.
    pub fn new(panel: JsValue) -> Self {
        let panel = (!panel.is_undefined() && !panel.is_null()).then_some(panel);
        Self { panel }
    }

    fn resolve(&self) -> Option<JsValue> {
        if let Some(panel) = &self.panel {
            return Some(panel.clone());
        }
        let window = web_sys::window()?;
        let panel = Reflect::get(&window, &JsValue::from_str(PANEL_GLOBAL)).ok()?;
        (!panel.is_undefined() && !panel.is_null()).then_some(panel)
    }

    fn call(&self, method: &str, arg: &JsValue) {
        let Some(panel) = self.resolve() else {
            trace!(method, "no panel");
            return;
        };
        let Some(func) = Reflect::get(&panel, &JsValue::from_str(method))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
        else {
            trace!(method, "panel method not available");
            return;
        };
        if let Err(e) = func.call1(&panel, arg) {
            debug!(method, error = ?e, "panel call failed");
        }
    }

    fn call_with<T: Serialize>(&self, method: &str, value: &T) {
        match serde_wasm_bindgen::to_value(value) {
            Ok(arg) => self.call(method, &arg),
            Err(e) => debug!(method, error = %e, "panel payload not serializable"),
        }
    }
}

impl CaptureSink for PanelSink {
    fn typed_text(&self, text: &str) {
        self.call("updateTypedText", &JsValue::from_str(text));
    }

    fn clipboard_source(&self, source: &ClipboardSource) {
        self.call_with("addClipboardSource", source);
    }

    fn log_event(&self, event: &LogEvent) {
        self.call_with("addEvent", event);
    }
}

/// Inside a child frame: everything goes to the local sink, and edits and
/// text are also posted to the parent frame.
pub struct FrameRelaySink<S> {
    local: S,
}

impl<S: CaptureSink> FrameRelaySink<S> {
    pub fn new(local: S) -> Self {
        Self { local }
    }

    fn relay(&self, message: FrameMessage) {
        if let Err(e) = frames::post_to_parent(&message) {
            debug!(error = %e, "frame relay failed");
        }
    }
}

impl<S: CaptureSink> CaptureSink for FrameRelaySink<S> {
    fn edit(&self, event: &EditEvent) {
        self.local.edit(event);
        self.relay(FrameMessage::Edit {
            event: event.clone(),
        });
    }

    fn typed_text(&self, text: &str) {
        self.local.typed_text(text);
        self.relay(FrameMessage::TypedText {
            text: text.to_string(),
        });
    }

    fn clipboard_source(&self, source: &ClipboardSource) {
        self.local.clipboard_source(source);
    }

    fn log_event(&self, event: &LogEvent) {
        self.local.log_event(event);
    }
}
