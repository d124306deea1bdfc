//! `postMessage` transport between frames.

use std::rc::Rc;

use gloo_events::EventListener;
use tracing::{debug, info};
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, Window};

use provenance_core::protocol::{FrameEnvelope, FrameMessage};
use provenance_core::{CaptureError, CaptureSink};

use crate::dom::{self, js_error, serde_error};

/// Post `message` to the parent window. A no-op in the top frame.
pub fn post_to_parent(message: &FrameMessage) -> Result<(), CaptureError> {
    let window = dom::window()?;
    let Some(parent) = window.parent().map_err(js_error)? else {
        return Ok(());
    };
    if parent == window {
        return Ok(());
    }
    let envelope = serde_wasm_bindgen::to_value(&FrameEnvelope::new(message.clone()))
        .map_err(serde_error)?;
    parent.post_message(&envelope, "*").map_err(js_error)
}

/// Decode a posted value, ignoring anything that is not one of ours.
pub fn decode(data: wasm_bindgen::JsValue) -> Option<FrameMessage> {
    serde_wasm_bindgen::from_value::<FrameEnvelope>(data)
        .ok()
        .and_then(FrameEnvelope::into_message)
}

/// Receives messages from child frames and feeds them to a sink.
pub struct FrameListener {
    _listener: EventListener,
}

impl FrameListener {
    pub fn install(window: &Window, sink: Rc<dyn CaptureSink>) -> Self {
        let listener = EventListener::new(window, "message", move |event| {
            let Some(event) = event.dyn_ref::<MessageEvent>() else {
                return;
            };
            let Some(message) = decode(event.data()) else {
                return;
            };
            match message {
                FrameMessage::EditorAttached { frame_url } => {
                    info!(frame_url, "editor attached in child frame");
                }
                FrameMessage::Edit { event } => sink.edit(&event),
                FrameMessage::TypedText { text } => sink.typed_text(&text),
            }
        });
        debug!("frame message listener installed");
        Self {
            _listener: listener,
        }
    }
}
