//! Copy/cut recording and paste provenance.

use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use tracing::{debug, info};
use wasm_bindgen::JsCast;
use web_sys::{ClipboardEvent, Document, Event, EventTarget, Node};

use provenance_core::events::clipboard_summary;
use provenance_core::{CaptureConfig, CaptureSink, ClipboardRecord, ForwardPolicy, now_ms};

use crate::dom;
use crate::storage::ClipboardStore;

/// Clipboard payload of `event` for one MIME type, empty when absent.
pub fn clipboard_data(event: &ClipboardEvent, format: &str) -> String {
    event
        .clipboard_data()
        .and_then(|data| data.get_data(format).ok())
        .unwrap_or_default()
}

/// Short description of what a clipboard event carries.
pub fn describe_clipboard(event: &ClipboardEvent) -> String {
    clipboard_summary(
        &clipboard_data(event, "text/plain"),
        &clipboard_data(event, "text/html"),
    )
}

/// Document the event's target lives in, else the running frame's.
fn event_document(event: &Event) -> Option<Document> {
    event
        .target()
        .and_then(|target| match target.dyn_into::<Document>() {
            Ok(doc) => Some(doc),
            Err(target) => target
                .dyn_into::<Node>()
                .ok()
                .and_then(|node| node.owner_document()),
        })
        .or_else(|| dom::document().ok())
}

/// Which clipboard events a set of listeners handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipboardHooks {
    /// Copy and cut are recorded.
    Record,
    /// Pastes are reported.
    Report,
    Both,
}

impl ClipboardHooks {
    fn records(self) -> bool {
        matches!(self, ClipboardHooks::Record | ClipboardHooks::Both)
    }

    fn reports(self) -> bool {
        matches!(self, ClipboardHooks::Report | ClipboardHooks::Both)
    }
}

/// Writes a [`ClipboardRecord`] on copy/cut and reports it on paste.
pub struct ClipboardTracker {
    store: ClipboardStore,
    text_limit: usize,
    policy: ForwardPolicy,
    sink: Rc<dyn CaptureSink>,
}

impl ClipboardTracker {
    pub fn new(
        config: &CaptureConfig,
        policy: ForwardPolicy,
        sink: Rc<dyn CaptureSink>,
    ) -> Rc<Self> {
        Rc::new(Self {
            store: ClipboardStore::new(config.storage_key.clone()),
            text_limit: config.clipboard_text_limit,
            policy,
            sink,
        })
    }

    pub fn store(&self) -> &ClipboardStore {
        &self.store
    }

    /// Persist what a copy or cut put on the clipboard. Falls back to the
    /// document selection when the event carries no plain text.
    pub fn record_copy(&self, event: &ClipboardEvent) {
        let mut text = clipboard_data(event, "text/plain");
        if text.is_empty() {
            text = event_document(event)
                .and_then(|doc| doc.get_selection().ok().flatten())
                .map(|sel| String::from(sel.to_string()))
                .unwrap_or_default();
        }

        let record = ClipboardRecord::capture(
            &text,
            &dom::page_url(),
            &dom::page_title(),
            now_ms(),
            self.text_limit,
        );
        self.store.write(&record);
        info!(
            key = self.store.key(),
            url = %record.url,
            title = %record.title,
            snippet = record.snippet(),
            "stored clipboard record"
        );
    }

    /// Look up where pasted text came from and forward it if the policy
    /// allows. Completes asynchronously.
    pub fn report_paste(self: &Rc<Self>, event: &ClipboardEvent) {
        let pasted = clipboard_data(event, "text/plain");
        let tracker = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let Some(record) = tracker.store.read().await else {
                debug!("paste without clipboard record");
                return;
            };
            let now = now_ms();
            info!("clipboard source info\n{}", record.provenance_line(&pasted, now));

            let hostname = dom::hostname();
            if tracker.policy.allows(&record, &hostname) {
                tracker.sink.clipboard_source(&record.to_source(&pasted, now));
            } else {
                debug!(url = %record.url, "same-site paste not forwarded");
            }
        });
    }

    /// Handle any clipboard event according to `hooks`.
    pub fn handle(self: &Rc<Self>, event: &ClipboardEvent, hooks: ClipboardHooks) {
        let kind = event.type_();
        debug!(kind = %kind, data = %describe_clipboard(event), "clipboard event");
        match kind.as_str() {
            "paste" if hooks.reports() => self.report_paste(event),
            "copy" | "cut" if hooks.records() => self.record_copy(event),
            _ => {}
        }
    }

    /// Listen for paste/copy/cut on `target`. Dropping the listeners removes
    /// them.
    pub fn listen(
        self: &Rc<Self>,
        target: &EventTarget,
        hooks: ClipboardHooks,
        capture: bool,
    ) -> Vec<EventListener> {
        let options = if capture {
            EventListenerOptions::run_in_capture_phase()
        } else {
            EventListenerOptions::default()
        };

        ["paste", "copy", "cut"]
            .into_iter()
            .filter(|kind| match *kind {
                "paste" => hooks.reports(),
                _ => hooks.records(),
            })
            .map(|kind| {
                let tracker = self.clone();
                EventListener::new_with_options(target, kind, options, move |event| {
                    if let Some(event) = event.dyn_ref::<ClipboardEvent>() {
                        tracker.handle(event, hooks);
                    }
                })
            })
            .collect()
    }
}
