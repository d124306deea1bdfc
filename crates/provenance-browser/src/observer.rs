//! Mutation observation and debounced reconciliation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gloo_timers::callback::Timeout;
use tracing::{debug, trace};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{MutationObserver, MutationObserverInit, MutationRecord, Node};

use provenance_core::{CaptureError, CaptureSink, PassOutcome, Reconciler, now_ms};

use crate::dom::js_error;

/// Which mutations a [`DomObserver`] reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
    pub character_data: bool,
    pub attributes: bool,
    pub attribute_filter: Option<&'static [&'static str]>,
}

impl ObserveOptions {
    /// Structural changes anywhere below the target.
    pub fn tree() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Default::default()
        }
    }

    /// Direct children only.
    pub fn children() -> Self {
        Self {
            child_list: true,
            ..Default::default()
        }
    }

    /// Text edits anywhere below the target.
    pub fn text() -> Self {
        Self {
            character_data: true,
            ..Self::tree()
        }
    }

    /// Structure plus changes to the given attributes.
    pub fn attributes(filter: &'static [&'static str]) -> Self {
        Self {
            attributes: true,
            attribute_filter: Some(filter),
            ..Self::tree()
        }
    }

    fn to_init(self) -> MutationObserverInit {
        let init = MutationObserverInit::new();
        init.set_child_list(self.child_list);
        init.set_subtree(self.subtree);
        init.set_character_data(self.character_data);
        init.set_attributes(self.attributes);
        if let Some(filter) = self.attribute_filter {
            let names: js_sys::Array = filter.iter().map(|name| JsValue::from_str(name)).collect();
            init.set_attribute_filter(&names);
        }
        init
    }
}

type MutationCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

/// A connected `MutationObserver`. Disconnects when dropped.
pub struct DomObserver {
    observer: MutationObserver,
    _callback: MutationCallback,
}

impl DomObserver {
    pub fn observe(
        target: &Node,
        options: ObserveOptions,
        mut on_mutations: impl FnMut(Vec<MutationRecord>) + 'static,
    ) -> Result<Self, CaptureError> {
        let callback: MutationCallback =
            Closure::wrap(Box::new(move |records: js_sys::Array, _: MutationObserver| {
                let records = records
                    .iter()
                    .filter_map(|r| r.dyn_into::<MutationRecord>().ok())
                    .collect();
                on_mutations(records);
            }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

        let observer =
            MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(js_error)?;
        observer
            .observe_with_options(target, &options.to_init())
            .map_err(js_error)?;

        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    pub fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for DomObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Produces the canonical text of whatever a tracker watches.
pub type Extractor = Box<dyn Fn() -> Result<String, CaptureError>>;

/// Debounced extract-then-diff loop for one editor.
///
/// Each [`schedule`](ChangeTracker::schedule) call restarts the quiet period;
/// a burst of mutations collapses into one pass. Passes are serialized by the
/// [`Reconciler`] guard.
pub struct ChangeTracker {
    reconciler: RefCell<Reconciler>,
    pending: RefCell<Option<Timeout>>,
    quiet: Duration,
    extract: Extractor,
    sink: Rc<dyn CaptureSink>,
}

impl ChangeTracker {
    pub fn new(extract: Extractor, sink: Rc<dyn CaptureSink>, quiet: Duration) -> Rc<Self> {
        Rc::new(Self {
            reconciler: RefCell::new(Reconciler::new()),
            pending: RefCell::new(None),
            quiet,
            extract,
            sink,
        })
    }

    /// Take the current text as the baseline without emitting edits.
    /// With `publish`, the text also goes to the sink as typed text.
    pub fn prime(&self, publish: bool) {
        match (self.extract)() {
            Ok(text) => {
                debug!(len = text.len(), "initial text captured");
                if publish {
                    self.sink.typed_text(&text);
                }
                self.reconciler.borrow_mut().prime(text);
            }
            Err(e) => debug!(error = %e, "initial extraction failed"),
        }
    }

    /// (Re)start the quiet period; the pass runs when it elapses.
    pub fn schedule(self: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(self);
        let millis = u32::try_from(self.quiet.as_millis()).unwrap_or(u32::MAX);
        let timeout = Timeout::new(millis, move || {
            if let Some(tracker) = weak.upgrade() {
                tracker.reconcile();
            }
        });
        // Replacing the old timeout cancels it.
        self.pending.borrow_mut().replace(timeout);
    }

    /// Run one pass now and report its edits.
    pub fn reconcile(&self) -> PassOutcome {
        let outcome = self.reconciler.borrow_mut().run(&self.extract, now_ms());
        if let PassOutcome::Changed(events) = &outcome {
            for event in events {
                self.sink.edit(event);
            }
            let current = self.reconciler.borrow().previous().to_string();
            self.sink.typed_text(&current);
        } else {
            trace!(?outcome, "reconciliation pass");
        }
        outcome
    }

    /// Drop any pending pass.
    pub fn cancel(&self) {
        self.pending.borrow_mut().take();
    }

    /// Last committed snapshot.
    pub fn snapshot(&self) -> String {
        self.reconciler.borrow().previous().to_string()
    }
}

impl Drop for ChangeTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}
