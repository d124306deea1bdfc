//! Word for the web.
//!
//! The editor is a contenteditable surface that may live in a same-origin
//! iframe and may be replaced while the document is open. It is found with
//! the bounded search, then observed until it leaves the DOM, at which point
//! the search starts over.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use futures_util::future::AbortHandle;
use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{ClipboardEvent, Document, Element, Event, EventTarget, Node};

use provenance_core::events::LOGGED_EVENT_TYPES;
use provenance_core::hosts::{is_word_host, word_tracks_selection};
use provenance_core::locator::is_word_content_marker;
use provenance_core::protocol::FrameMessage;
use provenance_core::{
    AcquireOutcome, Acquisition, CaptureConfig, CaptureError, CaptureSink, CaptureStrategy,
    EditorLocator, ForwardPolicy, HighlightStyle, PageLocator, Restore, SelectionRange,
    StrategyId, acquire_cancellable,
};

use crate::clipboard::{ClipboardHooks, ClipboardTracker};
use crate::dom::{self, QueryRoot};
use crate::extract;
use crate::frames;
use crate::observer::{ChangeTracker, DomObserver, ObserveOptions};
use crate::page::BrowserPage;
use crate::style::{Indicator, apply_style};
use crate::timer::GlooTimer;

use super::log_event;

/// Where the indicator goes, most specific first.
const PAGE_CONTENT_SELECTORS: &[&str] = &[
    ".PageContent",
    "#PageContent",
    r#"[class*="PageContent"], [id*="PageContent"]"#,
];

/// The `PageContent` container around `editor`, else the editor itself.
fn indicator_target(editor: &Element, doc: &Document) -> Element {
    editor
        .closest(".PageContent")
        .ok()
        .flatten()
        .or_else(|| {
            PAGE_CONTENT_SELECTORS
                .iter()
                .find_map(|selector| doc.query_selector(selector).ok().flatten())
        })
        .unwrap_or_else(|| editor.clone())
}

/// Whether an event target belongs to the editor: the editor, a descendant,
/// or something inside Word's content containers.
fn within_editor(editor: &Element, event: &Event) -> bool {
    let Some(node) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) else {
        return false;
    };
    if editor.contains(Some(&node)) {
        return true;
    }

    let mut current = match node.dyn_into::<Element>() {
        Ok(el) => Some(el),
        Err(node) => node.parent_element(),
    };
    while let Some(el) = current {
        let class = el.get_attribute("class").unwrap_or_default();
        if is_word_content_marker(&class, &el.id()) {
            return true;
        }
        current = el.parent_element();
    }
    false
}

/// Everything hung on one located editor.
struct Attachment {
    editor: Element,
    tracker: Rc<ChangeTracker>,
    indicator: Option<Indicator>,
    _listeners: Vec<EventListener>,
    _content: DomObserver,
    _detach: Option<DomObserver>,
    _settle: Timeout,
}

impl Attachment {
    fn release(self) {
        self.tracker.cancel();
        if let Some(indicator) = self.indicator {
            indicator.remove();
        }
        debug!("word editor released");
    }
}

struct WordState {
    config: CaptureConfig,
    acquisition: Acquisition,
    sink: Option<Rc<dyn CaptureSink>>,
    clipboard: Option<Rc<ClipboardTracker>>,
    search: Option<AbortHandle>,
    /// Bumped per search so a cancelled run cannot settle a newer one.
    generation: u64,
    attachment: Option<Attachment>,
    /// Document-level copy/cut recorders.
    document_listeners: Vec<EventListener>,
}

impl WordState {
    fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            acquisition: Acquisition::new(),
            sink: None,
            clipboard: None,
            search: None,
            generation: 0,
            attachment: None,
            document_listeners: Vec::new(),
        }
    }
}

/// Capture for Word for the web.
pub struct WordStrategy {
    state: Rc<RefCell<WordState>>,
}

impl WordStrategy {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(WordState::new(config))),
        }
    }

    /// The editor currently attached, if any.
    pub fn editor(&self) -> Option<Element> {
        self.state
            .borrow()
            .attachment
            .as_ref()
            .map(|a| a.editor.clone())
    }
}

/// Kick off the retry loop unless one is already running.
fn start_search(state: &Rc<RefCell<WordState>>) {
    let (policy, thresholds, generation) = {
        let mut s = state.borrow_mut();
        if !s.acquisition.begin_search() {
            debug!(state = ?s.acquisition.state(), "search not started");
            return;
        }
        s.generation += 1;
        (s.config.retry_policy(), s.config.thresholds(), s.generation)
    };

    let page = match BrowserPage::current() {
        Ok(page) => page,
        Err(e) => {
            warn!(error = %e, "no page to search");
            state.borrow_mut().acquisition.fail();
            return;
        }
    };

    let (handle, registration) = AbortHandle::new_pair();
    state.borrow_mut().search = Some(handle);

    let weak = Rc::downgrade(state);
    wasm_bindgen_futures::spawn_local(async move {
        let locator = PageLocator::new(page, thresholds);
        let outcome = acquire_cancellable(&locator, &GlooTimer, &policy, registration).await;

        let Some(state) = weak.upgrade() else {
            return;
        };
        {
            let mut s = state.borrow_mut();
            if s.generation != generation {
                return;
            }
            s.search = None;
            s.acquisition.settle(&outcome);
        }
        if let AcquireOutcome::Found { handle, attempts } = outcome {
            debug!(attempts, "attaching to word editor");
            if let Err(e) = attach(&state, handle.element, handle.document) {
                warn!(error = %e, "failed to attach to word editor");
                state.borrow_mut().acquisition.fail();
            }
        }
    });
}

fn editor_listeners(
    editor: &Element,
    tracker: &Rc<ChangeTracker>,
    clipboard: &Rc<ClipboardTracker>,
    sink: &Rc<dyn CaptureSink>,
) -> Vec<EventListener> {
    let mut listeners: Vec<EventListener> = LOGGED_EVENT_TYPES
        .iter()
        .map(|kind| {
            let editor_ref = editor.clone();
            let clipboard = clipboard.clone();
            let sink = sink.clone();
            EventListener::new(editor, *kind, move |event| {
                if !within_editor(&editor_ref, event) {
                    return;
                }
                let record = log_event(event, extract::selection_range(&editor_ref));
                sink.log_event(&record);
                if let Some(clip) = event.dyn_ref::<ClipboardEvent>() {
                    if event.type_() == "paste" {
                        clipboard.report_paste(clip);
                    }
                }
            })
        })
        .collect();

    for kind in ["beforeinput", "input"] {
        let tracker = tracker.clone();
        listeners.push(EventListener::new(editor, kind, move |_| tracker.schedule()));
    }
    listeners
}

/// Wire listeners, observers and the indicator onto a found editor.
fn attach(
    state: &Rc<RefCell<WordState>>,
    editor: Element,
    document: Document,
) -> Result<(), CaptureError> {
    let (config, sink, clipboard) = {
        let s = state.borrow();
        let sink = s.sink.clone().ok_or(CaptureError::Detached)?;
        let clipboard = s.clipboard.clone().ok_or(CaptureError::Detached)?;
        (s.config.clone(), sink, clipboard)
    };

    let text_source = editor.clone();
    let tracker = ChangeTracker::new(
        Box::new(move || Ok(text_source.text_content().unwrap_or_default())),
        sink.clone(),
        config.debounce(),
    );
    tracker.prime(true);

    let mut listeners = editor_listeners(&editor, &tracker, &clipboard, &sink);
    let script_document = dom::document()?;
    if document != script_document {
        listeners.extend(clipboard.listen(&document, ClipboardHooks::Record, true));
    }

    let scheduler = tracker.clone();
    let content = DomObserver::observe(&editor, ObserveOptions::text(), move |_| {
        scheduler.schedule();
    })?;

    let detach = match document.body() {
        Some(body) => {
            let watched = editor.clone();
            let weak = Rc::downgrade(state);
            Some(DomObserver::observe(&body, ObserveOptions::tree(), move |_| {
                if !watched.is_connected() {
                    schedule_detach(weak.clone());
                }
            })?)
        }
        None => None,
    };

    let settle_tracker = Rc::downgrade(&tracker);
    let settle_ms = u32::try_from(config.initial_settle_ms).unwrap_or(u32::MAX);
    let settle = Timeout::new(settle_ms, move || {
        if let Some(tracker) = settle_tracker.upgrade() {
            tracker.reconcile();
        }
    });

    let target = indicator_target(&editor, &document);
    let focus_source: &EventTarget = editor.as_ref();
    let indicator = Indicator::attach(&target, focus_source, ("focus", "blur"));

    info!(
        tag = %editor.tag_name(),
        id = %editor.id(),
        "word editor attached"
    );
    if !dom::is_top_frame(&dom::window()?) {
        let message = FrameMessage::EditorAttached {
            frame_url: dom::page_url(),
        };
        if let Err(e) = frames::post_to_parent(&message) {
            debug!(error = %e, "could not announce editor to parent");
        }
    }

    let previous = state.borrow_mut().attachment.replace(Attachment {
        editor,
        tracker,
        indicator: Some(indicator),
        _listeners: listeners,
        _content: content,
        _detach: detach,
        _settle: settle,
    });
    if let Some(previous) = previous {
        previous.release();
    }
    Ok(())
}

/// Tear down and search again. Runs outside the observer callback that
/// noticed the removal, since that callback is owned by the attachment.
fn schedule_detach(weak: Weak<RefCell<WordState>>) {
    wasm_bindgen_futures::spawn_local(async move {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let released = {
            let mut s = state.borrow_mut();
            if !s.acquisition.detach() {
                return;
            }
            s.attachment.take()
        };
        if let Some(attachment) = released {
            attachment.release();
        }
        info!("word editor detached, searching again");
        start_search(&state);
    });
}

impl CaptureStrategy for WordStrategy {
    type Node = Element;
    type Root = QueryRoot;

    fn id(&self) -> StrategyId {
        StrategyId::Word
    }

    fn matches(&self, hostname: &str) -> bool {
        is_word_host(hostname)
    }

    fn query_nodes(&mut self, root: &QueryRoot) -> Vec<Element> {
        if let Some(editor) = self.editor() {
            return vec![editor];
        }
        let (Ok(window), Some(document)) = (dom::window(), root.document()) else {
            return Vec::new();
        };
        let thresholds = self.state.borrow().config.thresholds();
        PageLocator::new(BrowserPage::new(window, document), thresholds)
            .locate()
            .map(|handle| vec![handle.element])
            .unwrap_or_default()
    }

    fn extract_text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn initialize(&mut self, sink: Rc<dyn CaptureSink>) -> Result<(), CaptureError> {
        self.cleanup();
        let document = dom::document()?;
        {
            let mut s = self.state.borrow_mut();
            let clipboard = ClipboardTracker::new(&s.config, ForwardPolicy::Always, sink.clone());
            s.document_listeners = clipboard.listen(&document, ClipboardHooks::Record, true);
            s.clipboard = Some(clipboard);
            s.sink = Some(sink);
        }
        info!("word capture initializing");
        start_search(&self.state);
        Ok(())
    }

    fn cleanup(&mut self) {
        let released = {
            let mut s = self.state.borrow_mut();
            if let Some(search) = s.search.take() {
                search.abort();
            }
            s.document_listeners.clear();
            s.clipboard = None;
            s.sink = None;
            s.acquisition.reset();
            s.attachment.take()
        };
        if let Some(attachment) = released {
            attachment.release();
        }
    }

    fn highlight(&mut self, style: &HighlightStyle, node: Option<&Element>) -> Restore {
        let target = match node {
            Some(node) => node.clone(),
            None => {
                let Some(editor) = self.editor() else {
                    return Restore::noop();
                };
                match editor.owner_document() {
                    Some(doc) => indicator_target(&editor, &doc),
                    None => editor,
                }
            }
        };
        apply_style(&target, style)
    }

    fn can_track_selection(&self, url: &str) -> bool {
        word_tracks_selection(url)
    }

    fn selection_range(&self, node: &Element) -> Option<SelectionRange> {
        extract::selection_range(node)
    }

    fn is_active(&self) -> bool {
        self.state.borrow().acquisition.is_attached()
    }
}

impl Drop for WordStrategy {
    fn drop(&mut self) {
        self.cleanup();
    }
}
