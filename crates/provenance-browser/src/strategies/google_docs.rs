//! Google Docs.
//!
//! Docs renders text into per-page SVG tiles, so there is no editable DOM
//! to read. Text comes from the labelled rectangles in the content tiles and
//! changes are noticed by observing each paginated page.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use tracing::{debug, info};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlIFrameElement};

use provenance_core::fragments::CONTENT_TILE_SELECTOR;
use provenance_core::hosts::{docs_tracks_selection, is_google_docs_host};
use provenance_core::{
    CaptureConfig, CaptureError, CaptureSink, CaptureStrategy, ForwardPolicy, HighlightStyle,
    Restore, StrategyId,
};

use crate::clipboard::{ClipboardHooks, ClipboardTracker};
use crate::dom::{self, QueryRoot, elements};
use crate::extract::canvas_text;
use crate::observer::{ChangeTracker, DomObserver, ObserveOptions};
use crate::style::{Indicator, apply_style};

/// Hidden iframes that receive keyboard input.
pub const TYPING_FRAME_SELECTOR: &str = ".docs-texteventtarget-iframe";

/// Container the paginated pages are rendered into.
pub const TILE_ROOT_SELECTOR: &str = ".kix-rotatingtilemanager-content";

pub const PAGE_SELECTOR: &str = ".kix-page-paginated";

const EDITOR_SELECTOR: &str = ".kix-appview-editor";

/// Observers and listeners for one initialized document.
struct DocsSession {
    document: Document,
    tracker: Rc<ChangeTracker>,
    /// Waits for the tile root to appear.
    bootstrap: Option<DomObserver>,
    pages: Option<DomObserver>,
    /// One observer per paginated page.
    tiles: Vec<(Element, DomObserver)>,
    indicator: Option<Indicator>,
    _clipboard: Vec<EventListener>,
    _settle: Timeout,
}

impl DocsSession {
    fn release(self) {
        self.tracker.cancel();
        if let Some(indicator) = self.indicator {
            indicator.remove();
        }
        debug!(pages = self.tiles.len(), "docs observers released");
    }
}

/// Capture for Google Docs.
pub struct GoogleDocsStrategy {
    config: CaptureConfig,
    session: Rc<RefCell<Option<DocsSession>>>,
}

impl GoogleDocsStrategy {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            session: Rc::new(RefCell::new(None)),
        }
    }

    /// Number of pages currently observed.
    pub fn observed_pages(&self) -> usize {
        self.session
            .borrow()
            .as_ref()
            .map_or(0, |session| session.tiles.len())
    }
}

type SharedSession = Rc<RefCell<Option<DocsSession>>>;

/// Clipboard listeners on `doc` and inside every same-origin typing iframe.
fn clipboard_listeners(doc: &Document, clipboard: &Rc<ClipboardTracker>) -> Vec<EventListener> {
    let mut listeners = clipboard.listen(doc, ClipboardHooks::Both, true);

    let frames = doc
        .query_selector_all(TYPING_FRAME_SELECTOR)
        .map(|list| elements(&list))
        .unwrap_or_default();
    for frame in frames {
        let Ok(frame) = frame.dyn_into::<HtmlIFrameElement>() else {
            continue;
        };
        // Attaching to a cross-origin window throws.
        if frame.content_document().is_none() {
            debug!("typing iframe not accessible");
            continue;
        }
        if let Some(window) = frame.content_window() {
            listeners.extend(clipboard.listen(&window, ClipboardHooks::Both, true));
        }
    }
    listeners
}

/// Bring the per-page observers in line with the pages under `root`.
fn sync_pages(session: &SharedSession, root: &Element) {
    let pages = root
        .query_selector_all(PAGE_SELECTOR)
        .map(|list| elements(&list))
        .unwrap_or_default();

    let Some(tracker) = session.borrow().as_ref().map(|s| s.tracker.clone()) else {
        return;
    };

    let mut added = Vec::new();
    {
        let guard = session.borrow();
        let Some(current) = guard.as_ref() else {
            return;
        };
        for page in &pages {
            if current.tiles.iter().any(|(el, _)| el == page) {
                continue;
            }
            let scheduler = tracker.clone();
            match DomObserver::observe(
                page,
                ObserveOptions::attributes(&["aria-label"]),
                move |_| scheduler.schedule(),
            ) {
                Ok(observer) => added.push((page.clone(), observer)),
                Err(e) => debug!(error = %e, "page observer failed"),
            }
        }
    }

    let removed = {
        let mut guard = session.borrow_mut();
        let Some(current) = guard.as_mut() else {
            return;
        };
        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut current.tiles)
            .into_iter()
            .partition(|(el, _)| pages.contains(el));
        current.tiles = kept;
        current.tiles.extend(added);
        removed
    };
    if !removed.is_empty() {
        debug!(count = removed.len(), "stopped observing removed pages");
    }
    drop(removed);
}

/// Observe the tile root: page additions and removals, then each page's
/// tiles. Takes the initial snapshot once attached.
fn attach_pages(session: &SharedSession, root: Element) -> Result<(), CaptureError> {
    let weak: Weak<RefCell<Option<DocsSession>>> = Rc::downgrade(session);
    let watched = root.clone();
    let pages = DomObserver::observe(&root, ObserveOptions::children(), move |_| {
        if let Some(session) = weak.upgrade() {
            sync_pages(&session, &watched);
        }
    })?;

    let tracker = {
        let mut guard = session.borrow_mut();
        let Some(current) = guard.as_mut() else {
            return Ok(());
        };
        current.pages = Some(pages);
        current.tracker.clone()
    };
    sync_pages(session, &root);
    info!(pages = session.borrow().as_ref().map_or(0, |s| s.tiles.len()), "docs pages observed");
    tracker.prime(true);
    Ok(())
}

/// Wait for the tile root under `doc`'s body, then [`attach_pages`].
fn bootstrap(session: &SharedSession, doc: &Document) -> Result<(), CaptureError> {
    if let Some(root) = doc.query_selector(TILE_ROOT_SELECTOR).ok().flatten() {
        return attach_pages(session, root);
    }
    let Some(body) = doc.body() else {
        return Err(CaptureError::NotFound("document body".into()));
    };

    debug!("tile root not rendered yet, waiting");
    let weak = Rc::downgrade(session);
    let lookup = doc.clone();
    let observer = DomObserver::observe(&body, ObserveOptions::tree(), move |_| {
        let Some(root) = lookup.query_selector(TILE_ROOT_SELECTOR).ok().flatten() else {
            return;
        };
        let weak = weak.clone();
        // The bootstrap observer owns this callback; drop it from a task.
        wasm_bindgen_futures::spawn_local(async move {
            let Some(session) = weak.upgrade() else {
                return;
            };
            let finished = session.borrow_mut().as_mut().and_then(|s| s.bootstrap.take());
            let Some(finished) = finished else {
                return;
            };
            drop(finished);
            if let Err(e) = attach_pages(&session, root) {
                debug!(error = %e, "page observation failed");
            }
        });
    })?;

    if let Some(current) = session.borrow_mut().as_mut() {
        current.bootstrap = Some(observer);
    }
    Ok(())
}

impl CaptureStrategy for GoogleDocsStrategy {
    type Node = Element;
    type Root = QueryRoot;

    fn id(&self) -> StrategyId {
        StrategyId::GoogleDocs
    }

    fn matches(&self, hostname: &str) -> bool {
        is_google_docs_host(hostname)
    }

    fn query_nodes(&mut self, root: &QueryRoot) -> Vec<Element> {
        root.query_all(TYPING_FRAME_SELECTOR)
    }

    fn extract_text(&self, node: &Element) -> String {
        node.owner_document()
            .map(|doc| canvas_text(&doc, self.config.y_tolerance))
            .unwrap_or_default()
    }

    fn initialize(&mut self, sink: Rc<dyn CaptureSink>) -> Result<(), CaptureError> {
        self.cleanup();
        let doc = dom::document()?;

        let text_source = doc.clone();
        let tolerance = self.config.y_tolerance;
        let tracker = ChangeTracker::new(
            Box::new(move || Ok(canvas_text(&text_source, tolerance))),
            sink.clone(),
            self.config.debounce(),
        );

        let clipboard = ClipboardTracker::new(&self.config, ForwardPolicy::ExternalOnly, sink);
        let listeners = clipboard_listeners(&doc, &clipboard);

        let indicator = doc
            .query_selector(EDITOR_SELECTOR)
            .ok()
            .flatten()
            .map(|editor| Indicator::attach(&editor, &doc, ("focusin", "focusout")));

        let settle_tracker = Rc::downgrade(&tracker);
        let settle_ms = u32::try_from(self.config.initial_settle_ms).unwrap_or(u32::MAX);
        let settle = Timeout::new(settle_ms, move || {
            if let Some(tracker) = settle_tracker.upgrade() {
                tracker.prime(true);
            }
        });

        *self.session.borrow_mut() = Some(DocsSession {
            document: doc.clone(),
            tracker,
            bootstrap: None,
            pages: None,
            tiles: Vec::new(),
            indicator,
            _clipboard: listeners,
            _settle: settle,
        });
        info!("google docs capture initializing");
        bootstrap(&self.session, &doc)
    }

    fn cleanup(&mut self) {
        let released = self.session.borrow_mut().take();
        if let Some(session) = released {
            session.release();
        }
    }

    fn highlight(&mut self, style: &HighlightStyle, node: Option<&Element>) -> Restore {
        if let Some(node) = node {
            return apply_style(node, style);
        }
        let doc = match self.session.borrow().as_ref() {
            Some(session) => session.document.clone(),
            None => match dom::document() {
                Ok(doc) => doc,
                Err(_) => return Restore::noop(),
            },
        };
        let tiles = doc
            .query_selector_all(CONTENT_TILE_SELECTOR)
            .map(|list| elements(&list))
            .unwrap_or_default();
        Restore::all(tiles.iter().map(|tile| apply_style(tile, style)).collect())
    }

    fn can_track_selection(&self, url: &str) -> bool {
        docs_tracks_selection(url)
    }

    fn is_active(&self) -> bool {
        self.session
            .borrow()
            .as_ref()
            .is_some_and(|session| session.pages.is_some())
    }
}

impl Drop for GoogleDocsStrategy {
    fn drop(&mut self) {
        self.cleanup();
    }
}
