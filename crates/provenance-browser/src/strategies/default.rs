//! Catch-all capture for ordinary textareas and contenteditable editors.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::callback::Timeout;
use tracing::{debug, info};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement, Node};

use provenance_core::editable::{
    EditableTraits, LineMetrics, detect_framework, textarea_is_multiline, tracks_contenteditable,
};
use provenance_core::{
    CaptureConfig, CaptureError, CaptureSink, CaptureStrategy, EditorKind, ForwardPolicy,
    Framework, HighlightStyle, Restore, SelectionRange, StrategyId,
};

use crate::clipboard::{ClipboardHooks, ClipboardTracker};
use crate::dom::{self, QueryRoot};
use crate::extract::{self, editor_text};
use crate::style::{Indicator, apply_style};

use super::target_element;

const CONTENTEDITABLE_SELECTOR: &str = r#"[contenteditable="true"]"#;

/// A generic editor found by [`DefaultStrategy::query_nodes`].
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedEditor {
    pub element: Element,
    pub kind: EditorKind,
    pub framework: Option<Framework>,
}

fn editable_traits(el: &Element) -> EditableTraits {
    EditableTraits {
        class_list: el
            .get_attribute("class")
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        has_slate_attr: el.has_attribute("data-slate-editor"),
        has_draft_attr: el.has_attribute("data-contents"),
        editor_type: el.get_attribute("data-editor-type"),
        editor: el.get_attribute("data-editor"),
    }
}

fn line_metrics(el: &Element) -> LineMetrics {
    let computed = web_sys::window().and_then(|w| w.get_computed_style(el).ok().flatten());
    let property = |name: &str| {
        computed
            .as_ref()
            .and_then(|style| style.get_property_value(name).ok())
            .unwrap_or_default()
    };
    LineMetrics {
        role: el.get_attribute("role"),
        aria_multiline: el.get_attribute("aria-multiline"),
        line_height: property("line-height"),
        white_space: property("white-space"),
        client_height: f64::from(el.client_height()),
    }
}

/// Not nested inside another contenteditable.
fn is_top_level_editable(el: &Element) -> bool {
    el.parent_element()
        .and_then(|parent| parent.closest(CONTENTEDITABLE_SELECTOR).ok().flatten())
        .is_none()
}

/// Multi-line textareas and top-level contenteditables under `root`.
pub fn find_editors(root: &QueryRoot) -> Vec<TrackedEditor> {
    let textareas = root
        .query_all("textarea")
        .into_iter()
        .filter(|el| textarea_is_multiline(el.get_attribute("rows").as_deref()))
        .map(|element| TrackedEditor {
            element,
            kind: EditorKind::Textarea,
            framework: None,
        });

    let editables = root
        .query_all(CONTENTEDITABLE_SELECTOR)
        .into_iter()
        .filter(is_top_level_editable)
        .filter_map(|element| {
            let framework = detect_framework(&editable_traits(&element));
            if !tracks_contenteditable(framework, &line_metrics(&element)) {
                debug!(framework = framework.as_str(), "skipping single-line editor");
                return None;
            }
            Some(TrackedEditor {
                element,
                kind: EditorKind::ContentEditable,
                framework: Some(framework),
            })
        });

    textareas.chain(editables).collect()
}

fn is_text_control(el: &Element) -> bool {
    el.is_instance_of::<HtmlTextAreaElement>()
        || el.is_instance_of::<HtmlInputElement>()
        || el
            .dyn_ref::<HtmlElement>()
            .is_some_and(|html| html.is_content_editable())
}

#[derive(Default)]
struct DefaultState {
    tracked: Vec<TrackedEditor>,
    indicators: Vec<Indicator>,
    listeners: Vec<EventListener>,
    indicator_timer: Option<Timeout>,
    initialized: bool,
}

/// Capture for any page the other strategies do not claim.
pub struct DefaultStrategy {
    config: CaptureConfig,
    state: Rc<RefCell<DefaultState>>,
}

impl DefaultStrategy {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            state: Rc::new(RefCell::new(DefaultState::default())),
        }
    }

    /// Editors found by the last [`query_nodes`](CaptureStrategy::query_nodes).
    pub fn tracked(&self) -> Vec<TrackedEditor> {
        self.state.borrow().tracked.clone()
    }
}

/// The editor an input event belongs to: a tracked editor containing the
/// target, else the target itself when it is editable.
fn editor_for(state: &DefaultState, target: &Element) -> Option<Element> {
    let node: &Node = target;
    state
        .tracked
        .iter()
        .find(|editor| editor.element.contains(Some(node)))
        .map(|editor| editor.element.clone())
        .or_else(|| is_text_control(target).then(|| target.clone()))
}

impl CaptureStrategy for DefaultStrategy {
    type Node = Element;
    type Root = QueryRoot;

    fn id(&self) -> StrategyId {
        StrategyId::Generic
    }

    fn matches(&self, _hostname: &str) -> bool {
        true
    }

    fn is_default(&self) -> bool {
        true
    }

    fn query_nodes(&mut self, root: &QueryRoot) -> Vec<Element> {
        let found = find_editors(root);
        debug!(count = found.len(), "generic editors found");
        let elements = found.iter().map(|editor| editor.element.clone()).collect();
        self.state.borrow_mut().tracked = found;
        elements
    }

    fn extract_text(&self, node: &Element) -> String {
        editor_text(node)
    }

    fn initialize(&mut self, sink: Rc<dyn CaptureSink>) -> Result<(), CaptureError> {
        self.cleanup();
        let doc = dom::document()?;

        let clipboard =
            ClipboardTracker::new(&self.config, ForwardPolicy::ExternalOnly, sink.clone());
        let mut listeners = clipboard.listen(&doc, ClipboardHooks::Both, true);

        for kind in ["input", "keyup"] {
            let weak = Rc::downgrade(&self.state);
            let sink = sink.clone();
            listeners.push(EventListener::new_with_options(
                &doc,
                kind,
                EventListenerOptions::run_in_capture_phase(),
                move |event| {
                    let Some(state) = weak.upgrade() else {
                        return;
                    };
                    let Some(target) = target_element(event) else {
                        return;
                    };
                    let editor = editor_for(&state.borrow(), &target);
                    if let Some(editor) = editor {
                        sink.typed_text(&editor_text(&editor));
                    }
                },
            ));
        }

        let count = self.query_nodes(&QueryRoot::Document(doc)).len();

        let weak = Rc::downgrade(&self.state);
        let delay = u32::try_from(self.config.indicator_delay_ms).unwrap_or(u32::MAX);
        let timer = Timeout::new(delay, move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let editors: Vec<Element> = state
                .borrow()
                .tracked
                .iter()
                .map(|editor| editor.element.clone())
                .collect();
            let indicators = editors
                .iter()
                .map(|el| Indicator::attach(el, el, ("focus", "blur")))
                .collect();
            state.borrow_mut().indicators = indicators;
        });

        {
            let mut state = self.state.borrow_mut();
            state.listeners = listeners;
            state.indicator_timer = Some(timer);
            state.initialized = true;
        }
        info!(editors = count, "generic capture initialized");
        Ok(())
    }

    fn cleanup(&mut self) {
        let indicators = {
            let mut state = self.state.borrow_mut();
            state.listeners.clear();
            state.indicator_timer = None;
            state.initialized = false;
            std::mem::take(&mut state.indicators)
        };
        for indicator in indicators {
            indicator.remove();
        }
    }

    fn highlight(&mut self, style: &HighlightStyle, node: Option<&Element>) -> Restore {
        let border = HighlightStyle {
            border: style.border.clone(),
            ..HighlightStyle::default()
        };
        match node {
            Some(node) => apply_style(node, &border),
            None => Restore::all(
                self.tracked()
                    .iter()
                    .map(|editor| apply_style(&editor.element, &border))
                    .collect(),
            ),
        }
    }

    /// Ignores `url`; only asks whether focus is in a text control.
    fn can_track_selection(&self, _url: &str) -> bool {
        dom::document()
            .ok()
            .and_then(|doc| doc.active_element())
            .is_some_and(|el| is_text_control(&el))
    }

    fn selection_range(&self, node: &Element) -> Option<SelectionRange> {
        extract::selection_range(node)
    }

    fn is_active(&self) -> bool {
        let state = self.state.borrow();
        state.initialized && !state.tracked.is_empty()
    }
}

impl Drop for DefaultStrategy {
    fn drop(&mut self) {
        self.cleanup();
    }
}
