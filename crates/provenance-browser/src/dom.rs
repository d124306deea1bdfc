//! Small helpers over `web-sys` shared by the rest of the crate.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, NodeList, Window};

use provenance_core::CaptureError;

/// Convert a thrown JS value into a [`CaptureError::Dom`].
pub fn js_error(value: JsValue) -> CaptureError {
    let message = value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"));
    CaptureError::Dom(message)
}

pub fn serde_error(e: serde_wasm_bindgen::Error) -> CaptureError {
    CaptureError::Serialization(e.to_string())
}

pub fn window() -> Result<Window, CaptureError> {
    web_sys::window().ok_or_else(|| CaptureError::Dom("no window".into()))
}

pub fn document() -> Result<Document, CaptureError> {
    window()?
        .document()
        .ok_or_else(|| CaptureError::Dom("no document".into()))
}

/// `location.hostname` of the running frame, empty when unavailable.
pub fn hostname() -> String {
    web_sys::window()
        .and_then(|w| w.location().hostname().ok())
        .unwrap_or_default()
}

/// `location.href` of the running frame, empty when unavailable.
pub fn page_url() -> String {
    web_sys::window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default()
}

pub fn page_title() -> String {
    document().map(|d| d.title()).unwrap_or_default()
}

/// Whether this script runs in the top-level browsing context.
pub fn is_top_frame(window: &Window) -> bool {
    match window.top() {
        Ok(Some(top)) => top == *window,
        // A top we cannot read is someone else's.
        _ => false,
    }
}

/// Element nodes of a `NodeList`, in order.
pub fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Where strategy discovery starts: a whole document or one subtree.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryRoot {
    Document(Document),
    Element(Element),
}

impl QueryRoot {
    /// The running frame's document.
    pub fn current() -> Result<Self, CaptureError> {
        Ok(QueryRoot::Document(document()?))
    }

    /// All matches for `selector`; an invalid selector matches nothing.
    pub fn query_all(&self, selector: &str) -> Vec<Element> {
        let list = match self {
            QueryRoot::Document(doc) => doc.query_selector_all(selector),
            QueryRoot::Element(el) => el.query_selector_all(selector),
        };
        match list {
            Ok(list) => elements(&list),
            Err(e) => {
                tracing::debug!(selector, error = %js_error(e), "query failed");
                Vec::new()
            }
        }
    }

    pub fn query(&self, selector: &str) -> Option<Element> {
        let found = match self {
            QueryRoot::Document(doc) => doc.query_selector(selector),
            QueryRoot::Element(el) => el.query_selector(selector),
        };
        found.ok().flatten()
    }

    /// The document owning this root.
    pub fn document(&self) -> Option<Document> {
        match self {
            QueryRoot::Document(doc) => Some(doc.clone()),
            QueryRoot::Element(el) => el.owner_document(),
        }
    }
}

impl From<Document> for QueryRoot {
    fn from(doc: Document) -> Self {
        QueryRoot::Document(doc)
    }
}

impl From<Element> for QueryRoot {
    fn from(el: Element) -> Self {
        QueryRoot::Element(el)
    }
}
