//! [`PageView`] over the live DOM.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlIFrameElement, Window};

use provenance_core::locator::AncestorInfo;
use provenance_core::{CaptureError, EditorCandidate, FrameAccess, PageView};

use crate::dom::{self, elements};

/// How many ancestors [`BrowserPage::describe`] records.
const DESCRIBED_ANCESTORS: usize = 3;

/// The running frame's window and document.
#[derive(Clone, Debug)]
pub struct BrowserPage {
    window: Window,
    document: Document,
}

impl BrowserPage {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }

    pub fn current() -> Result<Self, CaptureError> {
        let window = dom::window()?;
        let document = window
            .document()
            .ok_or_else(|| CaptureError::Dom("no document".into()))?;
        Ok(Self::new(window, document))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

fn attr(el: &Element, name: &str) -> Option<String> {
    el.get_attribute(name)
}

/// `class` as written in markup. `className` is not a string on SVG nodes.
fn class_of(el: &Element) -> String {
    attr(el, "class").unwrap_or_default()
}

impl PageView for BrowserPage {
    type Element = Element;
    type Document = Document;

    fn current_document(&self) -> Document {
        self.document.clone()
    }

    fn is_top_frame(&self) -> bool {
        dom::is_top_frame(&self.window)
    }

    fn frames(&self, doc: &Document) -> Vec<FrameAccess<Document>> {
        let Ok(list) = doc.query_selector_all("iframe") else {
            return Vec::new();
        };
        elements(&list)
            .into_iter()
            .filter_map(|el| el.dyn_into::<HtmlIFrameElement>().ok())
            .map(|frame| match frame.content_document() {
                // Cross-origin and unloaded frames both read as null.
                Some(inner) => FrameAccess::Accessible(inner),
                None => FrameAccess::Denied,
            })
            .collect()
    }

    fn query_all(&self, doc: &Document, selector: &str) -> Vec<Element> {
        doc.query_selector_all(selector)
            .map(|list| elements(&list))
            .unwrap_or_default()
    }

    fn query(&self, doc: &Document, selector: &str) -> Option<Element> {
        doc.query_selector(selector).ok().flatten()
    }

    fn query_within(&self, el: &Element, selector: &str) -> Option<Element> {
        el.query_selector(selector).ok().flatten()
    }

    fn by_id(&self, doc: &Document, id: &str) -> Option<Element> {
        doc.get_element_by_id(id)
    }

    fn closest(&self, el: &Element, selector: &str) -> Option<Element> {
        el.closest(selector).ok().flatten()
    }

    fn is_content_editable(&self, el: &Element) -> bool {
        el.dyn_ref::<HtmlElement>()
            .is_some_and(|html| html.is_content_editable())
    }

    fn describe(&self, el: &Element) -> EditorCandidate {
        let rect = el.get_bounding_client_rect();

        let mut ancestors = Vec::with_capacity(DESCRIBED_ANCESTORS);
        let mut parent = el.parent_element();
        while let Some(p) = parent {
            if ancestors.len() == DESCRIBED_ANCESTORS {
                break;
            }
            ancestors.push(AncestorInfo {
                class_name: class_of(&p),
                id: p.id(),
            });
            parent = p.parent_element();
        }

        EditorCandidate {
            width: rect.width(),
            height: rect.height(),
            class_name: class_of(el),
            id: el.id(),
            role: attr(el, "role"),
            aria_label: attr(el, "aria-label"),
            data_ot: attr(el, "data-ot"),
            ancestors,
        }
    }

    fn url(&self) -> Option<String> {
        self.window.location().href().ok()
    }
}
