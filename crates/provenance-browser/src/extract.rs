//! Canonical text extraction from live DOM.
//!
//! Everything here reads the DOM and never writes it, so calling twice on
//! unchanged state gives the same string.

use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlElement, HtmlIFrameElement, HtmlInputElement, HtmlTextAreaElement,
    Node,
};

use provenance_core::fragments::{CONTENT_TILE_SELECTOR, TEXT_RECT_SELECTOR};
use provenance_core::text::utf16_len;
use provenance_core::walk::{is_block_element, offset_of};
use provenance_core::{CaptureError, SelectionRange, TextFragment, WalkStep, canonical_text};

use crate::dom::{elements, js_error};

// NodeFilter.SHOW_ELEMENT | NodeFilter.SHOW_TEXT
const SHOW_ELEMENT: u32 = 0x1;
const SHOW_TEXT: u32 = 0x4;

/// Every labelled text rectangle across the content tiles of `doc`, tagged
/// with its tile index. Selection overlay tiles are skipped by the selector.
pub fn collect_fragments(doc: &Document) -> Vec<TextFragment> {
    let Ok(tiles) = doc.query_selector_all(CONTENT_TILE_SELECTOR) else {
        return Vec::new();
    };

    let mut fragments = Vec::new();
    for (page, tile) in elements(&tiles).into_iter().enumerate() {
        let Ok(rects) = tile.query_selector_all(TEXT_RECT_SELECTOR) else {
            continue;
        };
        fragments.extend(elements(&rects).into_iter().filter_map(|rect| {
            let transform = rect.get_attribute("transform").unwrap_or_default();
            TextFragment::from_rect(rect.get_attribute("aria-label"), &transform, page)
        }));
    }
    fragments
}

/// Reading-order text of a canvas-rendered document.
pub fn canvas_text(doc: &Document, y_tolerance: f64) -> String {
    canonical_text(collect_fragments(doc), y_tolerance)
}

/// `innerText` for HTML elements, `textContent` otherwise.
pub fn rendered_text(el: &Element) -> String {
    match el.dyn_ref::<HtmlElement>() {
        Some(html) => {
            let inner = html.inner_text();
            if inner.is_empty() {
                el.text_content().unwrap_or_default()
            } else {
                inner
            }
        }
        None => el.text_content().unwrap_or_default(),
    }
}

/// Plain text of a generic editor: an iframe's body, a text control's value,
/// or the rendered text of anything else. Trimmed.
pub fn editor_text(el: &Element) -> String {
    let content = if let Some(frame) = el.dyn_ref::<HtmlIFrameElement>() {
        frame
            .content_document()
            .and_then(|doc| doc.body())
            .map(|body| body.inner_text())
            .unwrap_or_default()
    } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        area.value()
    } else if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else {
        rendered_text(el)
    };
    content.trim().to_string()
}

/// Where a walk stops.
enum Boundary {
    /// Inside a text node, after `offset` UTF-16 units.
    Text(Node, usize),
    /// Just before this node.
    Before(Node),
}

impl Boundary {
    /// Boundary for a DOM range end point.
    fn at(container: Node, offset: u32) -> Option<Self> {
        if container.node_type() == Node::TEXT_NODE {
            return Some(Boundary::Text(container, offset as usize));
        }
        // An offset past the last child has no node to stop before, so the
        // walk runs over the whole subtree.
        container.child_nodes().item(offset).map(Boundary::Before)
    }
}

fn walk(root: &Element, boundary: Option<&Boundary>) -> Result<Vec<WalkStep>, CaptureError> {
    let doc = root
        .owner_document()
        .ok_or_else(|| CaptureError::Dom("element has no document".into()))?;
    let walker = doc
        .create_tree_walker_with_what_to_show(root, SHOW_ELEMENT | SHOW_TEXT)
        .map_err(js_error)?;

    let mut steps = Vec::new();
    while let Some(node) = walker.next_node().map_err(js_error)? {
        if let Some(Boundary::Before(stop)) = boundary {
            if node.is_same_node(Some(stop)) {
                break;
            }
        }

        if node.node_type() == Node::TEXT_NODE {
            let content = node.text_content().unwrap_or_default();
            if let Some(Boundary::Text(stop, offset)) = boundary {
                if node.is_same_node(Some(stop)) {
                    steps.push(WalkStep::boundary(content, *offset));
                    break;
                }
            }
            steps.push(WalkStep::text(content));
        } else if is_block_element(&node.node_name()) {
            let parent_is_root = node
                .parent_element()
                .is_some_and(|parent| parent == *root);
            steps.push(WalkStep::block(
                node.previous_sibling().is_some(),
                parent_is_root,
            ));
        }
    }
    Ok(steps)
}

/// Text of a contenteditable as the caret walk sees it, with a newline for
/// each block boundary.
pub fn walk_text(root: &Element) -> Result<String, CaptureError> {
    Ok(provenance_core::reconstruct_with_newlines(walk(root, None)?))
}

/// Absolute offset of a DOM position inside `root`.
pub fn offset_within(root: &Element, container: Node, offset: u32) -> Result<usize, CaptureError> {
    let boundary = Boundary::at(container, offset);
    Ok(offset_of(walk(root, boundary.as_ref())?))
}

/// Current selection relative to `el`'s text, for text controls and
/// contenteditable elements. `None` when the selection lies elsewhere.
pub fn selection_range(el: &Element) -> Option<SelectionRange> {
    if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        let start = area.selection_start().ok().flatten().unwrap_or(0);
        let end = area.selection_end().ok().flatten().unwrap_or(0);
        return Some(SelectionRange::new(start as usize, end as usize));
    }
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        let start = input.selection_start().ok().flatten().unwrap_or(0);
        let end = input.selection_end().ok().flatten().unwrap_or(0);
        return Some(SelectionRange::new(start as usize, end as usize));
    }

    let html = el.dyn_ref::<HtmlElement>()?;
    if !html.is_content_editable() {
        return None;
    }

    let selection = el.owner_document()?.get_selection().ok().flatten()?;
    if selection.range_count() == 0 {
        return None;
    }
    let range = selection.get_range_at(0).ok()?;
    let container = range.start_container().ok()?;
    if !el.contains(Some(&container)) {
        return None;
    }

    let start = match offset_within(el, container, range.start_offset().ok()?) {
        Ok(start) => start,
        Err(e) => {
            tracing::debug!(error = %e, "selection walk failed");
            return None;
        }
    };
    let selected = String::from(selection.to_string());
    Some(SelectionRange::new(start, start + utf16_len(&selected)))
}
