//! Editor discovery.
//!
//! The search logic is written against [`PageView`], a read-only window onto
//! a page and its same-origin frames. The browser crate implements it over
//! `web-sys`; tests implement it over an in-memory page.

use tracing::{debug, trace};

/// Elements carrying the editable-content marker.
pub const EDITABLE_SELECTOR: &str = r#"[contenteditable="true"]"#;

/// Elements exposing a textbox role.
pub const TEXTBOX_SELECTOR: &str = r#"[role="textbox"]"#;

/// Last-resort selectors, tried in order against the top document and then
/// every reachable frame.
pub const FALLBACK_SELECTORS: &[&str] = &[
    r#"#PageContent [contenteditable="true"]"#,
    r#".PageContent [contenteditable="true"]"#,
    r#"[data-ot="editor"]"#,
    r#"[role="textbox"]"#,
    ".OutlineElement",
    "#WACViewPanel_EditingElement",
    r#"[aria-label*="document"]"#,
];

/// How many ancestors the container-marker check inspects.
const ANCESTOR_DEPTH: usize = 3;

/// Result of trying to read an iframe's document.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameAccess<D> {
    Accessible(D),
    /// Cross-origin or not yet loaded.
    Denied,
}

impl<D> FrameAccess<D> {
    pub fn accessible(self) -> Option<D> {
        match self {
            FrameAccess::Accessible(doc) => Some(doc),
            FrameAccess::Denied => None,
        }
    }
}

/// Identity and class hints of one ancestor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AncestorInfo {
    pub class_name: String,
    pub id: String,
}

/// Everything the main-editor heuristic looks at for one element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorCandidate {
    pub width: f64,
    pub height: f64,
    pub class_name: String,
    pub id: String,
    pub role: Option<String>,
    pub aria_label: Option<String>,
    pub data_ot: Option<String>,
    /// Nearest ancestor first.
    pub ancestors: Vec<AncestorInfo>,
}

/// Size thresholds for the locator heuristics, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocatorThresholds {
    pub min_width: f64,
    pub min_height: f64,
    pub large_width: f64,
    pub large_height: f64,
    pub visible_width: f64,
    pub visible_height: f64,
}

impl Default for LocatorThresholds {
    fn default() -> Self {
        Self {
            min_width: 200.0,
            min_height: 100.0,
            large_width: 400.0,
            large_height: 300.0,
            visible_width: 50.0,
            visible_height: 30.0,
        }
    }
}

impl LocatorThresholds {
    /// A candidate must reach the minimum in both axes and exceed it in at
    /// least one, so a box exactly at the minimum is rejected.
    pub fn meets_minimum(&self, width: f64, height: f64) -> bool {
        if width < self.min_width || height < self.min_height {
            return false;
        }
        width > self.min_width || height > self.min_height
    }

    pub fn is_large(&self, width: f64, height: f64) -> bool {
        width > self.large_width && height > self.large_height
    }

    pub fn is_visible(&self, width: f64, height: f64) -> bool {
        width > self.visible_width && height > self.visible_height
    }
}

/// Class, role or attribute hints that mark an element as an editor surface.
pub fn has_editor_marker(candidate: &EditorCandidate) -> bool {
    let class = candidate.class_name.as_str();
    class.contains("doc")
        || class.contains("WACView")
        || class.contains("PageContent")
        || candidate.role.as_deref() == Some("textbox")
        || candidate
            .aria_label
            .as_deref()
            .is_some_and(|label| label.to_lowercase().contains("document"))
        || candidate.data_ot.as_deref() == Some("editor")
}

/// Whether one of the nearest ancestors is a known editor container.
pub fn has_container_ancestor(candidate: &EditorCandidate) -> bool {
    candidate.ancestors.iter().take(ANCESTOR_DEPTH).any(|a| {
        a.class_name.contains("WACView")
            || a.class_name.contains("doc-content")
            || a.class_name.contains("PageContent")
            || a.id.contains("WACView")
            || a.id.contains("PageContent")
    })
}

/// The main-editor heuristic: big enough, and either marked, nested in a
/// marked container, or large.
pub fn is_main_editor(candidate: &EditorCandidate, thresholds: &LocatorThresholds) -> bool {
    if !thresholds.meets_minimum(candidate.width, candidate.height) {
        return false;
    }
    has_editor_marker(candidate)
        || has_container_ancestor(candidate)
        || thresholds.is_large(candidate.width, candidate.height)
}

/// Whether an element's own id/class place it inside a document body region.
///
/// Used to decide if an event target belongs to the editor when the target
/// is not a descendant of the tracked element.
pub fn is_word_content_marker(class_name: &str, id: &str) -> bool {
    id == "PageContent"
        || class_name.contains("PageContent")
        || class_name.contains("OutlineElement")
        || class_name.contains("doc-content")
}

/// Read-only access to a page and its frames.
///
/// Implementations must not mutate the DOM. Invalid selectors and missing
/// nodes yield empty results rather than errors.
pub trait PageView {
    type Element: Clone;
    type Document: Clone;

    /// The document this script runs in.
    fn current_document(&self) -> Self::Document;

    /// True when running in the top-level browsing context.
    fn is_top_frame(&self) -> bool;

    /// Documents of the iframes directly under `doc`.
    fn frames(&self, doc: &Self::Document) -> Vec<FrameAccess<Self::Document>>;

    fn query_all(&self, doc: &Self::Document, selector: &str) -> Vec<Self::Element>;

    fn query(&self, doc: &Self::Document, selector: &str) -> Option<Self::Element> {
        self.query_all(doc, selector).into_iter().next()
    }

    /// First descendant of `el` matching `selector`.
    fn query_within(&self, el: &Self::Element, selector: &str) -> Option<Self::Element>;

    fn by_id(&self, doc: &Self::Document, id: &str) -> Option<Self::Element>;

    /// `el` or its nearest ancestor matching `selector`.
    fn closest(&self, el: &Self::Element, selector: &str) -> Option<Self::Element>;

    fn is_content_editable(&self, el: &Self::Element) -> bool;

    fn describe(&self, el: &Self::Element) -> EditorCandidate;

    /// Location of the current document, for diagnostics.
    fn url(&self) -> Option<String> {
        None
    }
}

/// A located editor surface and the document that owns it.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorHandle<E, D> {
    pub element: E,
    pub document: D,
}

impl<E, D> EditorHandle<E, D> {
    pub fn new(element: E, document: D) -> Self {
        Self { element, document }
    }
}

/// Counts logged when a search gives up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocatorDiagnostics {
    pub iframe_count: usize,
    pub editable_count: usize,
    pub top_frame: bool,
    pub url: Option<String>,
}

/// Search order for iframe-hosted rich text editors.
#[derive(Clone, Debug, Default)]
pub struct FrameSearch {
    pub thresholds: LocatorThresholds,
}

impl FrameSearch {
    pub fn new(thresholds: LocatorThresholds) -> Self {
        Self { thresholds }
    }

    /// Frames first, then the current document, then the fallback selectors.
    pub fn locate<P: PageView>(&self, page: &P) -> Option<EditorHandle<P::Element, P::Document>> {
        let top = page.current_document();
        let frames: Vec<P::Document> = page
            .frames(&top)
            .into_iter()
            .filter_map(FrameAccess::accessible)
            .collect();
        trace!(frames = frames.len(), "searching frames");

        for (idx, doc) in frames.iter().enumerate() {
            if let Some(element) = self.main_editor_in(page, doc) {
                debug!(frame = idx + 1, "found main editor in iframe");
                return Some(EditorHandle::new(element, doc.clone()));
            }
        }

        if let Some(element) = self.main_editor_in(page, &top) {
            debug!("found main editor in main document");
            return Some(EditorHandle::new(element, top));
        }

        for selector in FALLBACK_SELECTORS {
            let in_top = page
                .query(&top, selector)
                .filter(|el| page.is_content_editable(el));
            if let Some(element) = in_top {
                debug!(selector, "found editor with fallback selector");
                return Some(EditorHandle::new(element, top));
            }

            for doc in &frames {
                let in_frame = page
                    .query(doc, selector)
                    .filter(|el| page.is_content_editable(el));
                if let Some(element) = in_frame {
                    debug!(selector, "found editor in iframe with fallback selector");
                    return Some(EditorHandle::new(element, doc.clone()));
                }
            }
        }

        None
    }

    fn main_editor_in<P: PageView>(&self, page: &P, doc: &P::Document) -> Option<P::Element> {
        page.query_all(doc, EDITABLE_SELECTOR)
            .into_iter()
            .find(|el| is_main_editor(&page.describe(el), &self.thresholds))
    }

    /// Direct search used when the script itself runs inside the editor frame.
    pub fn locate_in_current<P: PageView>(&self, page: &P) -> Option<P::Element> {
        let doc = page.current_document();

        let container = page
            .by_id(&doc, "PageContent")
            .or_else(|| page.query(&doc, ".PageContent"))
            .or_else(|| page.query(&doc, r#"[id*="PageContent"]"#));
        if let Some(container) = container {
            if let Some(editable) = page.query_within(&container, EDITABLE_SELECTOR) {
                debug!("found contenteditable inside PageContent");
                return Some(editable);
            }
            if page.is_content_editable(&container) {
                debug!("PageContent itself is editable");
                return Some(container);
            }
        }

        for el in page.query_all(&doc, EDITABLE_SELECTOR) {
            let candidate = page.describe(&el);
            let in_page_content = candidate.id == "PageContent"
                || page.closest(&el, "#PageContent").is_some()
                || page.closest(&el, ".PageContent").is_some();
            if in_page_content {
                return Some(el);
            }
            if self.thresholds.is_visible(candidate.width, candidate.height) {
                debug!(
                    width = candidate.width,
                    height = candidate.height,
                    "found viable editor element (relaxed check)"
                );
                return Some(el);
            }
        }

        page.query_all(&doc, TEXTBOX_SELECTOR).into_iter().find(|el| {
            let candidate = page.describe(el);
            self.thresholds
                .is_visible(candidate.width, candidate.height)
        })
    }

    pub fn diagnostics<P: PageView>(&self, page: &P) -> LocatorDiagnostics {
        let doc = page.current_document();
        LocatorDiagnostics {
            iframe_count: page.frames(&doc).len(),
            editable_count: page.query_all(&doc, EDITABLE_SELECTOR).len(),
            top_frame: page.is_top_frame(),
            url: page.url(),
        }
    }
}

/// Something that can look for an editor on demand.
///
/// `locate` must be side-effect free; callers own the retry cadence.
pub trait EditorLocator {
    type Element;
    type Document;

    fn locate(&self) -> Option<EditorHandle<Self::Element, Self::Document>>;

    fn diagnostics(&self) -> LocatorDiagnostics {
        LocatorDiagnostics::default()
    }
}

/// [`FrameSearch`] bound to a page.
///
/// Inside a child frame the cheaper direct search runs first.
pub struct PageLocator<P> {
    page: P,
    search: FrameSearch,
}

impl<P: PageView> PageLocator<P> {
    pub fn new(page: P, thresholds: LocatorThresholds) -> Self {
        Self {
            page,
            search: FrameSearch::new(thresholds),
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }
}

impl<P: PageView> EditorLocator for PageLocator<P> {
    type Element = P::Element;
    type Document = P::Document;

    fn locate(&self) -> Option<EditorHandle<P::Element, P::Document>> {
        if !self.page.is_top_frame() {
            if let Some(element) = self.search.locate_in_current(&self.page) {
                return Some(EditorHandle::new(element, self.page.current_document()));
            }
        }
        self.search.locate(&self.page)
    }

    fn diagnostics(&self) -> LocatorDiagnostics {
        self.search.diagnostics(&self.page)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::*;
    use super::*;

    fn candidate(width: f64, height: f64, class: &str) -> EditorCandidate {
        EditorCandidate {
            width,
            height,
            class_name: class.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_size_boundary() {
        let t = LocatorThresholds::default();
        assert!(!is_main_editor(&candidate(200.0, 100.0, "WACViewPanel"), &t));
        assert!(is_main_editor(&candidate(201.0, 100.0, "WACViewPanel"), &t));
        assert!(is_main_editor(&candidate(200.0, 101.0, "WACViewPanel"), &t));
        assert!(is_main_editor(&candidate(201.0, 101.0, "WACViewPanel"), &t));
    }

    #[test]
    fn test_below_minimum_on_either_axis_is_rejected() {
        let t = LocatorThresholds::default();
        assert!(!is_main_editor(&candidate(199.0, 500.0, "WACViewPanel"), &t));
        assert!(!is_main_editor(&candidate(500.0, 99.0, "WACViewPanel"), &t));
    }

    #[test]
    fn test_marker_required_below_large_size() {
        let t = LocatorThresholds::default();
        assert!(!is_main_editor(&candidate(300.0, 200.0, "plain"), &t));
        assert!(is_main_editor(&candidate(401.0, 301.0, "plain"), &t));
    }

    #[test]
    fn test_attribute_markers() {
        let t = LocatorThresholds::default();
        let mut c = candidate(300.0, 200.0, "");
        c.role = Some("textbox".into());
        assert!(is_main_editor(&c, &t));

        let mut c = candidate(300.0, 200.0, "");
        c.aria_label = Some("Document Body".into());
        assert!(is_main_editor(&c, &t));

        let mut c = candidate(300.0, 200.0, "");
        c.data_ot = Some("editor".into());
        assert!(is_main_editor(&c, &t));
    }

    #[test]
    fn test_only_three_ancestors_are_inspected() {
        let t = LocatorThresholds::default();
        let plain = AncestorInfo::default();
        let marked = AncestorInfo {
            class_name: String::new(),
            id: "WACViewPanel".into(),
        };

        let mut near = candidate(300.0, 200.0, "");
        near.ancestors = vec![plain.clone(), plain.clone(), marked.clone()];
        assert!(is_main_editor(&near, &t));

        let mut far = candidate(300.0, 200.0, "");
        far.ancestors = vec![plain.clone(), plain.clone(), plain, marked];
        assert!(!is_main_editor(&far, &t));
    }

    #[test]
    fn test_word_content_marker() {
        assert!(is_word_content_marker("", "PageContent"));
        assert!(is_word_content_marker("OutlineElement Ltr", ""));
        assert!(is_word_content_marker("x doc-content", ""));
        assert!(!is_word_content_marker("toolbar", "ribbon"));
    }

    #[test]
    fn test_frames_searched_before_top_document() {
        let mut page = FakePage::single(vec![FakeElement::editable(800.0, 600.0)]);
        page.documents[0].frames = vec![None, Some(1)];
        page.documents.push(FakeDocument {
            elements: vec![FakeElement::editable(500.0, 400.0).with_class("WACViewPanel")],
            frames: Vec::new(),
        });

        let found = FrameSearch::default().locate(&page).unwrap();
        assert_eq!(found.document, 1);
        assert_eq!(found.element, (1, 0));
    }

    #[test]
    fn test_denied_frames_are_skipped() {
        let mut page = FakePage::single(vec![FakeElement::editable(800.0, 600.0)]);
        page.documents[0].frames = vec![None, None];

        let found = FrameSearch::default().locate(&page).unwrap();
        assert_eq!(found, EditorHandle::new((0, 0), 0));
    }

    #[test]
    fn test_fallback_selectors_require_editable() {
        let mut outline = FakeElement::editable(10.0, 10.0).matching(".OutlineElement");
        outline.matches.retain(|s| *s != EDITABLE_SELECTOR);
        let mut inert = outline.clone();
        inert.editable = false;

        let page = FakePage::single(vec![inert]);
        assert!(FrameSearch::default().locate(&page).is_none());

        let page = FakePage::single(vec![outline]);
        assert_eq!(
            FrameSearch::default().locate(&page),
            Some(EditorHandle::new((0, 0), 0))
        );
    }

    #[test]
    fn test_nothing_found_on_empty_page() {
        let page = FakePage::single(Vec::new());
        assert!(FrameSearch::default().locate(&page).is_none());
        assert!(FrameSearch::default().locate_in_current(&page).is_none());
    }

    #[test]
    fn test_direct_search_prefers_page_content_descendant() {
        let mut container = FakeElement::default();
        container.candidate.id = "PageContent".into();
        container.children = vec![1];
        let inner = FakeElement::editable(10.0, 10.0);
        let page = FakePage::single(vec![container, inner]);

        assert_eq!(
            FrameSearch::default().locate_in_current(&page),
            Some((0, 1))
        );
    }

    #[test]
    fn test_direct_search_relaxed_size() {
        let tiny = FakeElement::editable(40.0, 20.0);
        let visible = FakeElement::editable(51.0, 31.0);
        let page = FakePage::single(vec![tiny.clone(), visible]);
        assert_eq!(
            FrameSearch::default().locate_in_current(&page),
            Some((0, 1))
        );

        let mut textbox = FakeElement::editable(60.0, 40.0);
        textbox.matches = vec![TEXTBOX_SELECTOR];
        let page = FakePage::single(vec![tiny, textbox]);
        assert_eq!(
            FrameSearch::default().locate_in_current(&page),
            Some((0, 1))
        );
    }

    #[test]
    fn test_page_locator_tries_direct_search_in_child_frame() {
        let mut page = FakePage::single(vec![FakeElement::editable(60.0, 40.0)]);
        page.top_frame = false;
        let locator = PageLocator::new(page, LocatorThresholds::default());
        assert_eq!(locator.locate(), Some(EditorHandle::new((0, 0), 0)));

        let diagnostics = locator.diagnostics();
        assert_eq!(diagnostics.editable_count, 1);
        assert!(!diagnostics.top_frame);
    }
}
