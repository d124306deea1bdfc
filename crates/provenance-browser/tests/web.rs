//! WASM browser tests for provenance-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;
use web_sys::{Document, Element, HtmlElement, HtmlTextAreaElement};

wasm_bindgen_test_configure!(run_in_browser);

use provenance_browser::extract::{
    canvas_text, collect_fragments, editor_text, offset_within, selection_range, walk_text,
};
use provenance_browser::frames;
use provenance_browser::strategies::default::find_editors;
use provenance_browser::{
    BrowserManager, BrowserPage, ChangeTracker, DefaultStrategy, PanelSink, QueryRoot,
    apply_style, register_all,
};
use provenance_core::{
    CaptureConfig, CaptureSink, CaptureStrategy, EditKind, EditorKind, FrameEnvelope,
    FrameMessage, FrameSearch, HighlightStyle, LogEvent, NullSink, PassOutcome, RecordingSink,
    SelectionRange, StrategyId,
};

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

/// Attach a container with `html` to the body. Remove it with `.remove()`.
fn fixture(html: &str) -> Element {
    let doc = document();
    let root = doc.create_element("div").unwrap();
    root.set_inner_html(html);
    doc.body().unwrap().append_child(&root).unwrap();
    root
}

fn by_id(root: &Element, id: &str) -> Element {
    root.query_selector(&format!("#{id}")).unwrap().unwrap()
}

// === Canvas fragments ===

#[wasm_bindgen_test]
fn test_fragments_read_in_line_order() {
    let root = fixture(
        r#"<div class="kix-canvas-tile-content"><svg>
             <rect aria-label="World" transform="matrix(1,0,0,1,60,20)"></rect>
             <rect aria-label="Hello" transform="matrix(1,0,0,1,10,21)"></rect>
             <rect aria-label="Next" transform="matrix(1,0,0,1,10,40)"></rect>
             <rect transform="matrix(1,0,0,1,0,0)"></rect>
           </svg></div>
           <div class="kix-canvas-tile-content kix-canvas-tile-selection"><svg>
             <rect aria-label="overlay" transform="matrix(1,0,0,1,0,0)"></rect>
           </svg></div>"#,
    );

    let fragments = collect_fragments(&document());
    assert_eq!(fragments.len(), 3);
    assert!(fragments.iter().all(|f| f.page == 0));

    assert_eq!(canvas_text(&document(), 5.0), "Hello\nWorld\nNext");
    root.remove();
}

// === Extraction and the caret walk ===

#[wasm_bindgen_test]
fn test_editor_text_trims_textarea_value() {
    let root = fixture(r#"<textarea id="area"></textarea>"#);
    let area = by_id(&root, "area");
    area.dyn_ref::<HtmlTextAreaElement>()
        .unwrap()
        .set_value("  draft text \n");
    assert_eq!(editor_text(&area), "draft text");
    root.remove();
}

#[wasm_bindgen_test]
fn test_walk_text_breaks_blocks() {
    let root = fixture(
        r#"<div id="ed" contenteditable="true"><div>one</div><div>two</div></div>"#,
    );
    let ed = by_id(&root, "ed");
    assert_eq!(walk_text(&ed).unwrap(), "one\ntwo");
    root.remove();
}

#[wasm_bindgen_test]
fn test_textarea_selection() {
    let root = fixture(r#"<textarea id="area"></textarea>"#);
    let area = by_id(&root, "area");
    let control = area.dyn_ref::<HtmlTextAreaElement>().unwrap();
    control.set_value("hello world");
    control.set_selection_range(2, 5).unwrap();

    assert_eq!(selection_range(&area), Some(SelectionRange::new(2, 5)));
    root.remove();
}

#[wasm_bindgen_test]
fn test_contenteditable_selection_counts_block_newlines() {
    let root = fixture(
        r#"<div id="ed" contenteditable="true"><div>one</div><div id="second">two</div></div>"#,
    );
    let ed = by_id(&root, "ed");
    let text = by_id(&root, "second").first_child().unwrap();

    let doc = document();
    let range = doc.create_range().unwrap();
    range.set_start(&text, 1).unwrap();
    range.set_end(&text, 3).unwrap();
    let selection = doc.get_selection().unwrap().unwrap();
    selection.remove_all_ranges().unwrap();
    selection.add_range(&range).unwrap();

    // "one\n" + "t" precedes the caret; "wo" is selected.
    assert_eq!(selection_range(&ed), Some(SelectionRange::new(5, 7)));

    selection.remove_all_ranges().unwrap();
    root.remove();
}

#[wasm_bindgen_test]
fn test_offset_after_last_child_covers_whole_editor() {
    let root = fixture(r#"<div id="ed"><div>one</div><div>two</div></div>"#);
    let ed = by_id(&root, "ed");
    let node: web_sys::Node = ed.clone().into();

    assert_eq!(offset_within(&ed, node.clone(), 1).unwrap(), 3);
    assert_eq!(offset_within(&ed, node, 2).unwrap(), "one\ntwo".len());
    root.remove();
}

#[wasm_bindgen_test]
fn test_selection_outside_editor_is_none() {
    let root = fixture(
        r#"<div id="ed" contenteditable="true">inside</div><p id="other">outside</p>"#,
    );
    let ed = by_id(&root, "ed");
    let text = by_id(&root, "other").first_child().unwrap();

    let doc = document();
    let range = doc.create_range().unwrap();
    range.set_start(&text, 0).unwrap();
    range.set_end(&text, 3).unwrap();
    let selection = doc.get_selection().unwrap().unwrap();
    selection.remove_all_ranges().unwrap();
    selection.add_range(&range).unwrap();

    assert_eq!(selection_range(&ed), None);

    selection.remove_all_ranges().unwrap();
    root.remove();
}

// === Locator over the live page ===

#[wasm_bindgen_test]
fn test_locator_finds_marked_editor() {
    let root = fixture(
        r#"<div id="ed" class="doc-surface" contenteditable="true"
                style="width: 500px; height: 400px"></div>"#,
    );
    let page = BrowserPage::current().unwrap();
    let search = FrameSearch::new(CaptureConfig::default().thresholds());

    let handle = search.locate(&page).expect("editor found");
    assert_eq!(handle.element, by_id(&root, "ed"));
    assert_eq!(handle.document, document());
    root.remove();
}

#[wasm_bindgen_test]
fn test_locator_rejects_editor_at_minimum_size() {
    let root = fixture(
        r#"<div class="doc-surface" contenteditable="true"
                style="width: 200px; height: 100px; padding: 0; border: 0"></div>"#,
    );
    let page = BrowserPage::current().unwrap();
    let search = FrameSearch::new(CaptureConfig::default().thresholds());

    assert!(search.locate(&page).is_none());
    root.remove();
}

#[wasm_bindgen_test]
fn test_locator_accepts_editor_one_pixel_wider_than_minimum() {
    let root = fixture(
        r#"<div id="ed" class="doc-surface" contenteditable="true"
                style="width: 201px; height: 100px; padding: 0; border: 0"></div>"#,
    );
    let page = BrowserPage::current().unwrap();
    let search = FrameSearch::new(CaptureConfig::default().thresholds());

    let handle = search.locate(&page).expect("editor found");
    assert_eq!(handle.element, by_id(&root, "ed"));
    root.remove();
}

// === Query roots and styles ===

#[wasm_bindgen_test]
fn test_invalid_selector_matches_nothing() {
    let root = fixture(r#"<span>x</span>"#);
    let query = QueryRoot::from(root.clone());
    assert!(query.query_all("[[[").is_empty());
    assert_eq!(query.query_all("span").len(), 1);
    assert_eq!(query.document(), Some(document()));
    root.remove();
}

#[wasm_bindgen_test]
fn test_apply_style_restores_previous_border() {
    let root = fixture(r#"<div id="box" style="border: 1px solid red"></div>"#);
    let el = by_id(&root, "box");
    let style = || el.dyn_ref::<HtmlElement>().unwrap().style();

    let restore = apply_style(&el, &HighlightStyle::border("3px solid green"));
    assert_eq!(style().get_property_value("border").unwrap(), "3px solid green");

    restore.restore();
    assert_eq!(style().get_property_value("border").unwrap(), "1px solid red");
    root.remove();
}

// === Strategies ===

#[wasm_bindgen_test]
fn test_strategy_selection_by_hostname() {
    let mut manager = BrowserManager::new(Rc::new(NullSink));
    register_all(&mut manager, &CaptureConfig::default());
    assert_eq!(manager.registry().len(), 3);

    assert_eq!(
        manager.auto_select("word-edit.officeapps.live.com"),
        Some(StrategyId::Word)
    );
    assert_eq!(
        manager.auto_select("docs.google.com"),
        Some(StrategyId::GoogleDocs)
    );
    assert_eq!(manager.auto_select("example.org"), Some(StrategyId::Generic));
}

#[wasm_bindgen_test]
fn test_default_finds_multiline_editors() {
    let root = fixture(
        r#"<textarea id="single" rows="1"></textarea>
           <textarea id="multi" rows="5"></textarea>
           <div id="rich" contenteditable="true" style="height: 200px; line-height: 20px">
             body<div contenteditable="true">nested</div>
           </div>
           <div contenteditable="true" role="textbox">single line</div>"#,
    );

    let editors = find_editors(&QueryRoot::from(root.clone()));
    let kinds: Vec<EditorKind> = editors.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EditorKind::Textarea, EditorKind::ContentEditable]);
    assert_eq!(editors[0].element, by_id(&root, "multi"));
    assert_eq!(editors[1].element, by_id(&root, "rich"));

    let mut strategy = DefaultStrategy::new(CaptureConfig::default());
    let nodes = strategy.query_nodes(&QueryRoot::from(root.clone()));
    assert_eq!(nodes.len(), 2);
    assert_eq!(strategy.tracked().len(), 2);
    root.remove();
}

// === Change tracking ===

#[wasm_bindgen_test]
fn test_tracker_reports_insertion() {
    let root = fixture(r#"<div id="ed">Hello</div>"#);
    let ed = by_id(&root, "ed");

    let recording = Rc::new(RecordingSink::default());
    let sink: Rc<dyn CaptureSink> = recording.clone();
    let source = ed.clone();
    let tracker = ChangeTracker::new(
        Box::new(move || Ok(source.text_content().unwrap_or_default())),
        sink,
        CaptureConfig::default().debounce(),
    );

    tracker.prime(false);
    assert!(recording.texts.borrow().is_empty());

    ed.set_text_content(Some("Hello world"));
    let outcome = tracker.reconcile();
    assert_eq!(outcome.events().len(), 1);

    let edits = recording.edits.borrow();
    assert_eq!(edits[0].kind, EditKind::Insertion);
    assert_eq!(edits[0].text.as_deref(), Some(" world"));
    assert_eq!(edits[0].position, 11);
    assert_eq!(recording.texts.borrow().last().unwrap(), "Hello world");

    assert_eq!(tracker.reconcile(), PassOutcome::Unchanged);
    root.remove();
}

// === Panel and frame messages ===

#[wasm_bindgen_test]
fn test_panel_sink_calls_methods() {
    let panel = js_sys::Object::new();
    let update = js_sys::Function::new_with_args("text", "this.last = text;");
    let add = js_sys::Function::new_with_args("event", "this.kind = event.type;");
    js_sys::Reflect::set(&panel, &"updateTypedText".into(), &update).unwrap();
    js_sys::Reflect::set(&panel, &"addEvent".into(), &add).unwrap();

    let sink = PanelSink::new(panel.clone().into());
    sink.typed_text("typed");
    sink.log_event(&LogEvent::new("keydown", 1));

    let last = js_sys::Reflect::get(&panel, &"last".into()).unwrap();
    assert_eq!(last.as_string().as_deref(), Some("typed"));
    let kind = js_sys::Reflect::get(&panel, &"kind".into()).unwrap();
    assert_eq!(kind.as_string().as_deref(), Some("keydown"));
}

#[wasm_bindgen_test]
fn test_panel_without_methods_is_ignored() {
    let sink = PanelSink::new(js_sys::Object::new().into());
    sink.typed_text("nothing happens");
    sink.log_event(&LogEvent::new("keyup", 1));
}

#[wasm_bindgen_test]
fn test_frame_messages_decode_only_ours() {
    let message = FrameMessage::TypedText {
        text: "relayed".into(),
    };
    let value = serde_wasm_bindgen::to_value(&FrameEnvelope::new(message.clone())).unwrap();
    assert_eq!(frames::decode(value), Some(message));

    assert_eq!(frames::decode(JsValue::from_str("unrelated")), None);
    let foreign = js_sys::JSON::parse(
        r#"{"source":"someone-else","message":{"type":"typedText","text":"x"}}"#,
    )
    .unwrap();
    assert_eq!(frames::decode(foreign), None);
}
