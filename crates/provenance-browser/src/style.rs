//! Inline style highlights and the "capture active" indicator.

use gloo_events::EventListener;
use tracing::debug;
use wasm_bindgen::JsCast;
use web_sys::{Element, EventTarget, HtmlElement};

use provenance_core::strategy::{FOCUSED_SHADOW, RESTING_SHADOW};
use provenance_core::{HighlightStyle, Restore};

fn set_property(el: &HtmlElement, name: &str, value: &str) {
    if let Err(e) = el.style().set_property(name, value) {
        debug!(property = name, error = ?e, "style update failed");
    }
}

/// Apply every property `style` sets to `el`; the returned [`Restore`] puts
/// back the previous inline values.
pub fn apply_style(el: &Element, style: &HighlightStyle) -> Restore {
    let Some(html) = el.dyn_ref::<HtmlElement>() else {
        return Restore::noop();
    };

    let properties = [
        ("border", style.border.as_deref()),
        ("box-shadow", style.box_shadow.as_deref()),
        ("outline", style.outline.as_deref()),
    ];

    let mut previous = Vec::new();
    for (name, value) in properties {
        let Some(value) = value else { continue };
        let before = html.style().get_property_value(name).unwrap_or_default();
        set_property(html, name, value);
        previous.push((name, before));
    }

    if previous.is_empty() {
        return Restore::noop();
    }
    let html = html.clone();
    Restore::new(move || {
        for (name, before) in previous.into_iter().rev() {
            set_property(&html, name, &before);
        }
    })
}

/// Green border with a glow that brightens while `focus_source` has focus.
pub struct Indicator {
    restore: Restore,
    _listeners: [EventListener; 2],
}

impl Indicator {
    /// `focus`/`blur` name the events that toggle the glow, e.g.
    /// `("focus", "blur")` on an editor or `("focusin", "focusout")` on a
    /// document.
    pub fn attach(
        target: &Element,
        focus_source: &EventTarget,
        (focus, blur): (&'static str, &'static str),
    ) -> Self {
        let restore = apply_style(target, &HighlightStyle::active());

        let glow = |shadow: &'static str| {
            let target = target.clone();
            move |_: &web_sys::Event| {
                if let Some(html) = target.dyn_ref::<HtmlElement>() {
                    set_property(html, "box-shadow", shadow);
                }
            }
        };

        let listeners = [
            EventListener::new(focus_source, focus, glow(FOCUSED_SHADOW)),
            EventListener::new(focus_source, blur, glow(RESTING_SHADOW)),
        ];
        debug!(
            class = %target.get_attribute("class").unwrap_or_default(),
            id = %target.id(),
            "visual indicator added"
        );

        Self {
            restore,
            _listeners: listeners,
        }
    }

    /// Remove the listeners and restore the original styles.
    pub fn remove(self) {
        let Self {
            restore,
            _listeners: listeners,
        } = self;
        drop(listeners);
        restore.restore();
    }
}
