//! JsCapture - the capture lifecycle exposed to JavaScript.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_events::EventListener;
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;

use provenance_browser::dom;
use provenance_browser::{
    BrowserManager, FrameListener, FrameRelaySink, PanelSink, register_all,
};
use provenance_core::{CaptureConfig, CaptureSink, CaptureStrategy};

use crate::types::CaptureStatus;

type SharedManager = Rc<RefCell<BrowserManager>>;

fn initialize(manager: &SharedManager) {
    match manager.borrow_mut().initialize_active() {
        Ok(Some(id)) => info!(%id, "capture started"),
        Ok(None) => debug!("no strategy to start"),
        Err(e) => warn!(error = %e, "capture failed to start"),
    }
}

fn initialize_weak(manager: &Weak<RefCell<BrowserManager>>) {
    if let Some(manager) = manager.upgrade() {
        initialize(&manager);
    }
}

/// One capture session for the frame this module runs in.
#[wasm_bindgen]
pub struct JsCapture {
    manager: SharedManager,
    config: CaptureConfig,
    listeners: Vec<EventListener>,
    frames: Option<FrameListener>,
}

#[wasm_bindgen]
impl JsCapture {
    /// Create a capture session.
    ///
    /// `panel` receives output (`undefined` looks up `window.wordCapturePanel`
    /// on every call). `config` is a partial `CaptureConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(panel: JsValue, config: JsValue) -> Result<JsCapture, JsError> {
        let config: CaptureConfig = if config.is_undefined() || config.is_null() {
            CaptureConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?
        };

        let window = dom::window().map_err(|e| JsError::new(&e.to_string()))?;
        let panel = PanelSink::new(panel);
        let sink: Rc<dyn CaptureSink> = if dom::is_top_frame(&window) {
            Rc::new(panel)
        } else {
            Rc::new(FrameRelaySink::new(panel))
        };

        let mut manager = BrowserManager::new(sink);
        register_all(&mut manager, &config);
        manager.auto_select(&dom::hostname());

        Ok(Self {
            manager: Rc::new(RefCell::new(manager)),
            config,
            listeners: Vec::new(),
            frames: None,
        })
    }

    /// Start once the DOM is ready, and stop on `beforeunload`.
    pub fn start(&mut self) -> Result<(), JsError> {
        if !self.listeners.is_empty() {
            return Ok(());
        }
        let window = dom::window().map_err(|e| JsError::new(&e.to_string()))?;
        let document = dom::document().map_err(|e| JsError::new(&e.to_string()))?;

        if dom::is_top_frame(&window) {
            let sink = self.manager.borrow().sink();
            self.frames = Some(FrameListener::install(&window, sink));
        }

        let weak = Rc::downgrade(&self.manager);
        self.listeners
            .push(EventListener::new(&window, "beforeunload", move |_| {
                if let Some(manager) = weak.upgrade() {
                    manager.borrow_mut().cleanup();
                }
            }));

        if document.ready_state() == "loading" {
            let weak = Rc::downgrade(&self.manager);
            self.listeners
                .push(EventListener::once(&document, "DOMContentLoaded", move |_| {
                    initialize_weak(&weak);
                }));
        } else {
            initialize(&self.manager);
        }
        Ok(())
    }

    /// Tear down the active strategy and all lifecycle listeners.
    pub fn stop(&mut self) {
        self.listeners.clear();
        self.frames = None;
        self.manager.borrow_mut().cleanup();
    }

    /// Clean up and initialize the active strategy again.
    pub fn reinitialize(&mut self) {
        self.manager.borrow_mut().cleanup();
        initialize(&self.manager);
    }

    /// Id of the selected strategy.
    #[wasm_bindgen(js_name = activeStrategy)]
    pub fn active_strategy(&self) -> Option<String> {
        self.manager
            .borrow()
            .active_id()
            .map(|id| id.as_str().to_string())
    }

    /// Whether the selected strategy has an editor attached.
    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.manager
            .borrow()
            .active()
            .is_some_and(|strategy| strategy.is_active())
    }

    pub fn status(&self) -> CaptureStatus {
        let manager = self.manager.borrow();
        CaptureStatus {
            strategy: manager.active_id().map(|id| id.as_str().to_string()),
            initialized: manager.is_initialized(),
            active: manager.active().is_some_and(|s| s.is_active()),
            hostname: dom::hostname(),
            top_frame: dom::window().is_ok_and(|w| dom::is_top_frame(&w)),
        }
    }

    /// The effective configuration, defaults filled in.
    pub fn config(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.config)
            .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
    }
}

impl Drop for JsCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Create a session with `panel` and `config` and start it.
#[wasm_bindgen]
pub fn run(panel: JsValue, config: JsValue) -> Result<JsCapture, JsError> {
    let mut capture = JsCapture::new(panel, config)?;
    capture.start()?;
    Ok(capture)
}
