//! Content-script entry point for provenance capture.
//!
//! Load the generated module in every frame of a page and call
//! [`run`] (or construct a [`JsCapture`] and call `start`). The strategy is
//! picked from `location.hostname`; output goes to the panel object passed
//! in, or to `window.wordCapturePanel` when none is given.

mod capture;
mod types;

pub use capture::*;
pub use types::*;

use wasm_bindgen::prelude::*;

/// Install the panic hook and route `tracing` output to the console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    // A second module instance in the same realm already installed one.
    let _ = set_global_default(Registry::default().with(wasm_layer));
}
