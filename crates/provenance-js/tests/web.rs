//! WASM browser tests for provenance-js.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use provenance_js::JsCapture;

fn ok<T>(result: Result<T, JsError>) -> T {
    match result {
        Ok(value) => value,
        Err(_) => panic!("call threw"),
    }
}

#[wasm_bindgen_test]
fn test_generic_strategy_on_test_host() {
    let capture = ok(JsCapture::new(JsValue::UNDEFINED, JsValue::UNDEFINED));
    // The test runner serves from localhost, which only the catch-all claims.
    assert_eq!(capture.active_strategy().as_deref(), Some("generic"));

    let status = capture.status();
    assert!(!status.initialized);
    assert!(!status.active);
}

#[wasm_bindgen_test]
fn test_partial_config_keeps_defaults() {
    let config = js_sys::JSON::parse(r#"{"maxAttempts": 3}"#).unwrap();
    let capture = ok(JsCapture::new(JsValue::NULL, config));

    let effective = ok(capture.config());
    let get = |key: &str| js_sys::Reflect::get(&effective, &key.into()).unwrap();
    assert_eq!(get("maxAttempts").as_f64(), Some(3.0));
    assert_eq!(get("debounceMs").as_f64(), Some(150.0));
}

#[wasm_bindgen_test]
fn test_invalid_config_is_rejected() {
    assert!(JsCapture::new(JsValue::UNDEFINED, JsValue::from_str("fast")).is_err());
}

#[wasm_bindgen_test]
fn test_start_and_stop() {
    let mut capture = ok(JsCapture::new(JsValue::UNDEFINED, JsValue::UNDEFINED));
    ok(capture.start());
    assert!(capture.status().initialized);

    capture.stop();
    assert!(!capture.status().initialized);
}
