//! Clipboard record persistence.
//!
//! Records go to `chrome.storage.local` when the extension API is reachable
//! and always to `localStorage`. Reads prefer the extension store. Anything
//! missing or malformed reads as absent.

use gloo_storage::errors::StorageError;
use gloo_storage::{LocalStorage, Storage};
use js_sys::{Function, Object, Promise, Reflect};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use provenance_core::{CaptureError, ClipboardRecord};

use crate::dom::{js_error, serde_error};

/// `chrome.storage.local`, if this context has it.
fn extension_store() -> Option<Object> {
    let mut value: JsValue = js_sys::global().into();
    for name in ["chrome", "storage", "local"] {
        value = Reflect::get(&value, &JsValue::from_str(name)).ok()?;
        if value.is_undefined() || value.is_null() {
            return None;
        }
    }
    value.dyn_into::<Object>().ok()
}

/// Call `store[method](arg)` and await the promise it returns.
async fn call_extension(
    store: &Object,
    method: &str,
    arg: &JsValue,
) -> Result<JsValue, CaptureError> {
    let func = Reflect::get(store, &JsValue::from_str(method))
        .map_err(js_error)?
        .dyn_into::<Function>()
        .map_err(|_| CaptureError::Storage(format!("chrome.storage.local.{method} missing")))?;
    let promise = func
        .call1(store, arg)
        .map_err(js_error)?
        .dyn_into::<Promise>()
        .map_err(|_| CaptureError::Storage(format!("{method} did not return a promise")))?;
    JsFuture::from(promise).await.map_err(js_error)
}

/// Reader and writer for the last clipboard record under one key.
#[derive(Clone, Debug)]
pub struct ClipboardStore {
    key: String,
}

impl ClipboardStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored record, extension store first.
    pub async fn read(&self) -> Option<ClipboardRecord> {
        if let Some(store) = extension_store() {
            match self.read_extension(&store).await {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "extension storage read failed"),
            }
        }
        self.read_local()
    }

    async fn read_extension(
        &self,
        store: &Object,
    ) -> Result<Option<ClipboardRecord>, CaptureError> {
        let keys = js_sys::Array::of1(&JsValue::from_str(&self.key));
        let items = call_extension(store, "get", &keys).await?;
        let value = Reflect::get(&items, &JsValue::from_str(&self.key)).map_err(js_error)?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        Ok(serde_wasm_bindgen::from_value(value).ok())
    }

    pub fn read_local(&self) -> Option<ClipboardRecord> {
        match LocalStorage::get::<ClipboardRecord>(&self.key) {
            Ok(record) => Some(record),
            Err(StorageError::KeyNotFound(_)) => None,
            Err(e) => {
                debug!(error = %e, "ignoring unreadable clipboard record");
                None
            }
        }
    }

    /// Store `record` everywhere available. The extension write completes in
    /// the background; last write wins.
    pub fn write(&self, record: &ClipboardRecord) {
        if let Some(store) = extension_store() {
            match self.extension_items(record) {
                Ok(items) => wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = call_extension(&store, "set", &items).await {
                        debug!(error = %e, "extension storage write failed");
                    }
                }),
                Err(e) => debug!(error = %e, "clipboard record not serializable"),
            }
        }

        if let Err(e) = LocalStorage::set(&self.key, record) {
            debug!(error = %e, "localStorage write failed");
        }
    }

    fn extension_items(&self, record: &ClipboardRecord) -> Result<JsValue, CaptureError> {
        let items = Object::new();
        let value = serde_wasm_bindgen::to_value(record).map_err(serde_error)?;
        Reflect::set(&items, &JsValue::from_str(&self.key), &value).map_err(js_error)?;
        Ok(items.into())
    }
}
