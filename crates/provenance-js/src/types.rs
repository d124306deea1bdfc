//! Types exposed to JavaScript via wasm-bindgen.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

/// Snapshot of what the capture is doing, for debugging from the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStatus {
    /// `word`, `googleDocs` or `generic`.
    pub strategy: Option<String>,
    pub initialized: bool,
    /// An editor is attached and observed.
    pub active: bool,
    pub hostname: String,
    pub top_frame: bool,
}
