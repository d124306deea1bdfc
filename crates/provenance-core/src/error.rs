//! Error types for capture operations.

use thiserror::Error;

/// Errors that can occur while locating, observing or extracting from an editor.
///
/// None of these are fatal to the content script. Callers recover locally:
/// a failed reconciliation keeps the previous snapshot, a denied iframe is
/// skipped, a broken storage entry is treated as absent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CaptureError {
    /// A host DOM call threw.
    #[error("DOM error: {0}")]
    Dom(String),

    /// Iframe inspection was blocked by the same-origin policy.
    #[error("cross-origin frame access denied")]
    CrossOrigin,

    /// The tracked editor element is no longer attached to its document.
    #[error("editor element detached")]
    Detached,

    /// No editor surface could be found.
    #[error("editor not found: {0}")]
    NotFound(String),

    /// Key-value storage read or write failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CaptureError {
    fn from(e: serde_json::Error) -> Self {
        CaptureError::Serialization(e.to_string())
    }
}
