//! Key and clipboard activity records.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::strategy::SelectionRange;

/// DOM event types recorded as activity.
pub const LOGGED_EVENT_TYPES: &[&str] = &["keydown", "keyup", "keypress", "paste", "copy", "cut"];

/// One observed key or clipboard event inside an editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    #[serde(rename = "type")]
    pub kind: SmolStr,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_tag: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionRange>,
}

impl LogEvent {
    pub fn new(kind: impl Into<SmolStr>, timestamp: u64) -> Self {
        Self {
            kind: kind.into(),
            timestamp,
            key: None,
            data: None,
            target_tag: None,
            selection: None,
        }
    }

    pub fn is_logged_type(kind: &str) -> bool {
        LOGGED_EVENT_TYPES.contains(&kind)
    }
}

/// Summary of clipboard data carried by a paste/copy/cut event.
///
/// Plain text wins and is cut to 100 characters; otherwise the HTML length.
pub fn clipboard_summary(plain: &str, html: &str) -> String {
    if plain.is_empty() {
        format!("html length: {}", crate::text::utf16_len(html))
    } else {
        format!("text: {}", crate::text::utf16_prefix(plain, 100))
    }
}
