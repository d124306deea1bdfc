//! Messages exchanged between frames with `postMessage`.
//!
//! Each frame runs its own copy of the capture code. A frame that attaches
//! to an editor reports to its parent, which forwards to its own sink.

use serde::{Deserialize, Serialize};

use crate::diff::EditEvent;

/// Tag identifying our envelopes among everything else posted to a window.
pub const MESSAGE_SOURCE: &str = "provenance-capture";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FrameMessage {
    #[serde(rename_all = "camelCase")]
    EditorAttached { frame_url: String },
    Edit { event: EditEvent },
    TypedText { text: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEnvelope {
    pub source: String,
    pub message: FrameMessage,
}

impl FrameEnvelope {
    pub fn new(message: FrameMessage) -> Self {
        Self {
            source: MESSAGE_SOURCE.to_string(),
            message,
        }
    }

    pub fn is_ours(&self) -> bool {
        self.source == MESSAGE_SOURCE
    }

    /// The message, if the envelope carries our tag.
    pub fn into_message(self) -> Option<FrameMessage> {
        self.is_ours().then_some(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;

    #[test]
    fn test_envelope_wire_shape() {
        let env = FrameEnvelope::new(FrameMessage::EditorAttached {
            frame_url: "https://word-edit.officeapps.live.com/x".into(),
        });
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["source"], MESSAGE_SOURCE);
        assert_eq!(json["message"]["type"], "editorAttached");
        assert_eq!(
            json["message"]["frameUrl"],
            "https://word-edit.officeapps.live.com/x"
        );
    }

    #[test]
    fn test_edit_message_carries_event() {
        let event = diff("a", "ab", 9).remove(0);
        let env = FrameEnvelope::new(FrameMessage::Edit {
            event: event.clone(),
        });
        let json = serde_json::to_string(&env).unwrap();
        let back: FrameEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_message(), Some(FrameMessage::Edit { event }));
    }

    #[test]
    fn test_foreign_envelopes_are_ignored() {
        let env: FrameEnvelope = serde_json::from_str(
            r#"{"source":"someone-else","message":{"type":"typedText","text":"x"}}"#,
        )
        .unwrap();
        assert_eq!(env.into_message(), None);

        let untagged =
            serde_json::from_str::<FrameEnvelope>(r#"{"type":"COPILOT_SHOW_PASTE_DETAILS"}"#);
        assert!(untagged.is_err());
    }
}
