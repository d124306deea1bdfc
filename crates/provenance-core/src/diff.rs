//! Single-hunk diff between two canonical text snapshots.
//!
//! The edit is bounded by the longest common prefix and the longest common
//! suffix that does not overlap it. A replace comes out as a delete followed
//! by an insertion, so one pass yields at most two events.
//!
//! Offsets are UTF-16 code units. Surrogate pairs and combining marks are not
//! treated specially, so an edit that only touches half of a pair produces an
//! insertion text containing a replacement character.

use serde::{Deserialize, Serialize};

/// What a capture event describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Delete,
    Insertion,
}

/// Atomic output of a reconciliation pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEvent {
    pub kind: EditKind,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Deletions: start of the removed span in the old text.
    /// Insertions: end of the inserted span in the new text.
    pub position: usize,
    pub length: usize,
    /// Inserted text, present only for insertions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl EditEvent {
    pub fn is_insertion(&self) -> bool {
        self.kind == EditKind::Insertion
    }

    pub fn is_delete(&self) -> bool {
        self.kind == EditKind::Delete
    }
}

/// The changed region between two texts, in UTF-16 code units.
///
/// `old[..start] == new[..start]` and `old[old_end..] == new[new_end..]`,
/// with `old_end >= start` and `new_end >= start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditSpan {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
}

impl EditSpan {
    /// Compute the span between two UTF-16 sequences.
    pub fn between(old: &[u16], new: &[u16]) -> Self {
        let start = old
            .iter()
            .zip(new.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut old_end = old.len();
        let mut new_end = new.len();
        while old_end > start && new_end > start && old[old_end - 1] == new[new_end - 1] {
            old_end -= 1;
            new_end -= 1;
        }

        Self {
            start,
            old_end,
            new_end,
        }
    }

    /// Compute the span between two strings.
    pub fn of(old: &str, new: &str) -> Self {
        let old: Vec<u16> = old.encode_utf16().collect();
        let new: Vec<u16> = new.encode_utf16().collect();
        Self::between(&old, &new)
    }

    pub fn deleted_len(&self) -> usize {
        self.old_end - self.start
    }

    pub fn inserted_len(&self) -> usize {
        self.new_end - self.start
    }

    /// True when the two texts were identical.
    pub fn is_empty(&self) -> bool {
        self.deleted_len() == 0 && self.inserted_len() == 0
    }
}

/// Diff two snapshots into zero, one or two events (delete before insertion).
///
/// The insertion is stamped one millisecond after the deletion so consumers
/// ordering by timestamp replay a replace in the right order.
pub fn diff(old: &str, new: &str, timestamp: u64) -> Vec<EditEvent> {
    let old_units: Vec<u16> = old.encode_utf16().collect();
    let new_units: Vec<u16> = new.encode_utf16().collect();
    let span = EditSpan::between(&old_units, &new_units);

    tracing::trace!(
        start = span.start,
        old_end = span.old_end,
        new_end = span.new_end,
        "diff range"
    );

    let mut events = Vec::with_capacity(2);

    if span.deleted_len() > 0 {
        events.push(EditEvent {
            kind: EditKind::Delete,
            timestamp,
            position: span.start,
            length: span.deleted_len(),
            text: None,
        });
    }

    if span.inserted_len() > 0 {
        let inserted = String::from_utf16_lossy(&new_units[span.start..span.new_end]);
        events.push(EditEvent {
            kind: EditKind::Insertion,
            timestamp: timestamp + 1,
            position: span.start + span.inserted_len(),
            length: span.inserted_len(),
            text: Some(inserted),
        });
    }

    events
}

/// [`diff`] stamped with the current wall-clock time.
pub fn diff_now(old: &str, new: &str) -> Vec<EditEvent> {
    diff(old, new, crate::now_ms())
}
