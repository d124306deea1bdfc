//! Clipboard provenance records.
//!
//! Copy and cut store a small [`ClipboardRecord`] under a well-known key;
//! paste reads it back and reports where the text came from. The store is
//! shared without locking, so the last write wins and readers always compute
//! the record's age.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CaptureError;
use crate::hosts::is_external_source;
use crate::text::utf16_prefix;

/// Key of the most recent copy/cut record.
pub const CLIPBOARD_STORAGE_KEY: &str = "__lastClipboard__";

/// Longest snippet written to log lines.
const LOG_SNIPPET_UNITS: usize = 200;

/// Metadata about the last copied text.
///
/// Every field is optional on the wire; a record that does not parse is
/// treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardRecord {
    pub text: String,
    pub url: String,
    pub title: String,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "ts", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl ClipboardRecord {
    /// Build a record for text copied now, cut to `limit` UTF-16 units.
    pub fn capture(text: &str, url: &str, title: &str, now: u64, limit: usize) -> Self {
        Self {
            text: utf16_prefix(text, limit).to_string(),
            url: url.to_string(),
            title: title.to_string(),
            timestamp: Some(now),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "ignoring malformed clipboard record");
                None
            }
        }
    }

    pub fn to_json(&self) -> Result<String, CaptureError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Age at `now`, clamped to zero when the clock went backwards.
    pub fn age_ms(&self, now: u64) -> Option<u64> {
        self.timestamp
            .filter(|ts| *ts > 0)
            .map(|ts| now.saturating_sub(ts))
    }

    pub fn format_age(&self, now: u64) -> String {
        match self.age_ms(now) {
            Some(ms) => format!("{ms}ms"),
            None => "unknown".to_string(),
        }
    }

    /// True when the record came from a page on another host.
    pub fn is_external(&self, hostname: &str) -> bool {
        is_external_source(&self.url, hostname)
    }

    /// Start of the copied text for log lines.
    pub fn snippet(&self) -> &str {
        utf16_prefix(&self.text, LOG_SNIPPET_UNITS)
    }

    /// What the panel shows for a paste of `pasted` at `now`.
    pub fn to_source(&self, pasted: &str, now: u64) -> ClipboardSource {
        ClipboardSource {
            url: self.url.clone(),
            title: self.title.clone(),
            copied: self.text.clone(),
            pasted: pasted.to_string(),
            age: self.format_age(now),
            timestamp: now,
        }
    }

    /// Human readable summary logged on paste.
    pub fn provenance_line(&self, pasted: &str, now: u64) -> String {
        let from = if self.url.is_empty() {
            "unknown"
        } else {
            self.url.as_str()
        };
        format!(
            "From: {from}\nTitle: {}\nCopied: \"{}\"\nPasted: \"{pasted}\"\nAge: {}",
            self.title,
            self.text,
            self.format_age(now)
        )
    }
}

/// Paste provenance forwarded to the panel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardSource {
    pub url: String,
    pub title: String,
    pub copied: String,
    pub pasted: String,
    /// `"<n>ms"` or `"unknown"`.
    pub age: String,
    pub timestamp: u64,
}

/// Which pastes get forwarded to the panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ForwardPolicy {
    #[default]
    Always,
    /// Only sources from another host.
    ExternalOnly,
}

impl ForwardPolicy {
    pub fn allows(&self, record: &ClipboardRecord, hostname: &str) -> bool {
        match self {
            ForwardPolicy::Always => true,
            ForwardPolicy::ExternalOnly => record.is_external(hostname),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, ts: Option<u64>) -> ClipboardRecord {
        ClipboardRecord {
            text: "copied words".into(),
            url: url.into(),
            title: "Source".into(),
            timestamp: ts,
        }
    }

    #[test]
    fn test_capture_truncates_to_limit() {
        let long = "a".repeat(2500);
        let rec = ClipboardRecord::capture(&long, "https://a.test/", "A", 7, 2000);
        assert_eq!(rec.text.len(), 2000);
        assert_eq!(rec.timestamp, Some(7));

        // A surrogate pair straddling the limit is dropped whole.
        let rec = ClipboardRecord::capture("ab😀", "", "", 1, 3);
        assert_eq!(rec.text, "ab");
    }

    #[test]
    fn test_parse_uses_wire_names() {
        let rec = ClipboardRecord::parse(
            r#"{"text":"hi","url":"https://a.test/","title":"T","ts":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(rec.timestamp, Some(1_700_000_000_000));

        let json: serde_json::Value = serde_json::from_str(&rec.to_json().unwrap()).unwrap();
        assert_eq!(json["ts"], 1_700_000_000_000u64);
    }

    #[test]
    fn test_malformed_and_partial_records() {
        assert!(ClipboardRecord::parse("not json").is_none());
        assert!(ClipboardRecord::parse("null").is_none());
        assert!(ClipboardRecord::parse(r#"{"ts":"yesterday"}"#).is_none());

        let partial = ClipboardRecord::parse(r#"{"text":"only text"}"#).unwrap();
        assert_eq!(partial.url, "");
        assert_eq!(partial.timestamp, None);
    }

    #[test]
    fn test_age_never_negative() {
        let rec = record("https://a.test/", Some(10_000));
        assert_eq!(rec.age_ms(12_500), Some(2_500));
        assert_eq!(rec.format_age(12_500), "2500ms");

        // Clock skew: record stamped in the future.
        assert_eq!(rec.age_ms(9_000), Some(0));
        assert_eq!(rec.format_age(9_000), "0ms");

        assert_eq!(record("", None).format_age(5), "unknown");
        assert_eq!(record("", Some(0)).format_age(5), "unknown");
    }

    #[test]
    fn test_forward_policy() {
        let external = record("https://en.wikipedia.org/wiki/Rust", Some(1));
        let internal = record("https://docs.google.com/document/d/1", Some(1));

        assert!(ForwardPolicy::Always.allows(&internal, "docs.google.com"));
        assert!(ForwardPolicy::ExternalOnly.allows(&external, "docs.google.com"));
        assert!(!ForwardPolicy::ExternalOnly.allows(&internal, "docs.google.com"));
    }

    #[test]
    fn test_source_and_provenance_line() {
        let rec = record("", Some(100));
        let source = rec.to_source("pasted words", 150);
        assert_eq!(source.age, "50ms");
        assert_eq!(source.copied, "copied words");
        assert_eq!(source.timestamp, 150);

        let line = rec.provenance_line("pasted words", 150);
        assert!(line.starts_with("From: unknown\n"));
        assert!(line.contains("Pasted: \"pasted words\""));
        assert!(line.ends_with("Age: 50ms"));
    }
}
