//! Snapshot bookkeeping for reconciliation passes.
//!
//! A pass extracts the current canonical text, diffs it against the previous
//! snapshot and replaces the snapshot. At most one pass runs at a time; a
//! trigger that arrives while one is in flight is dropped, not queued.

use std::fmt::Display;

use tracing::{trace, warn};

use crate::diff::{EditEvent, diff};

/// What one reconciliation trigger did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// Another pass was in flight.
    Skipped,
    Unchanged,
    Changed(Vec<EditEvent>),
    /// Extraction failed; the previous snapshot is kept.
    Abandoned,
}

impl PassOutcome {
    pub fn events(&self) -> &[EditEvent] {
        match self {
            PassOutcome::Changed(events) => events,
            _ => &[],
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Reconciler {
    previous: String,
    in_flight: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last committed snapshot.
    pub fn previous(&self) -> &str {
        &self.previous
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Set the baseline without emitting events.
    pub fn prime(&mut self, text: String) {
        trace!(len = text.len(), "snapshot primed");
        self.previous = text;
    }

    /// Claim the pass. Returns false when one is already running.
    pub fn begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Finish a claimed pass with freshly extracted text.
    pub fn complete(&mut self, current: String, timestamp: u64) -> Vec<EditEvent> {
        let events = diff(&self.previous, &current, timestamp);
        self.previous = current;
        self.in_flight = false;
        events
    }

    /// Release a claimed pass without touching the snapshot.
    pub fn abandon(&mut self) {
        self.in_flight = false;
    }

    pub fn reset(&mut self) {
        self.previous.clear();
        self.in_flight = false;
    }

    /// Run a complete pass with a synchronous extractor.
    pub fn run<E: Display>(
        &mut self,
        extract: impl FnOnce() -> Result<String, E>,
        timestamp: u64,
    ) -> PassOutcome {
        if !self.begin() {
            trace!("reconciliation in flight, trigger dropped");
            return PassOutcome::Skipped;
        }

        match extract() {
            Ok(current) => {
                let events = self.complete(current, timestamp);
                if events.is_empty() {
                    PassOutcome::Unchanged
                } else {
                    PassOutcome::Changed(events)
                }
            }
            Err(e) => {
                warn!(error = %e, "reconciliation abandoned");
                self.abandon();
                PassOutcome::Abandoned
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CaptureError;
    use crate::diff::EditKind;

    fn ok(text: &str) -> impl FnOnce() -> Result<String, CaptureError> + '_ {
        move || Ok(text.to_string())
    }

    #[test]
    fn test_second_pass_on_same_state_is_silent() {
        let mut r = Reconciler::new();
        let first = r.run(ok("hello"), 1);
        assert_eq!(first.events().len(), 1);
        assert_eq!(r.run(ok("hello"), 2), PassOutcome::Unchanged);
    }

    #[test]
    fn test_primed_baseline_emits_nothing() {
        let mut r = Reconciler::new();
        r.prime("existing document".into());
        assert_eq!(r.run(ok("existing document"), 1), PassOutcome::Unchanged);

        let outcome = r.run(ok("existing document!"), 2);
        let events = outcome.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EditKind::Insertion);
        assert_eq!(events[0].text.as_deref(), Some("!"));
    }

    #[test]
    fn test_concurrent_trigger_is_dropped() {
        let mut r = Reconciler::new();
        assert!(r.begin());
        assert_eq!(r.run(ok("ignored"), 1), PassOutcome::Skipped);
        assert_eq!(r.previous(), "");

        let events = r.complete("abc".into(), 2);
        assert_eq!(events.len(), 1);
        assert!(!r.is_in_flight());
    }

    #[test]
    fn test_failed_extraction_keeps_snapshot() {
        let mut r = Reconciler::new();
        r.prime("before".into());
        let outcome = r.run(|| Err::<String, _>(CaptureError::Detached), 1);
        assert_eq!(outcome, PassOutcome::Abandoned);
        assert_eq!(r.previous(), "before");
        assert!(!r.is_in_flight());

        // Next trigger retries against the retained snapshot.
        let outcome = r.run(ok("before after"), 2);
        assert_eq!(outcome.events()[0].text.as_deref(), Some(" after"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut r = Reconciler::new();
        r.prime("text".into());
        r.begin();
        r.reset();
        assert_eq!(r.previous(), "");
        assert!(!r.is_in_flight());
    }
}
