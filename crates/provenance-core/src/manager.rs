//! Strategy registry and orchestration.

use std::rc::Rc;

use tracing::{debug, info};

use crate::clipboard::ClipboardSource;
use crate::diff::EditEvent;
use crate::error::CaptureError;
use crate::events::LogEvent;
use crate::sink::CaptureSink;
use crate::strategy::{CaptureStrategy, StrategyId};
use crate::text::{utf16_len, utf16_prefix};

/// Characters of inserted text shown in edit log lines.
const PREVIEW_UNITS: usize = 50;

pub type DynStrategy<N, R> = Box<dyn CaptureStrategy<Node = N, Root = R>>;

/// Strategies in evaluation order, one per [`StrategyId`].
///
/// Default strategies always sort after specific ones, whatever order they
/// were registered in.
pub struct StrategyRegistry<N, R> {
    strategies: Vec<DynStrategy<N, R>>,
}

impl<N, R> Default for StrategyRegistry<N, R> {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }
}

impl<N, R> StrategyRegistry<N, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a strategy. Returns false if one with the same id exists.
    pub fn register(&mut self, strategy: DynStrategy<N, R>) -> bool {
        let id = strategy.id();
        if self.contains(id) {
            debug!(%id, "strategy already registered");
            return false;
        }

        if strategy.is_default() {
            self.strategies.push(strategy);
        } else {
            let first_default = self
                .strategies
                .iter()
                .position(|s| s.is_default())
                .unwrap_or(self.strategies.len());
            self.strategies.insert(first_default, strategy);
        }
        debug!(%id, "strategy registered");
        true
    }

    pub fn contains(&self, id: StrategyId) -> bool {
        self.strategies.iter().any(|s| s.id() == id)
    }

    pub fn ids(&self) -> Vec<StrategyId> {
        self.strategies.iter().map(|s| s.id()).collect()
    }

    pub fn get(&self, id: StrategyId) -> Option<&DynStrategy<N, R>> {
        self.strategies.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: StrategyId) -> Option<&mut DynStrategy<N, R>> {
        self.strategies.iter_mut().find(|s| s.id() == id)
    }

    /// First strategy whose hostname predicate accepts `hostname`.
    pub fn select(&self, hostname: &str) -> Option<StrategyId> {
        self.strategies
            .iter()
            .find(|s| s.matches(hostname))
            .map(|s| s.id())
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// Log line for one edit event.
pub fn describe_edit(event: &EditEvent) -> String {
    match &event.text {
        Some(text) => {
            let preview = utf16_prefix(text, PREVIEW_UNITS);
            let ellipsis = if utf16_len(text) > PREVIEW_UNITS {
                "..."
            } else {
                ""
            };
            format!("{preview}{ellipsis}")
        }
        None => String::new(),
    }
}

/// Logs everything passing through, then forwards it.
struct ManagedSink {
    inner: Rc<dyn CaptureSink>,
}

impl CaptureSink for ManagedSink {
    fn edit(&self, event: &EditEvent) {
        info!(
            kind = ?event.kind,
            position = event.position,
            length = event.length,
            timestamp = event.timestamp,
            text = %describe_edit(event),
            "processing capture event"
        );
        self.inner.edit(event);
    }

    fn typed_text(&self, text: &str) {
        debug!(len = utf16_len(text), "typed text updated");
        self.inner.typed_text(text);
    }

    fn clipboard_source(&self, source: &ClipboardSource) {
        info!(url = %source.url, age = %source.age, "clipboard source");
        self.inner.clipboard_source(source);
    }

    fn log_event(&self, event: &LogEvent) {
        debug!(kind = %event.kind, key = ?event.key, "capture activity");
        self.inner.log_event(event);
    }
}

/// Owns the strategies, picks one for the page and drives its lifecycle.
pub struct CaptureManager<N, R> {
    registry: StrategyRegistry<N, R>,
    active: Option<StrategyId>,
    initialized: bool,
    sink: Rc<dyn CaptureSink>,
}

impl<N, R> CaptureManager<N, R> {
    pub fn new(sink: Rc<dyn CaptureSink>) -> Self {
        debug!("capture manager initialized");
        Self {
            registry: StrategyRegistry::new(),
            active: None,
            initialized: false,
            sink: Rc::new(ManagedSink { inner: sink }),
        }
    }

    /// The logging sink handed to strategies.
    pub fn sink(&self) -> Rc<dyn CaptureSink> {
        self.sink.clone()
    }

    pub fn register(&mut self, strategy: DynStrategy<N, R>) -> bool {
        self.registry.register(strategy)
    }

    pub fn registry(&self) -> &StrategyRegistry<N, R> {
        &self.registry
    }

    /// Pick the strategy for `hostname` and remember it as active.
    pub fn auto_select(&mut self, hostname: &str) -> Option<StrategyId> {
        debug!(hostname, "auto-selecting strategy");
        let selected = self.registry.select(hostname);
        match selected {
            Some(id) => info!(%id, "strategy selected"),
            None => info!("no matching strategy found"),
        }
        self.active = selected;
        selected
    }

    pub fn active_id(&self) -> Option<StrategyId> {
        self.active
    }

    pub fn active(&self) -> Option<&DynStrategy<N, R>> {
        self.active.and_then(|id| self.registry.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut DynStrategy<N, R>> {
        self.active.and_then(|id| self.registry.get_mut(id))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialize the active strategy once.
    pub fn initialize_active(&mut self) -> Result<Option<StrategyId>, CaptureError> {
        if self.initialized {
            return Ok(self.active);
        }
        let sink = self.sink.clone();
        let Some(strategy) = self.active_mut() else {
            return Ok(None);
        };
        strategy.initialize(sink)?;
        self.initialized = true;
        Ok(self.active)
    }

    /// Log and forward an edit event.
    pub fn process_capture_event(&self, event: &EditEvent) {
        self.sink.edit(event);
    }

    /// Tear down the active strategy. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        if !self.initialized {
            return;
        }
        if let Some(strategy) = self.active_mut() {
            strategy.cleanup();
        }
        self.initialized = false;
        debug!("capture manager cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::diff::diff;
    use crate::sink::RecordingSink;
    use crate::strategy::{HighlightStyle, Restore};

    #[derive(Default)]
    struct Counters {
        init: Cell<u32>,
        cleanup: Cell<u32>,
    }

    struct FakeStrategy {
        id: StrategyId,
        host: Option<&'static str>,
        counters: Rc<Counters>,
        sink: Option<Rc<dyn CaptureSink>>,
    }

    impl FakeStrategy {
        fn boxed(
            id: StrategyId,
            host: Option<&'static str>,
            counters: Rc<Counters>,
        ) -> DynStrategy<(), ()> {
            Box::new(Self {
                id,
                host,
                counters,
                sink: None,
            })
        }
    }

    impl CaptureStrategy for FakeStrategy {
        type Node = ();
        type Root = ();

        fn id(&self) -> StrategyId {
            self.id
        }

        fn matches(&self, hostname: &str) -> bool {
            self.host.is_none_or(|h| hostname.contains(h))
        }

        fn is_default(&self) -> bool {
            self.host.is_none()
        }

        fn query_nodes(&mut self, _root: &()) -> Vec<()> {
            vec![()]
        }

        fn extract_text(&self, _node: &()) -> String {
            String::new()
        }

        fn initialize(&mut self, sink: Rc<dyn CaptureSink>) -> Result<(), CaptureError> {
            self.counters.init.set(self.counters.init.get() + 1);
            self.sink = Some(sink);
            Ok(())
        }

        fn cleanup(&mut self) {
            self.counters.cleanup.set(self.counters.cleanup.get() + 1);
            self.sink = None;
        }

        fn highlight(&mut self, _style: &HighlightStyle, _node: Option<&()>) -> Restore {
            Restore::noop()
        }
    }

    fn manager() -> (CaptureManager<(), ()>, Rc<RecordingSink>, Rc<Counters>) {
        let recording = Rc::new(RecordingSink::default());
        let counters = Rc::new(Counters::default());
        let mut m = CaptureManager::new(recording.clone());
        // Default registered first on purpose.
        m.register(FakeStrategy::boxed(StrategyId::Generic, None, counters.clone()));
        m.register(FakeStrategy::boxed(
            StrategyId::Word,
            Some("office.com"),
            counters.clone(),
        ));
        m.register(FakeStrategy::boxed(
            StrategyId::GoogleDocs,
            Some("docs.google.com"),
            counters.clone(),
        ));
        (m, recording, counters)
    }

    #[test]
    fn test_default_strategy_evaluated_last() {
        let (m, _, _) = manager();
        assert_eq!(
            m.registry().ids(),
            vec![StrategyId::Word, StrategyId::GoogleDocs, StrategyId::Generic]
        );
    }

    #[test]
    fn test_auto_select_by_hostname() {
        let (mut m, _, _) = manager();
        assert_eq!(m.auto_select("docs.google.com"), Some(StrategyId::GoogleDocs));
        assert_eq!(m.auto_select("www.office.com"), Some(StrategyId::Word));
        assert_eq!(m.auto_select("example.org"), Some(StrategyId::Generic));
        assert_eq!(m.active_id(), Some(StrategyId::Generic));
    }

    #[test]
    fn test_no_match_without_default() {
        let mut m: CaptureManager<(), ()> = CaptureManager::new(Rc::new(RecordingSink::default()));
        m.register(FakeStrategy::boxed(
            StrategyId::Word,
            Some("office.com"),
            Rc::new(Counters::default()),
        ));
        assert_eq!(m.auto_select("example.org"), None);
        assert_eq!(m.initialize_active(), Ok(None));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let (mut m, _, counters) = manager();
        assert!(!m.register(FakeStrategy::boxed(StrategyId::Word, Some("x"), counters)));
        assert_eq!(m.registry().len(), 3);
    }

    #[test]
    fn test_lifecycle_is_idempotent() {
        let (mut m, _, counters) = manager();
        m.auto_select("docs.google.com");
        assert_eq!(m.initialize_active(), Ok(Some(StrategyId::GoogleDocs)));
        assert_eq!(m.initialize_active(), Ok(Some(StrategyId::GoogleDocs)));
        assert_eq!(counters.init.get(), 1);

        m.cleanup();
        m.cleanup();
        assert_eq!(counters.cleanup.get(), 1);
        assert!(!m.is_initialized());
    }

    #[test]
    fn test_events_forwarded_through_managed_sink() {
        let (m, recording, _) = manager();
        for event in diff("The cat sat.", "The dog sat.", 1) {
            m.process_capture_event(&event);
        }
        assert_eq!(recording.edits.borrow().len(), 2);

        m.sink().typed_text("The dog sat.");
        assert_eq!(recording.texts.borrow().as_slice(), ["The dog sat."]);
    }

    #[test]
    fn test_describe_edit_preview() {
        let long = "x".repeat(60);
        let event = diff("", &long, 0).remove(0);
        assert_eq!(describe_edit(&event), format!("{}...", "x".repeat(50)));

        let event = diff("abc", "", 0).remove(0);
        assert_eq!(describe_edit(&event), "");
    }
}
