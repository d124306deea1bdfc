//! Editor acquisition: a bounded, cancellable retry loop around a locator.

use std::future::Future;
use std::time::Duration;

use futures_util::future::{AbortRegistration, Abortable};
use tracing::{debug, info, warn};

use crate::locator::{EditorHandle, EditorLocator, LocatorDiagnostics};

/// Where a strategy is in finding its editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AcquisitionState {
    #[default]
    Idle,
    Searching {
        attempt: u32,
    },
    Attached,
    /// The element left the DOM; a new search is due.
    Detached,
    /// Retry budget exhausted. Terminal until reset.
    Failed,
}

/// Tracks [`AcquisitionState`] transitions for one strategy.
#[derive(Clone, Debug, Default)]
pub struct Acquisition {
    state: AcquisitionState,
}

impl Acquisition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.state == AcquisitionState::Attached
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.state, AcquisitionState::Searching { .. })
    }

    /// Start searching from `Idle` or `Detached`. Returns false otherwise.
    pub fn begin_search(&mut self) -> bool {
        match self.state {
            AcquisitionState::Idle | AcquisitionState::Detached => {
                self.state = AcquisitionState::Searching { attempt: 0 };
                true
            }
            _ => false,
        }
    }

    pub fn attach(&mut self) {
        self.state = AcquisitionState::Attached;
    }

    /// Mark the editor as gone. Only meaningful while attached.
    pub fn detach(&mut self) -> bool {
        if self.state == AcquisitionState::Attached {
            self.state = AcquisitionState::Detached;
            true
        } else {
            false
        }
    }

    pub fn fail(&mut self) {
        self.state = AcquisitionState::Failed;
    }

    pub fn reset(&mut self) {
        self.state = AcquisitionState::Idle;
    }

    /// Apply the result of an [`acquire`] run.
    pub fn settle<E, D>(&mut self, outcome: &AcquireOutcome<E, D>) {
        match outcome {
            AcquireOutcome::Found { .. } => self.attach(),
            AcquireOutcome::Exhausted { .. } => self.fail(),
            AcquireOutcome::Cancelled => self.reset(),
        }
    }
}

/// Attempt cap and fixed delay between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            interval: Duration::from_millis(500),
        }
    }
}

/// Source of retry delays.
pub trait RetryTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// How an acquisition run ended.
#[derive(Clone, Debug, PartialEq)]
pub enum AcquireOutcome<E, D> {
    Found {
        handle: EditorHandle<E, D>,
        attempts: u32,
    },
    Exhausted {
        attempts: u32,
        diagnostics: LocatorDiagnostics,
    },
    Cancelled,
}

impl<E, D> AcquireOutcome<E, D> {
    pub fn into_handle(self) -> Option<EditorHandle<E, D>> {
        match self {
            AcquireOutcome::Found { handle, .. } => Some(handle),
            _ => None,
        }
    }
}

/// Run the locator until it finds an editor or the policy runs out.
///
/// Sleeps only between attempts, never after the last one.
pub async fn acquire<L, T>(
    locator: &L,
    timer: &T,
    policy: &RetryPolicy,
) -> AcquireOutcome<L::Element, L::Document>
where
    L: EditorLocator,
    T: RetryTimer,
{
    for attempt in 1..=policy.max_attempts {
        debug!(attempt, max_attempts = policy.max_attempts, "search attempt");

        if let Some(handle) = locator.locate() {
            info!(attempt, "editor found");
            return AcquireOutcome::Found {
                handle,
                attempts: attempt,
            };
        }

        if attempt < policy.max_attempts {
            timer.sleep(policy.interval).await;
        }
    }

    let diagnostics = locator.diagnostics();
    warn!(
        attempts = policy.max_attempts,
        iframe_count = diagnostics.iframe_count,
        editable_count = diagnostics.editable_count,
        top_frame = diagnostics.top_frame,
        url = diagnostics.url.as_deref().unwrap_or("unknown"),
        "failed to find editor"
    );
    AcquireOutcome::Exhausted {
        attempts: policy.max_attempts,
        diagnostics,
    }
}

/// [`acquire`], interrupted when the paired `AbortHandle` fires.
pub async fn acquire_cancellable<L, T>(
    locator: &L,
    timer: &T,
    policy: &RetryPolicy,
    registration: AbortRegistration,
) -> AcquireOutcome<L::Element, L::Document>
where
    L: EditorLocator,
    T: RetryTimer,
{
    match Abortable::new(acquire(locator, timer, policy), registration).await {
        Ok(outcome) => outcome,
        Err(_aborted) => {
            debug!("editor search cancelled");
            AcquireOutcome::Cancelled
        }
    }
}
