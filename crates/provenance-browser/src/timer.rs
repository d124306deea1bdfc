//! Browser timers for the acquisition loop.

use std::future::Future;
use std::time::Duration;

use provenance_core::RetryTimer;

/// [`RetryTimer`] backed by `setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooTimer;

impl RetryTimer for GlooTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        gloo_timers::future::sleep(duration)
    }
}
