//! Capture tunables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::acquire::RetryPolicy;
use crate::clipboard::CLIPBOARD_STORAGE_KEY;
use crate::fragments::DEFAULT_Y_TOLERANCE;
use crate::locator::LocatorThresholds;

/// Timing, size and storage settings shared by every strategy.
///
/// Deserializes from a partial JS object; absent fields keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureConfig {
    /// Editor search attempts before giving up.
    pub max_attempts: u32,
    pub retry_interval_ms: u64,
    /// Quiet period before a reconciliation pass runs.
    pub debounce_ms: u64,
    /// Delay before the forced initial snapshot (canvas family).
    pub initial_settle_ms: u64,
    /// Delay before indicators are applied (generic family).
    pub indicator_delay_ms: u64,
    /// Longest clipboard text persisted, in UTF-16 units.
    pub clipboard_text_limit: usize,
    pub storage_key: String,
    pub min_editor_width: f64,
    pub min_editor_height: f64,
    pub large_editor_width: f64,
    pub large_editor_height: f64,
    pub min_visible_width: f64,
    pub min_visible_height: f64,
    /// Reading-order line tolerance for canvas fragments.
    pub y_tolerance: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            retry_interval_ms: 500,
            debounce_ms: 150,
            initial_settle_ms: 1000,
            indicator_delay_ms: 500,
            clipboard_text_limit: 2000,
            storage_key: CLIPBOARD_STORAGE_KEY.to_string(),
            min_editor_width: 200.0,
            min_editor_height: 100.0,
            large_editor_width: 400.0,
            large_editor_height: 300.0,
            min_visible_width: 50.0,
            min_visible_height: 30.0,
            y_tolerance: DEFAULT_Y_TOLERANCE,
        }
    }
}

impl CaptureConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            interval: Duration::from_millis(self.retry_interval_ms),
        }
    }

    pub fn thresholds(&self) -> LocatorThresholds {
        LocatorThresholds {
            min_width: self.min_editor_width,
            min_height: self.min_editor_height,
            large_width: self.large_editor_width,
            large_height: self.large_editor_height,
            visible_width: self.min_visible_width,
            visible_height: self.min_visible_height,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    pub fn indicator_delay(&self) -> Duration {
        Duration::from_millis(self.indicator_delay_ms)
    }
}
