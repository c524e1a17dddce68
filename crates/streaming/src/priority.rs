use std::time::Duration;

use foundation::{LonLat, Viewport};
use serde::{Deserialize, Serialize};

/// Load priority of a queued boundary. Declared best-first so the derived
/// `Ord` sorts `High` before `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityClass {
    High,
    Medium,
    Low,
}

/// Concurrency and pacing for one priority class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPolicy {
    /// Fetches issued together and awaited as one batch.
    pub concurrency: usize,
    /// Pause after a batch before the next one starts.
    pub delay_ms: u64,
}

impl BatchPolicy {
    pub const fn new(concurrency: usize, delay_ms: u64) -> Self {
        Self {
            concurrency,
            delay_ms,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Tunables for the boundary load queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Degrees added to each side of the viewport before the proximity test.
    pub viewport_padding_deg: f64,
    /// Jobs closer than this to the viewport center (and inside the padded
    /// viewport) are high priority.
    pub high_priority_distance: f64,
    pub high: BatchPolicy,
    pub medium: BatchPolicy,
    pub low: BatchPolicy,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            viewport_padding_deg: 0.5,
            high_priority_distance: 1.0,
            high: BatchPolicy::new(3, 100),
            medium: BatchPolicy::new(2, 200),
            low: BatchPolicy::new(1, 500),
        }
    }
}

impl LoadConfig {
    pub fn policy(&self, class: PriorityClass) -> BatchPolicy {
        match class {
            PriorityClass::High => self.high,
            PriorityClass::Medium => self.medium,
            PriorityClass::Low => self.low,
        }
    }

    /// Priority class and viewport-center distance for a job at `point`.
    ///
    /// Without a viewport every job is medium priority with no distance.
    pub fn classify(
        &self,
        point: LonLat,
        viewport: Option<&Viewport>,
    ) -> (PriorityClass, Option<f64>) {
        let Some(viewport) = viewport else {
            return (PriorityClass::Medium, None);
        };

        let distance = point.distance_to(viewport.center);
        let padded = viewport.bounds.expanded(self.viewport_padding_deg);
        let class = if !padded.contains(point) {
            PriorityClass::Low
        } else if distance < self.high_priority_distance {
            PriorityClass::High
        } else {
            PriorityClass::Medium
        };
        (class, Some(distance))
    }
}
