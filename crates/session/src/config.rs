use std::time::Duration;

use foundation::BoundingBox;
use scene::TrackerConfig;
use serde::{Deserialize, Serialize};
use streaming::LoadConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub load: LoadConfig,
    pub tracker: TrackerConfig,
    /// Pause after the zoom-out leg of a region switch.
    pub settle_after_zoom_out_ms: u64,
    /// Pause after zooming into a region, before its children are loaded.
    pub settle_after_zoom_in_ms: u64,
    /// Zoom-out target when neither lead data nor region geometry is loaded.
    pub default_view: BoundingBox,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            load: LoadConfig::default(),
            tracker: TrackerConfig::default(),
            settle_after_zoom_out_ms: 800,
            settle_after_zoom_in_ms: 800,
            // Continental US.
            default_view: BoundingBox::from_extents(-125.0, 24.0, -66.0, 50.0),
        }
    }
}

impl SessionConfig {
    pub fn settle_after_zoom_out(&self) -> Duration {
        Duration::from_millis(self.settle_after_zoom_out_ms)
    }

    pub fn settle_after_zoom_in(&self) -> Duration {
        Duration::from_millis(self.settle_after_zoom_in_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::SessionConfig;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: SessionConfig = serde_json::from_str(
            r#"{ "tracker": { "enter_zoom": 9.0 }, "settle_after_zoom_in_ms": 0 }"#,
        )
        .unwrap();
        assert_eq!(cfg.tracker.enter_zoom, 9.0);
        assert_eq!(cfg.tracker.exit_zoom, 6.0);
        assert_eq!(cfg.settle_after_zoom_in_ms, 0);
        assert_eq!(cfg.settle_after_zoom_out_ms, 800);
        assert_eq!(cfg.load.high.concurrency, 3);
    }
}
