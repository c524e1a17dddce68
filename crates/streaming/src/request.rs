use foundation::{LonLat, RegionKey};
use serde::{Deserialize, Serialize};

/// A request to load one sub-region boundary.
///
/// Priority and viewport distance are assigned by the queue on submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadJob {
    pub key: RegionKey,
    /// Representative point used for viewport proximity.
    pub point: LonLat,
}

impl LoadJob {
    pub fn new(key: RegionKey, point: LonLat) -> Self {
        Self { key, point }
    }
}
