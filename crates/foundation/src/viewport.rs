use serde::{Deserialize, Serialize};

use crate::bounds::{BoundingBox, LonLat};

/// Visible map area as reported by the map surface after a pan or zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LonLat,
    pub zoom: f64,
    pub bounds: BoundingBox,
}

impl Viewport {
    pub fn new(center: LonLat, zoom: f64, bounds: BoundingBox) -> Self {
        Self {
            center,
            zoom,
            bounds,
        }
    }

    /// A viewport spanning `half_width` degrees either side of `center`.
    pub fn around(center: LonLat, zoom: f64, half_width: f64) -> Self {
        Self::new(
            center,
            zoom,
            BoundingBox::from_extents(
                center.lon - half_width,
                center.lat - half_width,
                center.lon + half_width,
                center.lat + half_width,
            ),
        )
    }
}
