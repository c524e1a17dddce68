use foundation::{BoundingBox, LonLat, RegionId};
use scene::{NavigationState, PlacedLead, SubRegionEntry};
use serde::Serialize;
use streaming::{BoundaryRecord, LoadProgress};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRegion {
    pub id: RegionId,
    pub name: String,
    pub bounds: Option<BoundingBox>,
    pub centroid: Option<LonLat>,
}

/// A visible sub-region with its interaction flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubRegionView {
    pub entry: SubRegionEntry,
    pub selected: bool,
    pub hovered: bool,
    /// `false` until the boundary loads, and for good on a geocoding miss.
    pub has_boundary: bool,
}

/// Everything the map layer draws for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    pub navigation: NavigationState,
    pub active_region: Option<ActiveRegion>,
    pub sub_regions: Vec<SubRegionView>,
    /// Loaded boundaries of the visible sub-regions.
    pub boundaries: Vec<BoundaryRecord>,
    /// Postal-code markers of the visible sub-regions.
    pub markers: Vec<PlacedLead>,
    pub progress: LoadProgress,
    pub error: Option<String>,
}
