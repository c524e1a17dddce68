//! Static top-level regions (media markets) and their containment queries.

use foundation::{BoundingBox, Geometry, LonLat, RegionId, bounding_box_contains, contains};
use serde_json::Value;
use tracing::warn;

use crate::aggregate::SubRegionEntry;

#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("topology is not a GeoJSON FeatureCollection")]
    NotFeatureCollection,
    #[error("feature {0} has no id")]
    MissingId(usize),
    #[error("invalid topology json: {0}")]
    Json(#[from] serde_json::Error),
}

/// An immutable top-level region.
///
/// The bounding box and centroid are derived from the geometry once, on
/// construction, and the geometry cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: RegionId,
    name: String,
    geometry: Option<Geometry>,
    bbox: Option<BoundingBox>,
    centroid: Option<LonLat>,
}

impl Region {
    pub fn new(id: RegionId, name: impl Into<String>, geometry: Option<Geometry>) -> Self {
        let bbox = geometry.as_ref().and_then(Geometry::bounding_box);
        Self {
            id,
            name: name.into(),
            geometry,
            bbox,
            centroid: bbox.map(|b| b.center()),
        }
    }

    pub fn id(&self) -> &RegionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bbox
    }

    /// Midpoint of the bounding box, not an area centroid.
    pub fn centroid(&self) -> Option<LonLat> {
        self.centroid
    }

    /// Bounding-box pre-filter followed by the exact test.
    pub fn contains(&self, point: LonLat) -> bool {
        match &self.bbox {
            Some(bbox) if bounding_box_contains(point, bbox) => {
                contains(point, self.geometry.as_ref())
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionHierarchy {
    regions: Vec<Region>,
}

impl RegionHierarchy {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// Reads a GeoJSON FeatureCollection with `properties.id` and
    /// `properties.name` on each feature.
    ///
    /// Features whose geometry is missing or not areal are kept without
    /// geometry; they never contain a point.
    pub fn from_geojson(text: &str) -> Result<Self, TopologyError> {
        let root: Value = serde_json::from_str(text)?;
        let features = root
            .get("features")
            .and_then(Value::as_array)
            .ok_or(TopologyError::NotFeatureCollection)?;

        let mut regions = Vec::with_capacity(features.len());
        for (idx, feature) in features.iter().enumerate() {
            let props = feature.get("properties");
            let id = props
                .and_then(|p| p.get("id"))
                .or_else(|| feature.get("id"))
                .and_then(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .ok_or(TopologyError::MissingId(idx))?;
            let name = props
                .and_then(|p| p.get("name"))
                .and_then(Value::as_str)
                .unwrap_or(&id)
                .to_string();

            let geometry = match feature.get("geometry") {
                None | Some(Value::Null) => None,
                Some(g) => match Geometry::from_geojson(g) {
                    Ok(g) => Some(g),
                    Err(err) => {
                        warn!("region {id}: {err}; kept without geometry");
                        None
                    }
                },
            };
            regions.push(Region::new(RegionId::new(id), name, geometry));
        }
        Ok(Self::new(regions))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter()
    }

    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id() == id)
    }

    /// First region, in topology order, whose geometry contains `point`.
    pub fn find_containing(&self, point: LonLat) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(point))
    }

    /// Sub-regions whose representative point lies inside `region`.
    pub fn children_of<'a>(
        &self,
        region: &Region,
        sub_regions: &'a [SubRegionEntry],
    ) -> Vec<&'a SubRegionEntry> {
        sub_regions
            .iter()
            .filter(|s| region.contains(s.coordinates))
            .collect()
    }

    /// Union of every region's bounding box.
    pub fn extent(&self) -> Option<BoundingBox> {
        self.regions
            .iter()
            .filter_map(Region::bounding_box)
            .reduce(|a, b| a.union(&b))
    }
}
