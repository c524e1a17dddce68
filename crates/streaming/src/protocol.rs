//! Wire types for the two upstream services.
//!
//! - Lead metrics: a list of per-postal-code records for one campaign.
//! - Boundary geocoding: a Nominatim-style search returning at most one
//!   best-match place with its polygon.

use foundation::{BoundingBox, Geometry, LonLat, RegionKey};
use serde::{Deserialize, Serialize};

/// Time window accepted by the lead metrics endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl TimeWindow {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
        }
    }
}

/// Filter parameters for a lead metrics read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadQuery {
    /// Industry/campaign identifier (required upstream).
    pub campaign: String,
    #[serde(default)]
    pub window: TimeWindow,
    /// Restrict to these postal codes; empty means no restriction.
    #[serde(default)]
    pub postal_codes: Vec<String>,
}

impl LeadQuery {
    pub fn new(campaign: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
            window: TimeWindow::default(),
            postal_codes: Vec::new(),
        }
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_postal_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.postal_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("campaign", self.campaign.clone()),
            ("window", self.window.as_param().to_string()),
        ];
        if !self.postal_codes.is_empty() {
            pairs.push(("zips", self.postal_codes.join(",")));
        }
        pairs
    }
}

/// One postal code's lead metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub postal_code: String,
    #[serde(default)]
    pub requests: u64,
    #[serde(default)]
    pub conversions: u64,
    #[serde(default)]
    pub connected_calls: u64,
    #[serde(default)]
    pub bid_min: f64,
    #[serde(default)]
    pub bid_max: f64,
    #[serde(default)]
    pub bid_avg: f64,
    #[serde(default)]
    pub campaign: String,
}

/// Where a boundary came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryProvenance {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A resolved sub-region boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRecord {
    pub key: RegionKey,
    pub geometry: Geometry,
    pub bbox: BoundingBox,
    pub center: LonLat,
    pub provenance: BoundaryProvenance,
}

/// A single search hit as returned by the geocoder.
///
/// Coordinates come back as strings; `boundingbox` is `[south, north, west, east]`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeHit {
    #[serde(default)]
    pub place_id: Option<serde_json::Value>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lon: Option<String>,
    #[serde(default)]
    pub boundingbox: Vec<String>,
    #[serde(default)]
    pub geojson: Option<serde_json::Value>,
}

impl GeocodeHit {
    /// Converts the hit into a boundary.
    ///
    /// Returns `None` when the hit carries no areal geometry, which callers
    /// treat as a geocoding miss.
    pub fn into_boundary(self, key: RegionKey, provider: &str) -> Option<BoundaryRecord> {
        let geometry = Geometry::from_geojson(self.geojson.as_ref()?).ok()?;
        let bbox = parse_bbox(&self.boundingbox).or_else(|| geometry.bounding_box())?;
        let center = match (parse_f64(self.lon.as_deref()), parse_f64(self.lat.as_deref())) {
            (Some(lon), Some(lat)) => LonLat::new(lon, lat),
            _ => bbox.center(),
        };
        let place_id = self.place_id.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });

        Some(BoundaryRecord {
            key,
            geometry,
            bbox,
            center,
            provenance: BoundaryProvenance {
                provider: provider.to_string(),
                place_id,
                display_name: self.display_name,
            },
        })
    }
}

fn parse_f64(s: Option<&str>) -> Option<f64> {
    s?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_bbox(parts: &[String]) -> Option<BoundingBox> {
    let [south, north, west, east] = parts else {
        return None;
    };
    Some(BoundingBox::from_extents(
        parse_f64(Some(west.as_str()))?,
        parse_f64(Some(south.as_str()))?,
        parse_f64(Some(east.as_str()))?,
        parse_f64(Some(north.as_str()))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::geometry_contains;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn lead_query_pairs() {
        let q = LeadQuery::new("solar").with_postal_codes(["78701", "78702"]);
        assert_eq!(
            q.query_pairs(),
            vec![
                ("campaign", "solar".to_string()),
                ("window", "7d".to_string()),
                ("zips", "78701,78702".to_string()),
            ]
        );

        let q = LeadQuery::new("solar").with_window(TimeWindow::Last30Days);
        assert_eq!(q.query_pairs().len(), 2);
        assert_eq!(q.query_pairs()[1].1, "30d");
    }

    #[test]
    fn lead_record_defaults_missing_metrics() {
        let r: LeadRecord = serde_json::from_value(json!({
            "postalCode": "78701",
            "requests": 12,
            "bidAvg": 4.5
        }))
        .unwrap();
        assert_eq!(r.postal_code, "78701");
        assert_eq!(r.requests, 12);
        assert_eq!(r.conversions, 0);
        assert_eq!(r.bid_avg, 4.5);
    }

    #[test]
    fn geocode_hit_to_boundary() {
        let hit: GeocodeHit = serde_json::from_value(json!({
            "place_id": 1234,
            "display_name": "Travis County, Texas",
            "lat": "30.3",
            "lon": "-97.7",
            "boundingbox": ["30.0", "30.6", "-98.2", "-97.3"],
            "geojson": {
                "type": "Polygon",
                "coordinates": [[
                    [-98.2, 30.0],
                    [-97.3, 30.0],
                    [-97.3, 30.6],
                    [-98.2, 30.6],
                    [-98.2, 30.0]
                ]]
            }
        }))
        .unwrap();
        let rec = hit
            .into_boundary(RegionKey::new("Travis", "TX"), "nominatim")
            .unwrap();
        assert_eq!(rec.bbox, BoundingBox::from_extents(-98.2, 30.0, -97.3, 30.6));
        assert_eq!(rec.center, LonLat::new(-97.7, 30.3));
        assert_eq!(rec.provenance.place_id.as_deref(), Some("1234"));
    }

    #[test]
    fn hit_with_elevation_converts() {
        let hit: GeocodeHit = serde_json::from_value(json!({
            "place_id": 77,
            "lat": "1.0",
            "lon": "1.0",
            "geojson": {
                "type": "Polygon",
                "coordinates": [[
                    [0.0, 0.0, 140.0],
                    [2.0, 0.0, 152.5],
                    [2.0, 2.0, 149.0],
                    [0.0, 2.0, 143.0],
                    [0.0, 0.0, 140.0]
                ]]
            }
        }))
        .unwrap();
        let rec = hit
            .into_boundary(RegionKey::new("Hays", "TX"), "nominatim")
            .unwrap();
        assert_eq!(rec.bbox, BoundingBox::from_extents(0.0, 0.0, 2.0, 2.0));
        assert_eq!(rec.provenance.place_id.as_deref(), Some("77"));
        assert!(geometry_contains(LonLat::new(1.0, 1.0), &rec.geometry));
    }

    #[test]
    fn point_hit_is_a_miss() {
        let hit: GeocodeHit = serde_json::from_value(json!({
            "lat": "30.3",
            "lon": "-97.7",
            "geojson": { "type": "Point", "coordinates": [-97.7, 30.3] }
        }))
        .unwrap();
        assert!(hit.into_boundary(RegionKey::new("x", "y"), "p").is_none());
    }

    #[test]
    fn missing_bbox_falls_back_to_geometry() {
        let hit: GeocodeHit = serde_json::from_value(json!({
            "geojson": {
                "type": "MultiPolygon",
                "coordinates": [[[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 0.0]]]]
            }
        }))
        .unwrap();
        let rec = hit.into_boundary(RegionKey::new("x", "y"), "p").unwrap();
        assert_eq!(rec.bbox, BoundingBox::from_extents(0.0, 0.0, 2.0, 2.0));
        assert_eq!(rec.center, LonLat::new(1.0, 1.0));
    }
}
