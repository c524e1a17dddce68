//! Polygon geometry in GeoJSON layout.
//!
//! Coordinates are `[lon, lat]` pairs. A polygon is a list of rings where the
//! first ring is the exterior; any following rings are interior rings.
//! Positions with an altitude or other trailing members are read as their
//! first two numbers.

use std::fmt;

use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::bounds::{BoundingBox, LonLat};

pub type Position = [f64; 2];
pub type Ring = Vec<Position>;

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("unsupported geometry type `{0}`")]
    Unsupported(String),
    #[error("invalid geometry: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Areal geometry, serialized exactly like a GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(#[serde(deserialize_with = "polygon_coords")] Vec<Ring>),
    MultiPolygon(#[serde(deserialize_with = "multi_polygon_coords")] Vec<Vec<Ring>>),
}

/// A GeoJSON position: `[lon, lat, ...]`.
struct PlanarPosition(Position);

impl<'de> Deserialize<'de> for PlanarPosition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PositionVisitor;

        impl<'de> Visitor<'de> for PositionVisitor {
            type Value = PlanarPosition;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a position of at least two numbers")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let lon: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let lat: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(PlanarPosition([lon, lat]))
            }
        }

        deserializer.deserialize_seq(PositionVisitor)
    }
}

fn planar_rings(rings: Vec<Vec<PlanarPosition>>) -> Vec<Ring> {
    rings
        .into_iter()
        .map(|ring| ring.into_iter().map(|p| p.0).collect())
        .collect()
}

fn polygon_coords<'de, D>(deserializer: D) -> Result<Vec<Ring>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Vec<PlanarPosition>>::deserialize(deserializer).map(planar_rings)
}

fn multi_polygon_coords<'de, D>(deserializer: D) -> Result<Vec<Vec<Ring>>, D::Error>
where
    D: Deserializer<'de>,
{
    let polys = Vec::<Vec<Vec<PlanarPosition>>>::deserialize(deserializer)?;
    Ok(polys.into_iter().map(planar_rings).collect())
}

impl Geometry {
    /// Decode a GeoJSON geometry value.
    ///
    /// Non-areal types (`Point`, `LineString`, ...) are rejected with
    /// [`GeometryError::Unsupported`].
    pub fn from_geojson(value: &serde_json::Value) -> Result<Self, GeometryError> {
        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or_default();
        match kind {
            "Polygon" | "MultiPolygon" => Ok(serde_json::from_value(value.clone())?),
            other => Err(GeometryError::Unsupported(other.to_string())),
        }
    }

    /// Exterior rings of every constituent polygon.
    pub fn exterior_rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        let rings: Box<dyn Iterator<Item = &Ring> + '_> = match self {
            Geometry::Polygon(rings) => Box::new(rings.first().into_iter()),
            Geometry::MultiPolygon(polys) => Box::new(polys.iter().filter_map(|p| p.first())),
        };
        rings
    }

    pub fn positions(&self) -> impl Iterator<Item = LonLat> + '_ {
        let rings: Box<dyn Iterator<Item = &Ring> + '_> = match self {
            Geometry::Polygon(rings) => Box::new(rings.iter()),
            Geometry::MultiPolygon(polys) => Box::new(polys.iter().flatten()),
        };
        rings.flatten().map(|p| LonLat::from(*p))
    }

    /// `None` for a geometry with no finite coordinates.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.positions())
    }

    pub fn is_empty(&self) -> bool {
        self.exterior_rings().all(|r| r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, GeometryError};
    use crate::bounds::BoundingBox;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_geojson_polygon() {
        let v = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
        });
        let g = Geometry::from_geojson(&v).unwrap();
        assert_eq!(
            g.bounding_box(),
            Some(BoundingBox::from_extents(0.0, 0.0, 4.0, 2.0))
        );
        assert_eq!(serde_json::to_value(&g).unwrap(), v);
    }

    #[test]
    fn altitude_is_dropped() {
        let v = json!({
            "type": "MultiPolygon",
            "coordinates": [[[[0, 0, 12.5], [2, 0, 12.5], [2, 2, 3], [0, 2, 0, 7], [0, 0, 12.5]]]]
        });
        let g = Geometry::from_geojson(&v).unwrap();
        assert_eq!(
            g,
            Geometry::MultiPolygon(vec![vec![vec![
                [0.0, 0.0],
                [2.0, 0.0],
                [2.0, 2.0],
                [0.0, 2.0],
                [0.0, 0.0]
            ]]])
        );
    }

    #[test]
    fn short_position_is_invalid() {
        let v = json!({ "type": "Polygon", "coordinates": [[[0.0], [1.0, 1.0], [1.0, 0.0]]] });
        assert!(matches!(
            Geometry::from_geojson(&v),
            Err(GeometryError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_points() {
        let v = json!({ "type": "Point", "coordinates": [1.0, 2.0] });
        assert!(matches!(
            Geometry::from_geojson(&v),
            Err(GeometryError::Unsupported(t)) if t == "Point"
        ));
    }

    #[test]
    fn multipolygon_exterior_rings_skip_holes() {
        let g = Geometry::MultiPolygon(vec![
            vec![
                vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
                vec![[0.2, 0.2], [0.3, 0.2], [0.3, 0.3]],
            ],
            vec![vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0]]],
        ]);
        assert_eq!(g.exterior_rings().count(), 2);
        assert_eq!(g.positions().count(), 9);
    }

    #[test]
    fn empty_polygon_has_no_bbox() {
        let g = Geometry::Polygon(vec![]);
        assert!(g.is_empty());
        assert_eq!(g.bounding_box(), None);
    }
}
