//! Point-in-polygon tests.
//!
//! Only exterior rings are considered; interior rings (holes) do not exclude
//! points. A multipolygon contains a point if any exterior ring does.
//!
//! When filtering many candidates, run [`bounding_box_contains`] first and only
//! fall through to [`geometry_contains`] on a hit.

use crate::bounds::{BoundingBox, LonLat};
use crate::geometry::{Geometry, Position};

/// Cheap AABB pre-filter.
#[inline]
pub fn bounding_box_contains(point: LonLat, bbox: &BoundingBox) -> bool {
    bbox.contains(point)
}

/// Even-odd ray casting against a single ring.
///
/// Degenerate rings (fewer than three vertices) contain nothing. The ring may
/// be open or closed.
pub fn ring_contains(point: LonLat, ring: &[Position]) -> bool {
    if ring.len() < 3 || !point.is_finite() {
        return false;
    }

    let (x, y) = (point.lon, point.lat);
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        // The straddle check guarantees yj != yi in the division.
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn geometry_contains(point: LonLat, geometry: &Geometry) -> bool {
    geometry
        .exterior_rings()
        .any(|ring| ring_contains(point, ring))
}

/// Containment for an optional geometry; a missing geometry contains nothing.
pub fn contains(point: LonLat, geometry: Option<&Geometry>) -> bool {
    geometry.is_some_and(|g| geometry_contains(point, g))
}

#[cfg(test)]
mod tests {
    use super::{bounding_box_contains, contains, geometry_contains, ring_contains};
    use crate::bounds::LonLat;
    use crate::geometry::Geometry;

    fn concave() -> Vec<[f64; 2]> {
        // A "U" shape opening to the north.
        vec![
            [0.0, 0.0],
            [6.0, 0.0],
            [6.0, 6.0],
            [4.0, 6.0],
            [4.0, 2.0],
            [2.0, 2.0],
            [2.0, 6.0],
            [0.0, 6.0],
            [0.0, 0.0],
        ]
    }

    #[test]
    fn concave_ring() {
        let ring = concave();
        assert!(ring_contains(LonLat::new(1.0, 5.0), &ring));
        assert!(ring_contains(LonLat::new(5.0, 5.0), &ring));
        assert!(ring_contains(LonLat::new(3.0, 1.0), &ring));
        // Inside the notch.
        assert!(!ring_contains(LonLat::new(3.0, 4.0), &ring));
        assert!(!ring_contains(LonLat::new(-1.0, 1.0), &ring));
    }

    #[test]
    fn agrees_with_reference_implementation() {
        use geo::{Contains, LineString, Point, Polygon};

        let ring = concave();
        let reference = Polygon::new(
            LineString::from(ring.iter().map(|p| (p[0], p[1])).collect::<Vec<_>>()),
            vec![],
        );

        // Offsets keep samples off the integer-aligned edges.
        for i in 0..40 {
            for j in 0..40 {
                let x = -1.0 + i as f64 * 0.2 + 0.0137;
                let y = -1.0 + j as f64 * 0.2 + 0.0291;
                let ours = ring_contains(LonLat::new(x, y), &ring);
                let theirs = reference.contains(&Point::new(x, y));
                assert_eq!(ours, theirs, "disagreement at ({x}, {y})");
                // Stable under repetition.
                assert_eq!(ours, ring_contains(LonLat::new(x, y), &ring));
            }
        }
    }

    #[test]
    fn holes_are_ignored() {
        let g = Geometry::Polygon(vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
            vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]],
        ]);
        assert!(geometry_contains(LonLat::new(5.0, 5.0), &g));
    }

    #[test]
    fn multipolygon_is_logical_or() {
        let g = Geometry::MultiPolygon(vec![
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
            vec![vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0]]],
        ]);
        assert!(geometry_contains(LonLat::new(0.5, 0.5), &g));
        assert!(geometry_contains(LonLat::new(5.5, 5.5), &g));
        assert!(!geometry_contains(LonLat::new(3.0, 3.0), &g));
    }

    #[test]
    fn degenerate_inputs_are_outside() {
        assert!(!contains(LonLat::new(0.0, 0.0), None));
        assert!(!ring_contains(LonLat::new(0.0, 0.0), &[[0.0, 0.0], [1.0, 1.0]]));
        assert!(!geometry_contains(
            LonLat::new(0.0, 0.0),
            &Geometry::MultiPolygon(vec![])
        ));
        let square = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert!(!ring_contains(LonLat::new(f64::NAN, 0.5), &square));
    }

    #[test]
    fn bbox_prefilter_is_not_exact() {
        let g = Geometry::Polygon(vec![concave()]);
        let bbox = g.bounding_box().unwrap();
        let in_notch = LonLat::new(3.0, 4.0);
        assert!(bounding_box_contains(in_notch, &bbox));
        assert!(!geometry_contains(in_notch, &g));
    }
}
