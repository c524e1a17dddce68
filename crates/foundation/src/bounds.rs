use serde::{Deserialize, Serialize};

/// A longitude/latitude pair in degrees (WGS84).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Planar distance in degrees.
    ///
    /// Not a geodesic distance; priority thresholds are expressed in the same
    /// units as the stored coordinates.
    pub fn distance_to(self, other: LonLat) -> f64 {
        let dlon = self.lon - other.lon;
        let dlat = self.lat - other.lat;
        (dlon * dlon + dlat * dlat).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

/// Axis-aligned lon/lat bounding box.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub southwest: LonLat,
    pub northeast: LonLat,
}

impl BoundingBox {
    pub const fn new(southwest: LonLat, northeast: LonLat) -> Self {
        Self {
            southwest,
            northeast,
        }
    }

    pub fn from_extents(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self::new(LonLat::new(west, south), LonLat::new(east, north))
    }

    /// Smallest box covering every finite point. `None` if there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LonLat>,
    {
        let mut acc: Option<Self> = None;
        for p in points.into_iter().filter(|p| p.is_finite()) {
            acc = Some(match acc {
                None => Self::new(p, p),
                Some(b) => b.extended(p),
            });
        }
        acc
    }

    pub fn west(&self) -> f64 {
        self.southwest.lon
    }

    pub fn south(&self) -> f64 {
        self.southwest.lat
    }

    pub fn east(&self) -> f64 {
        self.northeast.lon
    }

    pub fn north(&self) -> f64 {
        self.northeast.lat
    }

    /// Midpoint of the min/max extents (not an area centroid).
    pub fn center(&self) -> LonLat {
        LonLat::new(
            (self.west() + self.east()) / 2.0,
            (self.south() + self.north()) / 2.0,
        )
    }

    /// Inclusive AABB test.
    pub fn contains(&self, point: LonLat) -> bool {
        point.lon >= self.west()
            && point.lon <= self.east()
            && point.lat >= self.south()
            && point.lat <= self.north()
    }

    /// Grow the box by `padding` degrees on every side.
    pub fn expanded(&self, padding: f64) -> Self {
        Self::from_extents(
            self.west() - padding,
            self.south() - padding,
            self.east() + padding,
            self.north() + padding,
        )
    }

    pub fn extended(&self, p: LonLat) -> Self {
        Self::from_extents(
            self.west().min(p.lon),
            self.south().min(p.lat),
            self.east().max(p.lon),
            self.north().max(p.lat),
        )
    }

    pub fn union(&self, other: &BoundingBox) -> Self {
        self.extended(other.southwest).extended(other.northeast)
    }
}
