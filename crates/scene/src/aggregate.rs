//! Grouping of per-postal-code lead records into sub-region entries.

use std::collections::{BTreeMap, HashMap};

use foundation::{BoundingBox, LonLat, RegionKey};
use serde::{Deserialize, Serialize};
use streaming::{LeadRecord, LoadJob};
use tracing::debug;

/// Summed and derived lead metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub requests: u64,
    pub conversions: u64,
    pub connected_calls: u64,
    pub bid_min: f64,
    pub bid_max: f64,
    /// Unweighted mean of the inputs' average bids.
    pub bid_avg: f64,
}

/// Folds several stat rows into one [`LeadStats`].
///
/// Counts are summed and average bids are averaged without weighting. Only
/// rows that saw traffic contribute to the min/max bid.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    rows: usize,
    requests: u64,
    conversions: u64,
    connected_calls: u64,
    bid_range: Option<(f64, f64)>,
    bid_avg_sum: f64,
}

impl StatsAccumulator {
    pub fn push(&mut self, row: &LeadStats) {
        self.rows += 1;
        self.requests += row.requests;
        self.conversions += row.conversions;
        self.connected_calls += row.connected_calls;
        self.bid_avg_sum += row.bid_avg;
        if row.requests > 0 {
            self.bid_range = Some(match self.bid_range {
                None => (row.bid_min, row.bid_max),
                Some((lo, hi)) => (lo.min(row.bid_min), hi.max(row.bid_max)),
            });
        }
    }

    /// `None` when nothing was pushed.
    pub fn finish(self) -> Option<LeadStats> {
        if self.rows == 0 {
            return None;
        }
        let (bid_min, bid_max) = self.bid_range.unwrap_or((0.0, 0.0));
        Some(LeadStats {
            requests: self.requests,
            conversions: self.conversions,
            connected_calls: self.connected_calls,
            bid_min,
            bid_max,
            bid_avg: self.bid_avg_sum / self.rows as f64,
        })
    }
}

impl From<&LeadRecord> for LeadStats {
    fn from(r: &LeadRecord) -> Self {
        Self {
            requests: r.requests,
            conversions: r.conversions,
            connected_calls: r.connected_calls,
            bid_min: r.bid_min,
            bid_max: r.bid_max,
            bid_avg: r.bid_avg,
        }
    }
}

/// Where a postal code sits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalPlace {
    pub postal_code: String,
    pub lon: f64,
    pub lat: f64,
    pub sub_region: String,
    pub parent_area: String,
}

impl PostalPlace {
    pub fn point(&self) -> LonLat {
        LonLat::new(self.lon, self.lat)
    }

    pub fn key(&self) -> RegionKey {
        RegionKey::new(&self.sub_region, &self.parent_area)
    }
}

/// Postal code lookup table.
#[derive(Debug, Clone, Default)]
pub struct PostalDirectory {
    places: HashMap<String, PostalPlace>,
}

impl PostalDirectory {
    pub fn new<I>(places: I) -> Self
    where
        I: IntoIterator<Item = PostalPlace>,
    {
        Self {
            places: places
                .into_iter()
                .map(|p| (p.postal_code.clone(), p))
                .collect(),
        }
    }

    /// Reads a JSON list of [`PostalPlace`] rows.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let rows: Vec<PostalPlace> = serde_json::from_str(text)?;
        Ok(Self::new(rows))
    }

    pub fn get(&self, postal_code: &str) -> Option<&PostalPlace> {
        self.places.get(postal_code)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// A sub-region (e.g. a county) derived from the current lead data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubRegionEntry {
    pub key: RegionKey,
    /// Midpoint of the bounding box of the constituent postal points.
    pub coordinates: LonLat,
    pub stats: LeadStats,
    pub postal_codes: Vec<String>,
}

impl SubRegionEntry {
    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn parent_area(&self) -> &str {
        &self.key.parent_area
    }

    pub fn load_job(&self) -> LoadJob {
        LoadJob::new(self.key.clone(), self.coordinates)
    }
}

/// A postal code's record placed at its point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLead {
    pub record: LeadRecord,
    pub point: LonLat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouping {
    /// Sorted by key.
    pub sub_regions: Vec<SubRegionEntry>,
    pub placed: Vec<PlacedLead>,
    /// Postal codes missing from the directory.
    pub unplaced: Vec<String>,
}

impl Grouping {
    /// Bounding box of every placed postal point.
    pub fn extent(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.placed.iter().map(|p| p.point))
    }
}

#[derive(Default)]
struct Bucket {
    stats: StatsAccumulator,
    points: Vec<LonLat>,
    postal_codes: Vec<String>,
}

pub fn group_by_sub_region(records: &[LeadRecord], directory: &PostalDirectory) -> Grouping {
    let mut buckets: BTreeMap<RegionKey, Bucket> = BTreeMap::new();
    let mut placed = Vec::with_capacity(records.len());
    let mut unplaced = Vec::new();

    for record in records {
        let Some(place) = directory.get(&record.postal_code) else {
            unplaced.push(record.postal_code.clone());
            continue;
        };
        let bucket = buckets.entry(place.key()).or_default();
        bucket.stats.push(&LeadStats::from(record));
        bucket.points.push(place.point());
        bucket.postal_codes.push(record.postal_code.clone());
        placed.push(PlacedLead {
            record: record.clone(),
            point: place.point(),
        });
    }

    if !unplaced.is_empty() {
        debug!("{} lead records have unknown postal codes", unplaced.len());
    }

    let sub_regions = buckets
        .into_iter()
        .filter_map(|(key, bucket)| {
            let coordinates = BoundingBox::from_points(bucket.points.iter().copied())?.center();
            Some(SubRegionEntry {
                key,
                coordinates,
                stats: bucket.stats.finish()?,
                postal_codes: bucket.postal_codes,
            })
        })
        .collect();

    Grouping {
        sub_regions,
        placed,
        unplaced,
    }
}
