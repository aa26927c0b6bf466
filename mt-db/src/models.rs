//! Query result model structs for the dashboard charts.
//!
//! All structs derive `Serialize` so the rendering layer can receive
//! them as JSON.

use serde::Serialize;

/// A stored row of the working dataset.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DatasetRow {
    /// Position in load order.
    pub seq: i64,
    pub country: String,
    pub artist: String,
    pub track_name: String,
    pub track_url: String,
    /// "YYYY-MM-DD"
    pub date: String,
    /// "YYYY-MM"
    pub month_year: String,
    /// Time-bucket ordinal.
    pub bucket: usize,
    pub streams: u64,
    pub iso_alpha: Option<String>,
}

/// One point of the streams-over-time line chart.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimeSeriesPoint {
    /// First-seen calendar date of the bucket, "YYYY-MM-DD".
    pub date: String,
    pub month_year: String,
    pub streams: u64,
}

/// Streams over time, ascending by date.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TimeSeriesResult {
    pub points: Vec<TimeSeriesPoint>,
}

impl TimeSeriesResult {
    pub fn total(&self) -> u64 {
        self.points.iter().map(|p| p.streams).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Total streams of one map region.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GeoTotal {
    /// ISO 3166-1 alpha-3 code used as the map location.
    pub iso_alpha: String,
    /// Display name shown on hover and returned on click.
    pub country: String,
    pub streams: u64,
}

/// Per-region totals for the choropleth map, ordered by ISO code.
///
/// Countries without an ISO code never appear here.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct GeoResult {
    pub totals: Vec<GeoTotal>,
}

impl GeoResult {
    pub fn total(&self) -> u64 {
        self.totals.iter().map(|t| t.streams).sum()
    }

    pub fn get(&self, iso_alpha: &str) -> Option<&GeoTotal> {
        self.totals.iter().find(|t| t.iso_alpha == iso_alpha)
    }
}

/// What a ranked bar stands for.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RankedKind {
    /// Top artists of a country.
    Artists,
    /// Every track of one artist.
    Tracks,
}

/// One bar of the ranked chart.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RankedEntry {
    pub label: String,
    pub streams: u64,
}

/// Ranked totals, descending by streams. Ties keep ascending label order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RankedResult {
    pub kind: RankedKind,
    pub entries: Vec<RankedEntry>,
}

impl RankedResult {
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.streams).sum()
    }
}
