use anyhow::Context;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use mt_utils::dates::{parse_date, parse_month_year};
use serde::{Deserialize, Serialize};
use std::io::Read;

pub const COUNTRY_COLUMN: &str = "Country";
pub const ARTIST_COLUMN: &str = "Artist";
pub const TRACK_NAME_COLUMN: &str = "Track Name";
pub const TRACK_URL_COLUMN: &str = "Track URL";
pub const DATE_COLUMN: &str = "Date";
pub const MONTH_YEAR_COLUMN: &str = "month_year";
pub const STREAMS_COLUMN: &str = "Streams";

/// Cell values treated as missing, in addition to an empty cell.
pub const MISSING_MARKERS: [&str; 6] = ["NaN", "nan", "NA", "N/A", "null", "NULL"];

/// One row of the monthly streaming chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub country: String,
    pub artist: String,
    pub track_name: String,
    /// Spotify track URL; only used to decide which rows have a trend.
    pub track_url: String,
    pub date: NaiveDate,
    /// Time-bucket token, "YYYY-MM"
    pub month_year: String,
    pub streams: u64,
}

/// Result of parsing a chart CSV: the complete rows plus a count of the
/// rows dropped for having a missing cell.
#[derive(Debug, Clone, Default)]
pub struct ParsedChart {
    pub records: Vec<StreamRecord>,
    pub incomplete: usize,
}

/// Column positions of the fields we read, resolved from the header row.
struct ChartColumns {
    country: usize,
    artist: usize,
    track_name: usize,
    track_url: usize,
    date: usize,
    month_year: usize,
    streams: usize,
}

impl ChartColumns {
    fn from_headers(headers: &StringRecord) -> anyhow::Result<Self> {
        let find = |name: &str| -> anyhow::Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .with_context(|| format!("chart CSV has no {:?} column", name))
        };
        Ok(Self {
            country: find(COUNTRY_COLUMN)?,
            artist: find(ARTIST_COLUMN)?,
            track_name: find(TRACK_NAME_COLUMN)?,
            track_url: find(TRACK_URL_COLUMN)?,
            date: find(DATE_COLUMN)?,
            month_year: find(MONTH_YEAR_COLUMN)?,
            streams: find(STREAMS_COLUMN)?,
        })
    }
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}

/// Parse a stream count. Whole-number floats ("1234.0") are accepted since
/// spreadsheet exports often write counts that way.
pub fn parse_streams(s: &str) -> anyhow::Result<u64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<u64>() {
        return Ok(v);
    }
    let v: f64 = s
        .parse()
        .with_context(|| format!("stream count {:?} is not a number", s))?;
    // u64::MAX as f64 rounds up to 2^64, which no u64 can hold
    if v.is_finite() && v >= 0.0 && v < u64::MAX as f64 && v.fract() == 0.0 {
        Ok(v as u64)
    } else {
        anyhow::bail!("stream count {:?} is not a non-negative integer", s)
    }
}

impl StreamRecord {
    /// Identity used by the trend filter: a (track, country) pair.
    pub fn trend_key(&self) -> (&str, &str) {
        (&self.track_url, &self.country)
    }

    /// Parse the monthly chart CSV (with headers).
    ///
    /// Any row with a missing cell in any column, including columns we
    /// don't otherwise read, is dropped and counted. A malformed date,
    /// month-year token or stream count fails the whole parse.
    pub fn parse_chart_csv<R: Read>(reader: R) -> anyhow::Result<ParsedChart> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let columns = ChartColumns::from_headers(&headers)?;

        let mut parsed = ParsedChart::default();
        for (line, row) in rdr.records().enumerate() {
            let record = row?;
            if record.len() != headers.len() || record.iter().any(is_missing) {
                parsed.incomplete += 1;
                continue;
            }
            let field = |i: usize| record.get(i).unwrap_or("").trim();

            let date = parse_date(field(columns.date))
                .with_context(|| format!("bad {} on data row {}", DATE_COLUMN, line + 1))?;
            let month_year = field(columns.month_year).to_string();
            parse_month_year(&month_year)
                .with_context(|| format!("bad {} on data row {}", MONTH_YEAR_COLUMN, line + 1))?;
            let streams = parse_streams(field(columns.streams))
                .with_context(|| format!("bad {} on data row {}", STREAMS_COLUMN, line + 1))?;

            parsed.records.push(StreamRecord {
                country: field(columns.country).to_string(),
                artist: field(columns.artist).to_string(),
                track_name: field(columns.track_name).to_string(),
                track_url: field(columns.track_url).to_string(),
                date,
                month_year,
                streams,
            });
        }
        log::info!(
            "[MT Debug] parse: {} chart rows, {} incomplete",
            parsed.records.len(),
            parsed.incomplete
        );
        Ok(parsed)
    }
}
