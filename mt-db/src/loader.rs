//! Dataset loading: parse, clean and store the monthly chart rows.
//!
//! # Cleaning rules
//!
//! Applied in this order, each one a hard rule:
//!
//! 1. Rows with a missing cell in any column are dropped.
//! 2. Only rows whose (track URL, country) pair occurs more than once are
//!    kept; a single-row pair has no trend to chart.
//! 3. Rows of the source's own world chart (country `Global`) are dropped.
//!    The Global selection aggregates every country instead.
//! 4. Each row's country is joined against the country-code table. Rows
//!    with no match keep a NULL code: they stay in the line and bar charts
//!    but never reach the map.
//! 5. The distinct month-year tokens are sorted and numbered.

use crate::schema::create_schema;
use crate::Dataset;
use anyhow::Context;
use mt_charts::country_code::CountryCode;
use mt_charts::stream_record::{ParsedChart, StreamRecord};
use mt_charts::time_bucket::TimeBuckets;
use mt_charts::GLOBAL_COUNTRY;
use mt_utils::dates::format_date;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::rc::Rc;

/// Row counts recorded by the loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Data rows in the chart source.
    pub rows_read: usize,
    /// Rows dropped for a missing cell.
    pub incomplete: usize,
    /// Rows dropped because their (track, country) pair occurs once.
    pub single_bucket: usize,
    /// Rows of the source's world chart.
    pub world_chart: usize,
    /// Kept rows whose country has no ISO code.
    pub unmatched_iso: usize,
    /// Rows in the working dataset.
    pub kept: usize,
}

impl Dataset {
    /// Load a dataset from the chart CSV and the country-code CSV.
    ///
    /// Fails if either source cannot be read or parsed; a partial dataset
    /// is never returned.
    pub fn load<C: Read, K: Read>(chart: C, codes: K) -> anyhow::Result<Self> {
        let parsed =
            StreamRecord::parse_chart_csv(chart).context("failed to load the chart source")?;
        let codes = CountryCode::parse_country_code_csv(codes)
            .context("failed to load the country-code source")?;
        Self::from_parsed(parsed, &codes)
    }

    /// Load a dataset from CSV strings (typically fixtures or `include_str!`).
    pub fn from_csv(chart: &str, codes: &str) -> anyhow::Result<Self> {
        Self::load(chart.as_bytes(), codes.as_bytes())
    }

    /// Build a dataset from already-parsed chart rows and country codes.
    pub fn from_parsed(parsed: ParsedChart, codes: &[CountryCode]) -> anyhow::Result<Self> {
        let mut report = LoadReport {
            rows_read: parsed.records.len() + parsed.incomplete,
            incomplete: parsed.incomplete,
            ..LoadReport::default()
        };

        let mut occurrences: HashMap<(&str, &str), usize> = HashMap::new();
        for record in &parsed.records {
            *occurrences.entry(record.trend_key()).or_default() += 1;
        }

        let mut working: Vec<&StreamRecord> = Vec::with_capacity(parsed.records.len());
        for record in &parsed.records {
            if occurrences.get(&record.trend_key()).copied().unwrap_or(0) < 2 {
                report.single_bucket += 1;
            } else if record.country == GLOBAL_COUNTRY {
                report.world_chart += 1;
            } else {
                working.push(record);
            }
        }

        let buckets = TimeBuckets::from_keys(working.iter().map(|r| r.month_year.as_str()))?;
        let iso_lookup = CountryCode::lookup(codes);

        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch(create_schema())?;
        {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO streams
                     (seq, country, artist, track_name, track_url, date, month_year, bucket, streams, iso_alpha)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )?;
                for (seq, record) in working.iter().enumerate() {
                    let bucket = buckets
                        .index_of(&record.month_year)
                        .with_context(|| format!("no bucket for {}", record.month_year))?;
                    let iso_alpha = iso_lookup.get(&record.country);
                    if iso_alpha.is_none() {
                        report.unmatched_iso += 1;
                    }
                    stmt.execute(params![
                        i64::try_from(seq)?,
                        record.country,
                        record.artist,
                        record.track_name,
                        record.track_url,
                        format_date(&record.date),
                        record.month_year,
                        i64::try_from(bucket)?,
                        i64::try_from(record.streams)?,
                        iso_alpha,
                    ])?;
                }
            }
            tx.commit()?;
        }
        report.kept = working.len();

        log::info!(
            "[MT Debug] loader: Read {} rows, dropped {} incomplete, {} single-bucket, {} world-chart; kept {} across {} buckets ({} without ISO code)",
            report.rows_read,
            report.incomplete,
            report.single_bucket,
            report.world_chart,
            report.kept,
            buckets.len(),
            report.unmatched_iso
        );

        Ok(Self {
            conn: Rc::new(conn),
            buckets: Rc::new(buckets),
            report,
        })
    }
}
