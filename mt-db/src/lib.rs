//! In-memory SQLite dataset for the Music Trends dashboard.
//!
//! This crate loads the monthly chart CSV and the country-code reference
//! table once, applies the load-time cleaning rules, and stores the
//! working rows in an in-memory SQLite database. Typed query methods then
//! serve the filter option lists and the three chart aggregations.
//!
//! # Architecture
//!
//! - `Rc<Connection>` shared by every clone; nothing writes to it after load
//! - Loading happens in [`Dataset::load`] (see `loader`), which either
//!   returns a complete dataset or fails
//! - Aggregations are SQL `GROUP BY` + `SUM(streams)` queries returning
//!   serializable structs from [`models`]
//!
//! # Usage
//!
//! ```rust
//! use mt_db::{filter::{CountryScope, Selection}, Dataset};
//!
//! let chart = "\
//! Track Name,Artist,Streams,Track URL,Date,Country,month_year
//! Bad Guy,Billie Eilish,100,https://t/1,2019-09-01,Portugal,2019-09
//! Bad Guy,Billie Eilish,200,https://t/1,2019-10-01,Portugal,2019-10
//! ";
//! let codes = "country,iso_alpha\nPortugal,PRT\n";
//! let dataset = Dataset::from_csv(chart, codes).unwrap();
//!
//! let selection = Selection::new(CountryScope::Global, dataset.full_range().unwrap());
//! let series = dataset.time_series(&selection).unwrap();
//! assert_eq!(series.total(), 300);
//! ```

pub mod filter;
mod loader;
pub mod models;
mod queries;
pub mod schema;

pub use loader::LoadReport;
pub use queries::TOP_ARTISTS;

use mt_charts::time_bucket::{BucketRange, TimeBuckets};
use rusqlite::Connection;
use std::rc::Rc;

/// The loaded, immutable working dataset.
///
/// Cheaply cloneable (via `Rc`); every clone reads the same rows. There
/// are no mutating methods, so sessions can share one instance freely
/// on a single thread.
#[derive(Clone)]
pub struct Dataset {
    conn: Rc<Connection>,
    buckets: Rc<TimeBuckets>,
    report: LoadReport,
}

impl Dataset {
    /// The process-wide ordinal <-> month-year mapping.
    pub fn buckets(&self) -> &TimeBuckets {
        &self.buckets
    }

    /// Range covering every time bucket, None for an empty dataset.
    pub fn full_range(&self) -> Option<BucketRange> {
        self.buckets.full_range()
    }

    /// Row counts recorded while loading.
    pub fn report(&self) -> &LoadReport {
        &self.report
    }
}
