//! SQL schema for the in-memory dataset.
//!
//! The schema is applied as a single batch when a dataset is loaded.

/// Returns the full SQL schema as a single batch string.
///
/// One table, `streams`, holds the working rows in load order. `seq`
/// records that order (first-seen lookups and stable ordering depend on
/// it) and `bucket` is the row's time-bucket ordinal.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS streams (
        seq INTEGER PRIMARY KEY,
        country TEXT NOT NULL,
        artist TEXT NOT NULL,
        track_name TEXT NOT NULL,
        track_url TEXT NOT NULL,
        date TEXT NOT NULL,
        month_year TEXT NOT NULL,
        bucket INTEGER NOT NULL,
        streams INTEGER NOT NULL CHECK (streams >= 0),
        iso_alpha TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_streams_country ON streams(country);
    CREATE INDEX IF NOT EXISTS idx_streams_artist ON streams(artist);
    CREATE INDEX IF NOT EXISTS idx_streams_bucket ON streams(bucket);
    "#
}
