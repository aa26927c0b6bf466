//! Core types for Spotify monthly streaming-chart data.
//!
//! - `stream_record`: one row of the monthly chart CSV
//! - `country_code`: the country name to ISO-alpha-3 reference table
//! - `time_bucket`: the ordinal index <-> month-year mapping used by the date filter

pub mod country_code;
pub mod stream_record;
pub mod time_bucket;

/// Country selection meaning "no country restriction".
pub const GLOBAL_COUNTRY: &str = "Global";
