//! A resolved filter selection and its translation to SQL conditions.

use mt_charts::time_bucket::BucketRange;
use mt_charts::GLOBAL_COUNTRY;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Which countries a query covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryScope {
    /// Every country.
    Global,
    Country(String),
}

impl CountryScope {
    /// Scope of a country selection: empty or `Global` means every country.
    pub fn from_selection(country: Option<&str>) -> Self {
        match country {
            None => CountryScope::Global,
            Some(c) if c == GLOBAL_COUNTRY => CountryScope::Global,
            Some(c) => CountryScope::Country(c.to_string()),
        }
    }

    /// Display name, `Global` for the all-countries scope.
    pub fn name(&self) -> &str {
        match self {
            CountryScope::Global => GLOBAL_COUNTRY,
            CountryScope::Country(c) => c,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, CountryScope::Global)
    }
}

/// A consistent filter selection, ready for aggregation.
///
/// `song` is only meaningful together with `artist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub scope: CountryScope,
    pub artist: Option<String>,
    pub song: Option<String>,
    pub range: BucketRange,
}

impl Selection {
    pub fn new(scope: CountryScope, range: BucketRange) -> Self {
        Self {
            scope,
            artist: None,
            song: None,
            range,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_song(mut self, song: impl Into<String>) -> Self {
        self.song = Some(song.into());
        self
    }
}

/// A `WHERE` clause under construction, with positional parameters.
#[derive(Debug, Default)]
pub(crate) struct Conditions {
    clauses: Vec<&'static str>,
    params: Vec<Value>,
}

impl Conditions {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn range(mut self, range: BucketRange) -> Self {
        self.clauses.push("bucket BETWEEN ? AND ?");
        self.params.push(Value::Integer(range.start as i64));
        self.params.push(Value::Integer(range.end as i64));
        self
    }

    pub(crate) fn scope(mut self, scope: &CountryScope) -> Self {
        if let CountryScope::Country(country) = scope {
            self.clauses.push("country = ?");
            self.params.push(Value::Text(country.clone()));
        }
        self
    }

    pub(crate) fn artist(mut self, artist: Option<&str>) -> Self {
        if let Some(artist) = artist {
            self.clauses.push("artist = ?");
            self.params.push(Value::Text(artist.to_string()));
        }
        self
    }

    pub(crate) fn track(mut self, track: Option<&str>) -> Self {
        if let Some(track) = track {
            self.clauses.push("track_name = ?");
            self.params.push(Value::Text(track.to_string()));
        }
        self
    }

    pub(crate) fn with_iso_code(mut self) -> Self {
        self.clauses.push("iso_alpha IS NOT NULL");
        self
    }

    /// The conditions joined with `AND`; `1` when there are none.
    pub(crate) fn sql(&self) -> String {
        if self.clauses.is_empty() {
            "1".to_string()
        } else {
            self.clauses.join(" AND ")
        }
    }

    pub(crate) fn params(&self) -> &[Value] {
        &self.params
    }
}
