//! Typed query methods: filter option lookups and the three chart
//! aggregations.
//!
//! # Ordering
//!
//! Every result is fully ordered so a fixed dataset always yields the same
//! output. Option lists are ascending. Aggregations group by key, and
//! "grouped order" means ascending key order; descending rankings break
//! ties on streams by that order, which makes them a stable sort over the
//! grouped rows.

use crate::filter::{Conditions, CountryScope, Selection};
use crate::models::{
    DatasetRow, GeoResult, GeoTotal, RankedEntry, RankedKind, RankedResult, TimeSeriesPoint,
    TimeSeriesResult,
};
use crate::Dataset;
use mt_charts::time_bucket::BucketRange;
use rusqlite::params_from_iter;

/// Size of the top-artists window of the ranked chart.
pub const TOP_ARTISTS: usize = 10;

fn streams(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn bucket(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Song condition for a selection; a song only narrows an artist.
fn pinned_song(selection: &Selection) -> Option<&str> {
    selection
        .artist
        .as_ref()
        .and(selection.song.as_deref())
}

impl Dataset {
    // ───────────────────── Rows & Options ─────────────────────

    /// Every working row in load order.
    pub fn rows(&self) -> anyhow::Result<Vec<DatasetRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, country, artist, track_name, track_url, date, month_year, bucket, streams, iso_alpha
             FROM streams
             ORDER BY seq",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DatasetRow {
                    seq: row.get(0)?,
                    country: row.get(1)?,
                    artist: row.get(2)?,
                    track_name: row.get(3)?,
                    track_url: row.get(4)?,
                    date: row.get(5)?,
                    month_year: row.get(6)?,
                    bucket: bucket(row.get(7)?),
                    streams: streams(row.get(8)?),
                    iso_alpha: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Sorted distinct values of one column under `conditions`.
    fn distinct_values(&self, column: &str, conditions: &Conditions) -> anyhow::Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {column} FROM streams WHERE {} ORDER BY {column}",
            conditions.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let values = stmt
            .query_map(params_from_iter(conditions.params()), |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(values)
    }

    /// Sorted distinct countries of the working dataset.
    pub fn countries(&self) -> anyhow::Result<Vec<String>> {
        self.distinct_values("country", &Conditions::new())
    }

    /// Sorted distinct time-bucket ordinals observed in `scope`.
    pub fn buckets_for(&self, scope: &CountryScope) -> anyhow::Result<Vec<usize>> {
        let conditions = Conditions::new().scope(scope);
        let sql = format!(
            "SELECT DISTINCT bucket FROM streams WHERE {} ORDER BY bucket",
            conditions.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let buckets = stmt
            .query_map(params_from_iter(conditions.params()), |row| {
                row.get::<_, i64>(0).map(bucket)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(buckets)
    }

    /// Sorted distinct artists charted in `scope` within `range`.
    pub fn artists_for(
        &self,
        scope: &CountryScope,
        range: BucketRange,
    ) -> anyhow::Result<Vec<String>> {
        let conditions = Conditions::new().scope(scope).range(range);
        let artists = self.distinct_values("artist", &conditions)?;
        log::info!(
            "[MT Debug] query: artists_for {} returned {} artists",
            scope.name(),
            artists.len()
        );
        Ok(artists)
    }

    /// Sorted distinct track names of `artist` charted in `scope` within `range`.
    pub fn tracks_for(
        &self,
        scope: &CountryScope,
        artist: &str,
        range: BucketRange,
    ) -> anyhow::Result<Vec<String>> {
        let conditions = Conditions::new()
            .scope(scope)
            .artist(Some(artist))
            .range(range);
        let tracks = self.distinct_values("track_name", &conditions)?;
        log::info!(
            "[MT Debug] query: tracks_for {} in {} returned {} tracks",
            artist,
            scope.name(),
            tracks.len()
        );
        Ok(tracks)
    }

    /// Number of rows a selection matches.
    pub fn count_matching(&self, selection: &Selection) -> anyhow::Result<usize> {
        let conditions = Conditions::new()
            .scope(&selection.scope)
            .artist(selection.artist.as_deref())
            .track(pinned_song(selection))
            .range(selection.range);
        let sql = format!("SELECT COUNT(*) FROM streams WHERE {}", conditions.sql());
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(conditions.params()), |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ───────────────────── Aggregations ─────────────────────

    /// Streams over time for the line chart, ascending by date.
    ///
    /// Rows are grouped per time bucket with streams summed; the x-value of
    /// a bucket is the date of its first row in load order. A song pinned
    /// in one country is a single chart entry with one row per bucket, so
    /// its rows are returned as they are.
    pub fn time_series(&self, selection: &Selection) -> anyhow::Result<TimeSeriesResult> {
        let song = pinned_song(selection);
        let conditions = Conditions::new()
            .scope(&selection.scope)
            .range(selection.range)
            .artist(selection.artist.as_deref())
            .track(song);

        let sql = if song.is_some() && !selection.scope.is_global() {
            format!(
                "SELECT date, month_year, streams FROM streams
                 WHERE {}
                 ORDER BY date, seq",
                conditions.sql()
            )
        } else {
            // With exactly one MIN() aggregate, SQLite takes the bare
            // columns from the row holding the minimum: the first-seen row.
            format!(
                "SELECT date, month_year, SUM(streams), MIN(seq) FROM streams
                 WHERE {}
                 GROUP BY bucket
                 ORDER BY date, bucket",
                conditions.sql()
            )
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let points = stmt
            .query_map(params_from_iter(conditions.params()), |row| {
                Ok(TimeSeriesPoint {
                    date: row.get(0)?,
                    month_year: row.get(1)?,
                    streams: streams(row.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "[MT Debug] query: time_series returned {} points",
            points.len()
        );
        Ok(TimeSeriesResult { points })
    }

    /// Per-region totals for the map.
    ///
    /// The map always shows every country, so the country selection is not
    /// applied; the date range, artist and song are. Rows without an ISO
    /// code are left out.
    pub fn geo_totals(&self, selection: &Selection) -> anyhow::Result<GeoResult> {
        let conditions = Conditions::new()
            .range(selection.range)
            .artist(selection.artist.as_deref())
            .track(pinned_song(selection))
            .with_iso_code();
        let sql = format!(
            "SELECT iso_alpha, country, SUM(streams) FROM streams
             WHERE {}
             GROUP BY iso_alpha, country
             ORDER BY iso_alpha, country",
            conditions.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let totals = stmt
            .query_map(params_from_iter(conditions.params()), |row| {
                Ok(GeoTotal {
                    iso_alpha: row.get(0)?,
                    country: row.get(1)?,
                    streams: streams(row.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "[MT Debug] query: geo_totals returned {} regions",
            totals.len()
        );
        Ok(GeoResult { totals })
    }

    /// Ranked totals for the bar chart, descending by streams.
    ///
    /// Without an artist: the top [`TOP_ARTISTS`] artists of the scope.
    /// With an artist: every track of that artist in the scope.
    pub fn ranked_totals(&self, selection: &Selection) -> anyhow::Result<RankedResult> {
        let (kind, conditions, sql) = match selection.artist.as_deref() {
            None => {
                let conditions = Conditions::new()
                    .scope(&selection.scope)
                    .range(selection.range);
                let sql = format!(
                    "SELECT artist, SUM(streams) AS total FROM streams
                     WHERE {}
                     GROUP BY artist
                     ORDER BY total DESC, artist ASC
                     LIMIT {}",
                    conditions.sql(),
                    TOP_ARTISTS
                );
                (RankedKind::Artists, conditions, sql)
            }
            Some(artist) => {
                let conditions = Conditions::new()
                    .scope(&selection.scope)
                    .artist(Some(artist))
                    .range(selection.range);
                let sql = format!(
                    "SELECT track_name, SUM(streams) AS total FROM streams
                     WHERE {}
                     GROUP BY track_name
                     ORDER BY total DESC, track_name ASC",
                    conditions.sql()
                );
                (RankedKind::Tracks, conditions, sql)
            }
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(conditions.params()), |row| {
                Ok(RankedEntry {
                    label: row.get(0)?,
                    streams: streams(row.get(1)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "[MT Debug] query: ranked_totals ({:?}) returned {} entries",
            kind,
            entries.len()
        );
        Ok(RankedResult { kind, entries })
    }
}

#[cfg(test)]
mod tests {
    use crate::filter::{CountryScope, Selection};
    use crate::fixtures::{dataset, COUNTRY_CODES};
    use crate::models::RankedKind;
    use crate::Dataset;
    use mt_charts::time_bucket::BucketRange;

    fn portugal() -> CountryScope {
        CountryScope::Country("Portugal".to_string())
    }

    fn full() -> BucketRange {
        BucketRange::new(0, 2)
    }

    #[test]
    fn countries_sorted() {
        assert_eq!(
            dataset().countries().unwrap(),
            vec!["Atlantis", "France", "Portugal"]
        );
    }

    #[test]
    fn buckets_for_scope() {
        let dataset = dataset();
        assert_eq!(dataset.buckets_for(&CountryScope::Global).unwrap(), vec![0, 1, 2]);
        assert_eq!(
            dataset
                .buckets_for(&CountryScope::Country("Atlantis".to_string()))
                .unwrap(),
            vec![0, 1]
        );
        assert!(dataset
            .buckets_for(&CountryScope::Country("Nowhere".to_string()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn artists_within_range() {
        let dataset = dataset();
        assert_eq!(dataset.artists_for(&portugal(), full()).unwrap(), vec!["Artist A", "Artist B"]);
        assert_eq!(
            dataset.artists_for(&portugal(), BucketRange::new(0, 0)).unwrap(),
            vec!["Artist A"]
        );
        let france = CountryScope::Country("France".to_string());
        assert_eq!(
            dataset.artists_for(&france, BucketRange::new(1, 1)).unwrap(),
            vec!["Artist C"]
        );
    }

    #[test]
    fn artist_options_have_matching_rows() {
        let dataset = dataset();
        for country in dataset.countries().unwrap() {
            let scope = CountryScope::Country(country.clone());
            for start in 0..3 {
                for end in start..3 {
                    let range = BucketRange::new(start, end);
                    for artist in dataset.artists_for(&scope, range).unwrap() {
                        let selection = Selection::new(scope.clone(), range).with_artist(artist);
                        assert!(dataset.count_matching(&selection).unwrap() >= 1);
                    }
                }
            }
        }
    }

    #[test]
    fn tracks_for_artist() {
        let dataset = dataset();
        assert_eq!(
            dataset.tracks_for(&portugal(), "Artist A", full()).unwrap(),
            vec!["T1", "T4"]
        );
        assert_eq!(
            dataset.tracks_for(&portugal(), "Artist B", full()).unwrap(),
            vec!["T3"]
        );
        assert!(dataset
            .tracks_for(&portugal(), "Artist C", full())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn count_matching_selection() {
        let dataset = dataset();
        let selection = Selection::new(portugal(), BucketRange::new(0, 0)).with_artist("Artist A");
        assert_eq!(dataset.count_matching(&selection).unwrap(), 1);
        let france = CountryScope::Country("France".to_string());
        let selection = Selection::new(france, full()).with_artist("Artist B");
        assert_eq!(dataset.count_matching(&selection).unwrap(), 0);
    }

    #[test]
    fn time_series_for_country() {
        let series = dataset().time_series(&Selection::new(portugal(), full())).unwrap();
        let points: Vec<(&str, u64)> = series
            .points
            .iter()
            .map(|p| (p.date.as_str(), p.streams))
            .collect();
        assert_eq!(
            points,
            vec![("2019-09-01", 100), ("2019-10-01", 310), ("2019-11-01", 90)]
        );
    }

    #[test]
    fn time_series_for_artist() {
        let selection = Selection::new(portugal(), full()).with_artist("Artist A");
        let series = dataset().time_series(&selection).unwrap();
        let totals: Vec<u64> = series.points.iter().map(|p| p.streams).collect();
        assert_eq!(totals, vec![100, 240, 60]);
    }

    #[test]
    fn time_series_pinned_song_is_unaggregated() {
        let selection = Selection::new(portugal(), full())
            .with_artist("Artist A")
            .with_song("T1");
        let series = dataset().time_series(&selection).unwrap();
        let points: Vec<(&str, u64)> = series
            .points
            .iter()
            .map(|p| (p.month_year.as_str(), p.streams))
            .collect();
        assert_eq!(points, vec![("2019-09", 100), ("2019-10", 200)]);
    }

    #[test]
    fn time_series_pinned_song_global_sums_countries() {
        let selection = Selection::new(CountryScope::Global, full())
            .with_artist("Artist A")
            .with_song("T1");
        let series = dataset().time_series(&selection).unwrap();
        let totals: Vec<u64> = series.points.iter().map(|p| p.streams).collect();
        assert_eq!(totals, vec![600, 200, 400]);
    }

    #[test]
    fn time_series_uses_first_seen_date() {
        let chart = "\
Track Name,Artist,Streams,Track URL,Date,Country,month_year
T1,A,10,https://t/1,2019-09-15,Spain,2019-09
T2,B,20,https://t/2,2019-09-01,Spain,2019-09
T1,A,30,https://t/1,2019-10-15,Spain,2019-10
T2,B,40,https://t/2,2019-10-01,Spain,2019-10
";
        let dataset = Dataset::from_csv(chart, COUNTRY_CODES).unwrap();
        let series = dataset
            .time_series(&Selection::new(CountryScope::Global, BucketRange::new(0, 1)))
            .unwrap();
        assert_eq!(series.points[0].date, "2019-09-15");
        assert_eq!(series.points[0].streams, 30);
        assert_eq!(series.points[1].date, "2019-10-15");
        assert_eq!(series.points[1].streams, 70);
    }

    #[test]
    fn time_series_sorted_by_date() {
        let series = dataset()
            .time_series(&Selection::new(CountryScope::Global, full()))
            .unwrap();
        assert!(series.points.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn portugal_scenario_time_series() {
        let chart = "\
Track Name,Artist,Streams,Track URL,Date,Country,month_year
T1,Artist A,100,https://t/1,2019-09-01,Portugal,2019-09
T1,Artist A,200,https://t/1,2019-10-01,Portugal,2019-10
T2,Artist B,50,https://t/2,2019-09-01,Portugal,2019-09
";
        let dataset = Dataset::from_csv(chart, COUNTRY_CODES).unwrap();
        let series = dataset
            .time_series(&Selection::new(portugal(), BucketRange::new(0, 1)))
            .unwrap();
        let points: Vec<(&str, u64)> = series
            .points
            .iter()
            .map(|p| (p.month_year.as_str(), p.streams))
            .collect();
        assert_eq!(points, vec![("2019-09", 100), ("2019-10", 200)]);
    }

    #[test]
    fn totals_conserved_across_paths() {
        let dataset = dataset();
        for scope in [CountryScope::Global, portugal()] {
            let selection = Selection::new(scope, full());
            let series = dataset.time_series(&selection).unwrap();
            let ranked = dataset.ranked_totals(&selection).unwrap();
            assert_eq!(series.total(), ranked.total());
        }
    }

    #[test]
    fn geo_totals_skip_unmapped_countries() {
        let geo = dataset()
            .geo_totals(&Selection::new(CountryScope::Global, full()))
            .unwrap();
        let regions: Vec<(&str, &str, u64)> = geo
            .totals
            .iter()
            .map(|t| (t.iso_alpha.as_str(), t.country.as_str(), t.streams))
            .collect();
        assert_eq!(
            regions,
            vec![("FRA", "France", 1500), ("PRT", "Portugal", 500)]
        );
        assert!(geo.totals.iter().all(|t| t.country != "Atlantis"));
    }

    #[test]
    fn geo_totals_ignore_country_selection() {
        let dataset = dataset();
        let global = dataset
            .geo_totals(&Selection::new(CountryScope::Global, full()))
            .unwrap();
        let local = dataset.geo_totals(&Selection::new(portugal(), full())).unwrap();
        assert_eq!(global, local);
    }

    #[test]
    fn geo_totals_for_artist_and_song() {
        let dataset = dataset();
        let selection = Selection::new(CountryScope::Global, full()).with_artist("Artist A");
        let geo = dataset.geo_totals(&selection).unwrap();
        assert_eq!(geo.get("FRA").unwrap().streams, 900);
        assert_eq!(geo.get("PRT").unwrap().streams, 400);

        let geo = dataset
            .geo_totals(&selection.with_song("T4"))
            .unwrap();
        assert_eq!(geo.totals.len(), 1);
        assert_eq!(geo.get("PRT").unwrap().streams, 100);
    }

    #[test]
    fn geo_totals_respect_date_range() {
        let geo = dataset()
            .geo_totals(&Selection::new(CountryScope::Global, BucketRange::new(2, 2)))
            .unwrap();
        assert_eq!(geo.get("FRA").unwrap().streams, 400);
        assert_eq!(geo.get("PRT").unwrap().streams, 90);
    }

    #[test]
    fn global_totals_match_across_map_and_ranking() {
        let chart = "\
Track Name,Artist,Streams,Track URL,Date,Country,month_year
T1,A,100,https://t/1,2019-09-01,Portugal,2019-09
T1,A,200,https://t/1,2019-10-01,Portugal,2019-10
T2,B,50,https://t/2,2019-09-01,France,2019-09
T2,B,70,https://t/2,2019-10-01,France,2019-10
";
        let dataset = Dataset::from_csv(chart, COUNTRY_CODES).unwrap();
        let selection = Selection::new(CountryScope::Global, BucketRange::new(0, 1));
        let geo = dataset.geo_totals(&selection).unwrap();
        let ranked = dataset.ranked_totals(&selection).unwrap();
        assert_eq!(geo.total(), 420);
        assert_eq!(geo.total(), ranked.total());
    }

    #[test]
    fn ranked_artists_descending() {
        let ranked = dataset()
            .ranked_totals(&Selection::new(CountryScope::Global, full()))
            .unwrap();
        assert_eq!(ranked.kind, RankedKind::Artists);
        let entries: Vec<(&str, u64)> = ranked
            .entries
            .iter()
            .map(|e| (e.label.as_str(), e.streams))
            .collect();
        assert_eq!(
            entries,
            vec![("Artist A", 1300), ("Artist C", 630), ("Artist B", 100)]
        );
    }

    #[test]
    fn ranked_tracks_for_artist() {
        let selection = Selection::new(portugal(), full()).with_artist("Artist A");
        let ranked = dataset().ranked_totals(&selection).unwrap();
        assert_eq!(ranked.kind, RankedKind::Tracks);
        let entries: Vec<(&str, u64)> = ranked
            .entries
            .iter()
            .map(|e| (e.label.as_str(), e.streams))
            .collect();
        assert_eq!(entries, vec![("T1", 300), ("T4", 100)]);
    }

    #[test]
    fn ranked_ties_keep_grouped_order() {
        let chart = "\
Track Name,Artist,Streams,Track URL,Date,Country,month_year
T1,Zed,25,https://t/1,2019-09-01,Spain,2019-09
T1,Zed,25,https://t/1,2019-10-01,Spain,2019-10
T2,Abe,30,https://t/2,2019-09-01,Spain,2019-09
T2,Abe,20,https://t/2,2019-10-01,Spain,2019-10
T3,Max,90,https://t/3,2019-09-01,Spain,2019-09
T3,Max,10,https://t/3,2019-10-01,Spain,2019-10
";
        let dataset = Dataset::from_csv(chart, COUNTRY_CODES).unwrap();
        let ranked = dataset
            .ranked_totals(&Selection::new(CountryScope::Global, BucketRange::new(0, 1)))
            .unwrap();
        let labels: Vec<&str> = ranked.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Max", "Abe", "Zed"]);
        assert!(ranked
            .entries
            .windows(2)
            .all(|w| w[0].streams >= w[1].streams));
    }

    #[test]
    fn ranked_artists_capped_at_top_ten() {
        let mut chart =
            String::from("Track Name,Artist,Streams,Track URL,Date,Country,month_year\n");
        for i in 0..12 {
            for month in ["2019-09", "2019-10"] {
                chart.push_str(&format!(
                    "T{i},Artist {i:02},{},https://t/{i},{month}-01,Spain,{month}\n",
                    100 + i
                ));
            }
        }
        let dataset = Dataset::from_csv(&chart, COUNTRY_CODES).unwrap();
        let selection = Selection::new(CountryScope::Global, BucketRange::new(0, 1));
        let ranked = dataset.ranked_totals(&selection).unwrap();
        assert_eq!(ranked.entries.len(), crate::TOP_ARTISTS);
        assert_eq!(ranked.entries[0].label, "Artist 11");

        // the uncapped sum still matches the time series
        let series = dataset.time_series(&selection).unwrap();
        let full_sum: u64 = (0..12).map(|i| 2 * (100 + i)).sum();
        assert_eq!(series.total(), full_sum);
        assert!(ranked.total() < full_sum);
    }

    #[test]
    fn ranked_tracks_are_not_capped() {
        let mut chart =
            String::from("Track Name,Artist,Streams,Track URL,Date,Country,month_year\n");
        for i in 0..14 {
            for month in ["2019-09", "2019-10"] {
                chart.push_str(&format!(
                    "Song {i:02},Prolific,{},https://t/{i},{month}-01,Spain,{month}\n",
                    10 * (i + 1)
                ));
            }
        }
        let dataset = Dataset::from_csv(&chart, COUNTRY_CODES).unwrap();
        let spain = CountryScope::Country("Spain".to_string());
        let selection = Selection::new(spain, BucketRange::new(0, 1)).with_artist("Prolific");
        let ranked = dataset.ranked_totals(&selection).unwrap();
        assert_eq!(ranked.kind, RankedKind::Tracks);
        assert_eq!(ranked.entries.len(), 14);
        let labels: Vec<String> = ranked.entries.iter().map(|e| e.label.clone()).collect();
        let expected: Vec<String> = (0..14).rev().map(|i| format!("Song {i:02}")).collect();
        assert_eq!(labels, expected);
        assert_eq!(ranked.entries[0].streams, 280);
        assert_eq!(ranked.entries[13].streams, 20);
    }

    #[test]
    fn results_serialize_to_json() {
        let ranked = dataset()
            .ranked_totals(&Selection::new(portugal(), full()))
            .unwrap();
        let json = serde_json::to_string(&ranked).unwrap();
        assert!(json.contains("\"kind\":\"artists\""));
        assert!(json.contains("\"label\":\"Artist A\""));
    }
}
