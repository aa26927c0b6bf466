//! Dashboard filter state and its transition function.
//!
//! The four filters form a strict hierarchy: the date range depends on
//! the country, artist options on country and date range, and song
//! options on all three. [`resolve`] applies one user event and
//! recomputes everything downstream of it in the same step, so a state
//! returned from it never carries an option that is invalid for its
//! upstream filters.

use mt_charts::time_bucket::BucketRange;
use mt_charts::GLOBAL_COUNTRY;
use mt_db::filter::{CountryScope, Selection};
use mt_db::Dataset;
use serde::{Deserialize, Serialize};

/// A user interaction with the dashboard controls.
///
/// Serialized as `{"event": "<name>", "value": ...}`. A missing `value`
/// reads as `null`, so `{"event": "artist_changed"}` clears the artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "value",
    rename_all = "snake_case",
    try_from = "RawFilterEvent"
)]
pub enum FilterEvent {
    CountryChanged(Option<String>),
    ArtistChanged(Option<String>),
    SongChanged(Option<String>),
    DateRangeChanged { start: usize, end: usize },
    /// A map region was clicked; carries the region's display label, if any.
    MapRegionClicked(Option<String>),
    ErrorNoticeDismissed,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum EventKind {
    CountryChanged,
    ArtistChanged,
    SongChanged,
    DateRangeChanged,
    MapRegionClicked,
    ErrorNoticeDismissed,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventValue {
    Range { start: usize, end: usize },
    Label(String),
}

/// Wire form of [`FilterEvent`] with an optional `value`.
#[derive(Debug, Deserialize)]
struct RawFilterEvent {
    event: EventKind,
    #[serde(default)]
    value: Option<EventValue>,
}

fn label_value(kind: EventKind, value: Option<EventValue>) -> Result<Option<String>, String> {
    match value {
        None => Ok(None),
        Some(EventValue::Label(label)) => Ok(Some(label)),
        Some(EventValue::Range { .. }) => Err(format!("{:?} takes a label, not a range", kind)),
    }
}

impl TryFrom<RawFilterEvent> for FilterEvent {
    type Error = String;

    fn try_from(raw: RawFilterEvent) -> Result<Self, Self::Error> {
        let RawFilterEvent { event, value } = raw;
        Ok(match event {
            EventKind::CountryChanged => FilterEvent::CountryChanged(label_value(event, value)?),
            EventKind::ArtistChanged => FilterEvent::ArtistChanged(label_value(event, value)?),
            EventKind::SongChanged => FilterEvent::SongChanged(label_value(event, value)?),
            EventKind::MapRegionClicked => {
                FilterEvent::MapRegionClicked(label_value(event, value)?)
            }
            EventKind::DateRangeChanged => match value {
                Some(EventValue::Range { start, end }) => {
                    FilterEvent::DateRangeChanged { start, end }
                }
                _ => return Err("date_range_changed needs a {start, end} value".to_string()),
            },
            EventKind::ErrorNoticeDismissed => FilterEvent::ErrorNoticeDismissed,
        })
    }
}

/// The selected filter values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub country: Option<String>,
    pub artist: Option<String>,
    pub song: Option<String>,
    pub date_range: Option<BucketRange>,
}

impl FilterState {
    /// Countries covered by the selection; an empty country means Global.
    pub fn scope(&self) -> CountryScope {
        CountryScope::from_selection(self.country.as_deref())
    }

    /// The selection handed to the aggregations, None without a date range.
    pub fn selection(&self) -> Option<Selection> {
        let range = self.date_range?;
        Some(Selection {
            scope: self.scope(),
            artist: self.artist.clone(),
            song: self.artist.as_ref().and(self.song.clone()),
            range,
        })
    }
}

/// Choices currently offered by each control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// `Global` followed by every country, sorted.
    pub countries: Vec<String>,
    /// Time-bucket ordinals present for the current country.
    pub date_marks: Vec<usize>,
    pub artists: Vec<String>,
    pub songs: Vec<String>,
}

impl FilterOptions {
    fn mark_bounds(&self) -> Option<BucketRange> {
        match (self.date_marks.first(), self.date_marks.last()) {
            (Some(&first), Some(&last)) => Some(BucketRange::new(first, last)),
            _ => None,
        }
    }

    /// The date mark closest to `index`; the earlier one on a tie.
    fn nearest_mark(&self, index: usize) -> Option<usize> {
        let marks = &self.date_marks;
        let pos = match marks.binary_search(&index) {
            Ok(_) => return Some(index),
            Err(pos) => pos,
        };
        let below = pos.checked_sub(1).and_then(|i| marks.get(i)).copied();
        let above = marks.get(pos).copied();
        match (below, above) {
            (Some(b), Some(a)) => Some(if index - b <= a - index { b } else { a }),
            (b, a) => b.or(a),
        }
    }
}

/// Per-session dashboard state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardState {
    pub filters: FilterState,
    pub options: FilterOptions,
    /// The date control is hidden while no country is selected.
    pub date_control_visible: bool,
    /// A complete selection matched no rows and the notice was not dismissed.
    pub show_empty_notice: bool,
}

impl DashboardState {
    /// Starting state: `Global` over the full date range.
    pub fn initial(dataset: &Dataset) -> anyhow::Result<Self> {
        let mut countries = vec![GLOBAL_COUNTRY.to_string()];
        countries.extend(
            dataset
                .countries()?
                .into_iter()
                .filter(|c| c != GLOBAL_COUNTRY),
        );
        let mut state = Self {
            options: FilterOptions {
                countries,
                ..FilterOptions::default()
            },
            ..Self::default()
        };
        state.apply_country(dataset, Some(GLOBAL_COUNTRY.to_string()))?;
        state.refresh_empty_notice(dataset)?;
        Ok(state)
    }

    fn is_known_country(&self, country: &str) -> bool {
        self.options.countries.iter().any(|c| c == country)
    }

    fn apply_country(&mut self, dataset: &Dataset, country: Option<String>) -> anyhow::Result<()> {
        let country = match country {
            Some(c) if !self.is_known_country(&c) => {
                log::warn!("Unknown country {:?}, falling back to {}", c, GLOBAL_COUNTRY);
                Some(GLOBAL_COUNTRY.to_string())
            }
            other => other,
        };
        self.date_control_visible = country.is_some();
        self.filters.country = country;
        self.filters.artist = None;

        // An empty country still gets the Global range; the control is
        // only hidden.
        self.options.date_marks = dataset.buckets_for(&self.filters.scope())?;
        self.filters.date_range = self.options.mark_bounds();

        self.refresh_artists(dataset)?;
        self.refresh_songs(dataset)
    }

    fn apply_date_range(&mut self, dataset: &Dataset, range: BucketRange) -> anyhow::Result<()> {
        // Both bounds snap to months the current scope actually has.
        self.filters.date_range = match (
            self.options.nearest_mark(range.start),
            self.options.nearest_mark(range.end),
        ) {
            (Some(start), Some(end)) => Some(BucketRange::new(start, end)),
            _ => None,
        };
        self.refresh_artists(dataset)?;
        self.refresh_songs(dataset)
    }

    fn apply_artist(&mut self, dataset: &Dataset, artist: Option<String>) -> anyhow::Result<()> {
        self.filters.artist = match artist {
            Some(a) if !self.options.artists.contains(&a) => {
                log::warn!("Artist {:?} is not charted for this selection, clearing it", a);
                None
            }
            other => other,
        };
        self.refresh_songs(dataset)
    }

    fn apply_song(&mut self, song: Option<String>) {
        self.filters.song = match song {
            Some(s) if self.filters.artist.is_none() => {
                log::warn!("Song {:?} selected without an artist, clearing it", s);
                None
            }
            Some(s) if !self.options.songs.contains(&s) => {
                log::warn!("Song {:?} is not charted for this selection, clearing it", s);
                None
            }
            other => other,
        };
    }

    fn refresh_artists(&mut self, dataset: &Dataset) -> anyhow::Result<()> {
        self.options.artists = match self.filters.date_range {
            Some(range) => dataset.artists_for(&self.filters.scope(), range)?,
            None => Vec::new(),
        };
        // A selected artist survives a date-range change even when it has
        // no rows in the new window; the empty-selection notice covers it.
        // Artists unknown to the country never reach this point.
        Ok(())
    }

    fn refresh_songs(&mut self, dataset: &Dataset) -> anyhow::Result<()> {
        self.options.songs = match (&self.filters.artist, self.filters.date_range) {
            (Some(artist), Some(range)) => {
                dataset.tracks_for(&self.filters.scope(), artist, range)?
            }
            _ => Vec::new(),
        };
        // The only auto-selection: a single candidate track is picked.
        self.filters.song = match self.options.songs.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        Ok(())
    }

    fn refresh_empty_notice(&mut self, dataset: &Dataset) -> anyhow::Result<()> {
        self.show_empty_notice = match (&self.filters.country, self.filters.selection()) {
            (Some(_), Some(selection)) => dataset.count_matching(&selection)? == 0,
            _ => false,
        };
        Ok(())
    }

    /// Country a clicked map region stands for; `Global` when the click
    /// did not land on a known country.
    fn country_for_region(&self, label: Option<&str>) -> String {
        match label {
            Some(l) if self.is_known_country(l) => l.to_string(),
            _ => GLOBAL_COUNTRY.to_string(),
        }
    }
}

/// Apply one event to `current` and return the reconciled state.
pub fn resolve(
    dataset: &Dataset,
    current: &DashboardState,
    event: FilterEvent,
) -> anyhow::Result<DashboardState> {
    log::debug!("Resolving {:?}", event);
    let mut next = current.clone();
    match event {
        FilterEvent::CountryChanged(country) => next.apply_country(dataset, country)?,
        FilterEvent::DateRangeChanged { start, end } => {
            next.apply_date_range(dataset, BucketRange::new(start, end))?
        }
        FilterEvent::ArtistChanged(artist) => next.apply_artist(dataset, artist)?,
        FilterEvent::SongChanged(song) => next.apply_song(song),
        FilterEvent::MapRegionClicked(label) => {
            let country = next.country_for_region(label.as_deref());
            next.apply_country(dataset, Some(country))?
        }
        FilterEvent::ErrorNoticeDismissed => {
            next.show_empty_notice = false;
            return Ok(next);
        }
    }
    next.refresh_empty_notice(dataset)?;
    Ok(next)
}
