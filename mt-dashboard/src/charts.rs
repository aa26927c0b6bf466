//! Chart-ready views built from the aggregations and the filter state.
//!
//! Everything here derives `Serialize`; the rendering layer receives a
//! [`DashboardView`] as JSON and draws it as-is.

use crate::state::{DashboardState, FilterOptions, FilterState};
use crate::titles::{bar_title, date_caption, line_title, map_title, Period};
use mt_charts::time_bucket::{BucketRange, TimeBuckets};
use mt_db::models::{GeoResult, GeoTotal, RankedKind, RankedResult, TimeSeriesPoint, TimeSeriesResult};
use mt_db::Dataset;
use serde::Serialize;

pub const LINE_COLOR: &str = "#1ED760";
pub const BAR_COLOR: &str = "rgb(29, 185, 84)";
pub const HIGHLIGHT_COLOR: &str = "rgb(89, 89, 89)";

/// Choropleth colour scale, light to dark; the sixth stop is the brand green.
pub const MAP_COLOR_SCALE: [(f64, &str); 10] = [
    (0.0, "rgb(211, 248, 224)"),
    (0.111_111_111_111_111_1, "rgb(167, 241, 193)"),
    (0.222_222_222_222_222_2, "rgb(123, 234, 162)"),
    (0.333_333_333_333_333_3, "rgb(79, 227, 131)"),
    (0.444_444_444_444_444_4, "rgb(34, 221, 100)"),
    (0.555_555_555_555_555_6, "rgb(29, 185, 84)"),
    (0.666_666_666_666_666_6, "rgb(24, 154, 70)"),
    (0.777_777_777_777_777_8, "rgb(17, 110, 50)"),
    (0.888_888_888_888_888_8, "rgb(10, 66, 30)"),
    (1.0, "rgb(7, 44, 20)"),
];

const BAR_LEFT_MARGIN: u32 = 120;
const WIDE_BAR_LEFT_MARGIN: u32 = 225;
/// Labels longer than this need the wide left margin.
const LONG_BAR_LABEL: usize = 50;
/// Slider labels are shown once a year.
const MARK_LABEL_EVERY: usize = 12;

/// One stop of the map colour scale.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColorStop {
    pub position: f64,
    pub color: &'static str,
}

/// One mark of the date slider.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SliderMark {
    pub index: usize,
    pub label: String,
    pub label_visible: bool,
}

/// The date range slider.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DateControl {
    pub visible: bool,
    pub marks: Vec<SliderMark>,
    pub value: Option<BucketRange>,
    /// "From Sep-2019 to Nov-2019"
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LineChart {
    pub title: String,
    pub top_margin: u32,
    pub color: &'static str,
    pub points: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapChart {
    pub title: String,
    pub regions: Vec<GeoTotal>,
    pub color_scale: Vec<ColorStop>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Bar {
    pub label: String,
    pub streams: u64,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BarChart {
    pub title: String,
    pub kind: RankedKind,
    pub left_margin: u32,
    /// Descending by streams.
    pub bars: Vec<Bar>,
}

/// Everything the rendering layer needs for one redraw.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardView {
    pub filters: FilterState,
    pub options: FilterOptions,
    pub date_control: DateControl,
    pub line_chart: LineChart,
    pub map: MapChart,
    pub bar_chart: BarChart,
    pub show_empty_notice: bool,
}

fn period_of(buckets: &TimeBuckets, range: Option<BucketRange>) -> Option<Period<'_>> {
    let range = range?;
    Some(Period {
        start: buckets.label_at(range.start)?,
        end: buckets.label_at(range.end)?,
    })
}

fn date_control(buckets: &TimeBuckets, state: &DashboardState) -> DateControl {
    let marks = state
        .options
        .date_marks
        .iter()
        .filter_map(|&index| {
            buckets.label_at(index).map(|label| SliderMark {
                index,
                label: label.to_string(),
                label_visible: state.date_control_visible && index % MARK_LABEL_EVERY == 0,
            })
        })
        .collect();
    DateControl {
        visible: state.date_control_visible,
        marks,
        value: state.filters.date_range,
        caption: period_of(buckets, state.filters.date_range).map(date_caption),
    }
}

/// Bars of the ranked chart; a pinned song is drawn in the highlight colour.
pub fn bars(ranked: &RankedResult, pinned_song: Option<&str>) -> Vec<Bar> {
    ranked
        .entries
        .iter()
        .map(|entry| {
            let pinned = ranked.kind == RankedKind::Tracks && pinned_song == Some(entry.label.as_str());
            Bar {
                label: entry.label.clone(),
                streams: entry.streams,
                color: if pinned { HIGHLIGHT_COLOR } else { BAR_COLOR },
            }
        })
        .collect()
}

fn bar_left_margin(bars: &[Bar]) -> u32 {
    if bars.iter().any(|b| b.label.chars().count() > LONG_BAR_LABEL) {
        WIDE_BAR_LEFT_MARGIN
    } else {
        BAR_LEFT_MARGIN
    }
}

/// Run the three aggregations for `state` and format them for drawing.
pub fn render(dataset: &Dataset, state: &DashboardState) -> anyhow::Result<DashboardView> {
    let filters = &state.filters;
    let selection = filters.selection();
    let (series, geo, ranked) = match &selection {
        Some(selection) => (
            dataset.time_series(selection)?,
            dataset.geo_totals(selection)?,
            dataset.ranked_totals(selection)?,
        ),
        None => (
            TimeSeriesResult::default(),
            GeoResult::default(),
            RankedResult {
                kind: if filters.artist.is_some() {
                    RankedKind::Tracks
                } else {
                    RankedKind::Artists
                },
                entries: Vec::new(),
            },
        ),
    };

    let scope = filters.scope();
    let country = scope.name();
    let artist = selection.as_ref().and_then(|s| s.artist.as_deref());
    let song = selection.as_ref().and_then(|s| s.song.as_deref());
    let period = period_of(dataset.buckets(), filters.date_range);

    let (line_title, top_margin) = line_title(country, artist, song, period);
    let bars = bars(&ranked, song);

    Ok(DashboardView {
        filters: filters.clone(),
        options: state.options.clone(),
        date_control: date_control(dataset.buckets(), state),
        line_chart: LineChart {
            title: line_title,
            top_margin,
            color: LINE_COLOR,
            points: series.points,
        },
        map: MapChart {
            title: map_title(artist, song, period),
            regions: geo.totals,
            color_scale: MAP_COLOR_SCALE
                .iter()
                .map(|&(position, color)| ColorStop { position, color })
                .collect(),
        },
        bar_chart: BarChart {
            title: bar_title(country, artist, period),
            kind: ranked.kind,
            left_margin: bar_left_margin(&bars),
            bars,
        },
        show_empty_notice: state.show_empty_notice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::dataset;
    use crate::state::{resolve, FilterEvent};
    use mt_db::models::RankedEntry;

    fn state_for(events: Vec<FilterEvent>) -> (Dataset, DashboardState) {
        let dataset = dataset();
        let mut state = DashboardState::initial(&dataset).unwrap();
        for event in events {
            state = resolve(&dataset, &state, event).unwrap();
        }
        (dataset, state)
    }

    #[test]
    fn render_initial_view() {
        let (dataset, state) = state_for(vec![]);
        let view = render(&dataset, &state).unwrap();
        assert_eq!(
            view.line_chart.title,
            "Streams in the world<br> between Sep-2019 and Dec-2019"
        );
        assert_eq!(view.line_chart.points.len(), 4);
        assert_eq!(view.bar_chart.kind, RankedKind::Artists);
        assert_eq!(view.bar_chart.bars[0].label, "Stromae");
        assert!(view.bar_chart.bars.iter().all(|b| b.color == BAR_COLOR));
        assert_eq!(view.bar_chart.left_margin, 120);
        assert_eq!(view.map.color_scale.len(), 10);
        assert_eq!(
            view.date_control.caption.as_deref(),
            Some("From Sep-2019 to Dec-2019")
        );
        assert!(!view.show_empty_notice);
    }

    #[test]
    fn render_totals_agree() {
        let (dataset, state) = state_for(vec![FilterEvent::CountryChanged(Some(
            "Portugal".to_string(),
        ))]);
        let view = render(&dataset, &state).unwrap();
        let line_total: u64 = view.line_chart.points.iter().map(|p| p.streams).sum();
        let bar_total: u64 = view.bar_chart.bars.iter().map(|b| b.streams).sum();
        assert_eq!(line_total, bar_total);
        assert_eq!(view.bar_chart.title, "Portugal's top 10 artists<br> between Sep-2019 and Nov-2019");
    }

    #[test]
    fn render_highlights_pinned_song() {
        let (dataset, state) = state_for(vec![
            FilterEvent::CountryChanged(Some("Portugal".to_string())),
            FilterEvent::ArtistChanged(Some("Pitbull".to_string())),
            FilterEvent::SongChanged(Some("T2".to_string())),
        ]);
        let view = render(&dataset, &state).unwrap();
        assert_eq!(view.bar_chart.kind, RankedKind::Tracks);
        let colors: Vec<(&str, &str)> = view
            .bar_chart
            .bars
            .iter()
            .map(|b| (b.label.as_str(), b.color))
            .collect();
        assert_eq!(colors, vec![("T1", BAR_COLOR), ("T2", HIGHLIGHT_COLOR)]);
        assert_eq!(
            view.bar_chart.title,
            "Pitbull's song streams in Portugal<br> between Sep-2019 and Nov-2019"
        );
        assert_eq!(view.line_chart.points.len(), 2);
    }

    #[test]
    fn render_single_pinned_track_fully_highlighted() {
        let (dataset, state) = state_for(vec![
            FilterEvent::CountryChanged(Some("Portugal".to_string())),
            FilterEvent::ArtistChanged(Some("Imagine Dragons".to_string())),
        ]);
        let view = render(&dataset, &state).unwrap();
        assert_eq!(view.bar_chart.bars.len(), 1);
        assert_eq!(view.bar_chart.bars[0].color, HIGHLIGHT_COLOR);
        assert_eq!(
            view.line_chart.title,
            "Streams of \"T3\"<br> by Imagine Dragons in Portugal<br> between Sep-2019 and Nov-2019"
        );
    }

    #[test]
    fn slider_labels_hidden_without_country() {
        let (dataset, state) = state_for(vec![FilterEvent::CountryChanged(None)]);
        let view = render(&dataset, &state).unwrap();
        assert!(!view.date_control.visible);
        assert!(view.date_control.marks.iter().all(|m| !m.label_visible));

        let (dataset, state) = state_for(vec![]);
        let view = render(&dataset, &state).unwrap();
        let visible: Vec<usize> = view
            .date_control
            .marks
            .iter()
            .filter(|m| m.label_visible)
            .map(|m| m.index)
            .collect();
        assert_eq!(visible, vec![0]);
    }

    #[test]
    fn long_labels_widen_bar_margin() {
        let ranked = RankedResult {
            kind: RankedKind::Artists,
            entries: vec![RankedEntry {
                label: "x".repeat(51),
                streams: 1,
            }],
        };
        let bars = bars(&ranked, None);
        assert_eq!(bar_left_margin(&bars), 225);
    }

    #[test]
    fn view_serializes_to_json() {
        let (dataset, state) = state_for(vec![]);
        let view = render(&dataset, &state).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["bar_chart"]["kind"], "artists");
        assert_eq!(json["line_chart"]["color"], LINE_COLOR);
    }
}
