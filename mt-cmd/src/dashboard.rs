//! Dashboard commands: list options, render one selection, replay events.

use anyhow::Context;
use log::info;
use mt_charts::time_bucket::TimeBucket;
use mt_dashboard::state::FilterOptions;
use mt_dashboard::{render, resolve, DashboardState, FilterEvent};
use mt_db::Dataset;
use mt_utils::dates::parse_month_year;
use serde::Serialize;
use std::io::{BufRead, BufReader, Write};

/// Filters given on the command line for `render`.
#[derive(Debug, Default, Clone)]
pub struct RenderFilters {
    pub country: Option<String>,
    pub artist: Option<String>,
    pub song: Option<String>,
    /// Month-year token, "YYYY-MM".
    pub from: Option<String>,
    pub to: Option<String>,
}

fn bucket_of(dataset: &Dataset, token: &str) -> anyhow::Result<usize> {
    parse_month_year(token)?;
    dataset
        .buckets()
        .index_of(token)
        .with_context(|| format!("no chart data for month {}", token))
}

/// The events a user would produce to reach `filters`, in control order.
pub fn events_for(dataset: &Dataset, filters: &RenderFilters) -> anyhow::Result<Vec<FilterEvent>> {
    let mut events = Vec::new();
    if let Some(country) = &filters.country {
        events.push(FilterEvent::CountryChanged(Some(country.clone())));
    }
    if filters.from.is_some() || filters.to.is_some() {
        let full = dataset
            .full_range()
            .context("the dataset has no months to select")?;
        let start = match &filters.from {
            Some(token) => bucket_of(dataset, token)?,
            None => full.start,
        };
        let end = match &filters.to {
            Some(token) => bucket_of(dataset, token)?,
            None => full.end,
        };
        events.push(FilterEvent::DateRangeChanged { start, end });
    }
    if let Some(artist) = &filters.artist {
        events.push(FilterEvent::ArtistChanged(Some(artist.clone())));
    }
    if let Some(song) = &filters.song {
        events.push(FilterEvent::SongChanged(Some(song.clone())));
    }
    Ok(events)
}

/// Parse a JSON-lines event stream, skipping blank lines.
pub fn parse_events<R: BufRead>(reader: R) -> anyhow::Result<Vec<FilterEvent>> {
    let mut events = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line)
            .with_context(|| format!("invalid event on line {}", number + 1))?;
        events.push(event);
    }
    Ok(events)
}

fn write_json<T: Serialize, W: Write>(out: &mut W, value: &T, pretty: bool) -> anyhow::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Option lists together with the month each date mark stands for.
#[derive(Serialize)]
struct OptionsReport<'a> {
    options: &'a FilterOptions,
    months: Vec<&'a TimeBucket>,
}

/// Print the option lists offered for `country`.
pub fn run_options(dataset: &Dataset, country: Option<String>) -> anyhow::Result<()> {
    let mut state = DashboardState::initial(dataset)?;
    if country.is_some() {
        state = resolve(dataset, &state, FilterEvent::CountryChanged(country))?;
    }
    let report = OptionsReport {
        options: &state.options,
        months: dataset.buckets().iter().collect(),
    };
    write_json(&mut std::io::stdout().lock(), &report, true)
}

/// Print the dashboard view for one selection.
pub fn run_render(dataset: &Dataset, filters: &RenderFilters, pretty: bool) -> anyhow::Result<()> {
    let mut state = DashboardState::initial(dataset)?;
    for event in events_for(dataset, filters)? {
        state = resolve(dataset, &state, event)?;
    }
    if state.show_empty_notice {
        log::warn!("The selection matches no data");
    }
    let view = render(dataset, &state)?;
    write_json(&mut std::io::stdout().lock(), &view, pretty)
}

/// Apply each event of `events_path` (`-` for stdin) in order and print
/// the view after every step, one JSON document per line.
pub fn run_replay(dataset: &Dataset, events_path: &str) -> anyhow::Result<()> {
    let events = if events_path == "-" {
        parse_events(std::io::stdin().lock())?
    } else {
        let file = std::fs::File::open(events_path)
            .with_context(|| format!("cannot open {}", events_path))?;
        parse_events(BufReader::new(file))?
    };
    info!("Replaying {} events from {}", events.len(), events_path);

    let mut out = std::io::stdout().lock();
    let mut state = DashboardState::initial(dataset)?;
    write_json(&mut out, &render(dataset, &state)?, false)?;
    for event in events {
        state = resolve(dataset, &state, event)?;
        write_json(&mut out, &render(dataset, &state)?, false)?;
    }
    Ok(())
}
