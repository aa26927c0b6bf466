//! Chart titles, captions and the margins that depend on them.

use mt_charts::GLOBAL_COUNTRY;
use mt_db::TOP_ARTISTS;
use mt_utils::text::{possessive, with_definite_article, wrap_label};

/// Line-break token understood by the chart renderer.
pub const LINE_BREAK: &str = "<br>";

/// Top margin of the line chart for a one-, two- or three-line song label.
const LINE_TOP_MARGINS: [u32; 3] = [60, 85, 100];

/// The selected date range as bucket labels ("Sep-2019").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period<'a> {
    pub start: &'a str,
    pub end: &'a str,
}

fn period_suffix(period: Option<Period<'_>>) -> String {
    match period {
        Some(p) => format!("{} between {} and {}", LINE_BREAK, p.start, p.end),
        None => String::new(),
    }
}

/// "the world" for the Global selection, the country otherwise.
fn place(country: &str) -> &str {
    if country == GLOBAL_COUNTRY {
        "the world"
    } else {
        country
    }
}

/// Caption under the date slider.
pub fn date_caption(period: Period<'_>) -> String {
    format!("From {} to {}", period.start, period.end)
}

/// Line chart title and its top margin.
///
/// A pinned song's label is wrapped when long, which pushes the plot down.
pub fn line_title(
    country: &str,
    artist: Option<&str>,
    song: Option<&str>,
    period: Option<Period<'_>>,
) -> (String, u32) {
    let suffix = period_suffix(period);
    let place = place(country);
    match (artist, song) {
        (Some(artist), Some(song)) => {
            let (song, lines) = wrap_label(song, LINE_BREAK);
            let top = LINE_TOP_MARGINS[lines.clamp(1, 3) - 1];
            (
                format!(
                    "Streams of \"{}\"{} by {} in {}{}",
                    song, LINE_BREAK, artist, place, suffix
                ),
                top,
            )
        }
        (Some(artist), None) => (
            format!("Streams of {} in {}{}", artist, place, suffix),
            LINE_TOP_MARGINS[0],
        ),
        _ => (format!("Streams in {}{}", place, suffix), LINE_TOP_MARGINS[0]),
    }
}

/// Map title. The map always covers every country.
pub fn map_title(artist: Option<&str>, song: Option<&str>, period: Option<Period<'_>>) -> String {
    let suffix = period_suffix(period);
    match (artist, song) {
        (Some(artist), Some(song)) => format!(
            "Global streams of{br}\"{}\"{br} by {}{}",
            song,
            artist,
            suffix.trim_start_matches(LINE_BREAK),
            br = LINE_BREAK
        ),
        (Some(artist), None) => format!("Global streams of {}{}", artist, suffix),
        _ => format!("Global streams of all songs{}", suffix),
    }
}

/// Ranked bar chart title.
pub fn bar_title(country: &str, artist: Option<&str>, period: Option<Period<'_>>) -> String {
    let suffix = period_suffix(period);
    match artist {
        None if country == GLOBAL_COUNTRY => {
            format!("Top {} artists in the world{}", TOP_ARTISTS, suffix)
        }
        None => format!("{} top {} artists{}", possessive(country), TOP_ARTISTS, suffix),
        Some(artist) => {
            let place = if country == GLOBAL_COUNTRY {
                "the world".to_string()
            } else {
                with_definite_article(country)
            };
            format!("{} song streams in {}{}", possessive(artist), place, suffix)
        }
    }
}
