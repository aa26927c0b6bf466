//! Command implementations for the Music Trends CLI.
//!
//! Every command except `fetch-codes` loads the chart data first, then
//! works against the in-memory dataset and prints JSON to stdout.

use clap::Subcommand;
use mt_charts::country_code::COUNTRY_CODES_URL;

pub mod dashboard;
pub mod sources;

pub use sources::DataSources;

#[derive(Subcommand)]
pub enum Command {
    /// Print the filter options (countries, date marks, artists)
    Options {
        #[command(flatten)]
        sources: DataSources,

        /// Country whose date marks and artists to list
        #[arg(long)]
        country: Option<String>,
    },

    /// Resolve one filter selection and print the chart views
    Render {
        #[command(flatten)]
        sources: DataSources,

        /// Country, or "Global" for every country
        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        artist: Option<String>,

        /// Song title; needs --artist
        #[arg(long)]
        song: Option<String>,

        /// First month, YYYY-MM
        #[arg(long)]
        from: Option<String>,

        /// Last month, YYYY-MM
        #[arg(long)]
        to: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Apply a JSON-lines stream of filter events and print the view after each
    Replay {
        #[command(flatten)]
        sources: DataSources,

        /// Events file, or "-" for stdin
        #[arg(short = 'e', long, default_value = "-")]
        events: String,
    },

    /// Download the country-code reference table for offline use
    FetchCodes {
        /// Output path for the country-code CSV
        #[arg(short = 'o', long)]
        output: String,

        #[arg(long, default_value = COUNTRY_CODES_URL)]
        url: String,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Options { sources, country } => {
            let dataset = sources.load().await?;
            dashboard::run_options(&dataset, country)
        }
        Command::Render {
            sources,
            country,
            artist,
            song,
            from,
            to,
            pretty,
        } => {
            let dataset = sources.load().await?;
            let filters = dashboard::RenderFilters {
                country,
                artist,
                song,
                from,
                to,
            };
            dashboard::run_render(&dataset, &filters, pretty)
        }
        Command::Replay { sources, events } => {
            let dataset = sources.load().await?;
            dashboard::run_replay(&dataset, &events)
        }
        Command::FetchCodes { output, url } => sources::fetch_codes(&url, &output).await,
    }
}
