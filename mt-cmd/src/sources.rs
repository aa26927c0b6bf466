//! Input files and the country-code table.

use anyhow::Context;
use clap::Args;
use flate2::read::GzDecoder;
use log::info;
use mt_charts::country_code::{CountryCode, COUNTRY_CODES_URL};
use mt_db::Dataset;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Where the chart data and the country codes come from.
#[derive(Args, Debug, Clone)]
pub struct DataSources {
    /// Monthly chart CSV (`.csv` or `.csv.gz`)
    #[arg(short = 'd', long)]
    pub data: String,

    /// Local country-code CSV; fetched from --codes-url when absent
    #[arg(short = 'c', long)]
    pub codes: Option<String>,

    /// URL of the country-code reference table
    #[arg(long, default_value = COUNTRY_CODES_URL)]
    pub codes_url: String,
}

/// Wrap `inner` in a gzip decoder when `name` ends in `.gz`.
pub fn decompressed<R: Read + 'static>(name: &str, inner: R) -> Box<dyn Read> {
    if name.ends_with(".gz") {
        Box::new(GzDecoder::new(inner))
    } else {
        Box::new(inner)
    }
}

/// Open a local source file for reading.
pub fn open_source(path: &str) -> anyhow::Result<Box<dyn Read>> {
    let file = File::open(Path::new(path)).with_context(|| format!("cannot open {}", path))?;
    Ok(decompressed(path, BufReader::new(file)))
}

impl DataSources {
    /// Read the country-code CSV, from disk when given, otherwise over HTTP.
    pub async fn country_codes(&self) -> anyhow::Result<Box<dyn Read>> {
        match &self.codes {
            Some(path) => open_source(path),
            None => {
                let body = CountryCode::fetch_country_code_csv(&self.codes_url).await?;
                Ok(Box::new(std::io::Cursor::new(body.into_bytes())))
            }
        }
    }

    /// Load the working dataset.
    pub async fn load(&self) -> anyhow::Result<Dataset> {
        let codes = self.country_codes().await?;
        let chart = open_source(&self.data)?;
        let dataset = Dataset::load(chart, codes)
            .with_context(|| format!("failed to load chart data from {}", self.data))?;
        let report = dataset.report();
        info!(
            "Loaded {} rows from {} ({} incomplete, {} single-month, {} world chart)",
            report.kept, self.data, report.incomplete, report.single_bucket, report.world_chart
        );
        Ok(dataset)
    }
}

/// Download the country-code table and save it as a local CSV.
pub async fn fetch_codes(url: &str, output: &str) -> anyhow::Result<()> {
    let body = CountryCode::fetch_country_code_csv(url).await?;
    // Refuse to save a table the loader could not use later.
    let codes = CountryCode::parse_country_code_csv(body.as_bytes())?;
    tokio::fs::write(output, &body)
        .await
        .with_context(|| format!("cannot write {}", output))?;
    info!("Saved {} country codes to {}", codes.len(), output);
    Ok(())
}
