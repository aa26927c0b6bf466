use anyhow::Context;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;

/// Public country reference table carrying a `country` and an `iso_alpha` column.
pub const COUNTRY_CODES_URL: &str =
    "https://raw.githubusercontent.com/plotly/datasets/master/gapminder_with_codes.csv";

/// A country display name and its ISO 3166-1 alpha-3 code.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CountryCode {
    pub country: String,
    pub iso_alpha: String,
}

impl CountryCode {
    /// Parse the country-code reference CSV (with headers).
    ///
    /// Only the `country` and `iso_alpha` columns are read; the table may
    /// carry others and may repeat a country once per year. Rows missing
    /// either value are skipped.
    pub fn parse_country_code_csv<R: Read>(reader: R) -> anyhow::Result<Vec<CountryCode>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let country_idx = headers
            .iter()
            .position(|h| h.trim() == "country")
            .context("country-code CSV has no \"country\" column")?;
        let iso_idx = headers
            .iter()
            .position(|h| h.trim() == "iso_alpha")
            .context("country-code CSV has no \"iso_alpha\" column")?;

        let mut codes = Vec::new();
        for row in rdr.records() {
            let record = row?;
            let country = record.get(country_idx).unwrap_or("").trim();
            let iso_alpha = record.get(iso_idx).unwrap_or("").trim();
            if country.is_empty() || iso_alpha.is_empty() {
                continue;
            }
            codes.push(CountryCode {
                country: country.to_string(),
                iso_alpha: iso_alpha.to_string(),
            });
        }
        Ok(codes)
    }

    /// Build a country -> ISO code lookup. When a country appears more
    /// than once, the first row wins.
    pub fn lookup(codes: &[CountryCode]) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for code in codes {
            map.entry(code.country.clone())
                .or_insert_with(|| code.iso_alpha.clone());
        }
        map
    }

    /// Download the country-code reference CSV.
    #[cfg(feature = "api")]
    pub async fn fetch_country_code_csv(url: &str) -> anyhow::Result<String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        log::info!("Fetching country codes from {}", url);
        let response = client
            .get(url)
            .send()
            .await
            .with_context(|| format!("country-code source {} is unreachable", url))?;
        if !response.status().is_success() {
            anyhow::bail!("country-code source {} answered {}", url, response.status());
        }
        let body = response.text().await?;
        log::info!("Fetched {} bytes of country codes", body.len());
        Ok(body)
    }
}
