//! Shared utility functions for Music Trends crates.

/// Month-year token and calendar date helpers
pub mod dates {
    use crate::error::MonthYearError;
    use chrono::NaiveDate;

    /// Month abbreviations used for time-bucket labels, January first.
    pub const MONTH_ABBREVIATIONS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Split a "YYYY-MM" token into its year and 1-based month.
    pub fn parse_month_year(token: &str) -> Result<(i32, u32), MonthYearError> {
        let token = token.trim();
        let (year, month) = token
            .split_once('-')
            .ok_or_else(|| MonthYearError(format!("missing '-' in {:?}", token)))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(MonthYearError(format!("expected YYYY-MM, got {:?}", token)));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| MonthYearError(format!("bad year in {:?}", token)))?;
        let month: u32 = month
            .parse()
            .map_err(|_| MonthYearError(format!("bad month in {:?}", token)))?;
        if !(1..=12).contains(&month) {
            return Err(MonthYearError(format!("month out of range in {:?}", token)));
        }
        Ok((year, month))
    }

    /// Render a "YYYY-MM" token as "Mon-YYYY", e.g. "2019-09" -> "Sep-2019".
    pub fn month_year_label(token: &str) -> Result<String, MonthYearError> {
        let (year, month) = parse_month_year(token)?;
        Ok(format!("{}-{}", MONTH_ABBREVIATIONS[(month - 1) as usize], year))
    }

}

/// Title text helpers
pub mod text {
    /// Possessive form of a name: a bare apostrophe after a trailing
    /// "s", "z" or "ch", otherwise "'s".
    pub fn possessive(name: &str) -> String {
        if name.ends_with('s') || name.ends_with('z') || name.ends_with("ch") {
            format!("{}'", name)
        } else {
            format!("{}'s", name)
        }
    }

    /// Prefix "the " to country names that read that way in English
    /// ("the Netherlands", "the United Kingdom", "the Czech Republic").
    pub fn with_definite_article(country: &str) -> String {
        if country.ends_with('s') || country == "United Kingdom" || country.contains("Republic") {
            format!("the {}", country)
        } else {
            country.to_string()
        }
    }

    /// Index of the blank whose distance to `len * num / den` is smallest.
    /// Ties go to the earlier blank.
    fn nearest_blank(blanks: &[usize], len: usize, num: usize, den: usize) -> Option<usize> {
        blanks
            .iter()
            .copied()
            .min_by_key(|&i| (i * den).abs_diff(len * num))
    }

    /// Break a long label into lines at blanks, replacing each chosen blank
    /// with `line_break`.
    ///
    /// Labels over 70 characters are split near their thirds, labels over 35
    /// near their midpoint. Returns the label and the number of lines.
    pub fn wrap_label(label: &str, line_break: &str) -> (String, usize) {
        let chars: Vec<char> = label.chars().collect();
        let len = chars.len();
        let blanks: Vec<usize> = chars
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == ' ')
            .map(|(i, _)| i)
            .collect();
        let slice = |from: usize, to: usize| -> String {
            if from >= to {
                String::new()
            } else {
                chars[from..to].iter().collect()
            }
        };

        if len > 70 {
            if let (Some(first), Some(second)) = (
                nearest_blank(&blanks, len, 1, 3),
                nearest_blank(&blanks, len, 2, 3),
            ) {
                let wrapped = format!(
                    "{}{}{}{}{}",
                    slice(0, first),
                    line_break,
                    slice(first + 1, second),
                    line_break,
                    slice(second + 1, len)
                );
                return (wrapped, 3);
            }
        } else if len > 35 {
            if let Some(middle) = nearest_blank(&blanks, len, 1, 2) {
                let wrapped = format!(
                    "{}{}{}",
                    slice(0, middle),
                    line_break,
                    slice(middle + 1, len)
                );
                return (wrapped, 2);
            }
        }
        (label.to_string(), 1)
    }

}

/// Error types
pub mod error {
    use std::fmt;

    /// A month-year token that is not of the form "YYYY-MM".
    #[derive(Debug)]
    pub struct MonthYearError(pub String);

    impl fmt::Display for MonthYearError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Month-year error: {}", self.0)
        }
    }

    impl std::error::Error for MonthYearError {}
}
