use mt_utils::dates::month_year_label;
use mt_utils::error::MonthYearError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// An inclusive range of time-bucket ordinals, `start <= end`.
#[derive(Clone, Eq, PartialEq, Copy, Debug, Hash, Serialize, Deserialize)]
pub struct BucketRange {
    pub start: usize,
    pub end: usize,
}

impl BucketRange {
    /// Build a range from two bounds given in either order.
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }
}

/// A month-year time bucket with its ordinal and display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub index: usize,
    /// "YYYY-MM"
    pub key: String,
    /// "Mon-YYYY"
    pub label: String,
}

/// The sorted distinct month-year tokens of a dataset and their ordinals.
///
/// Built once at load time; ordinals never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeBuckets {
    buckets: Vec<TimeBucket>,
    index_by_key: HashMap<String, usize>,
}

impl TimeBuckets {
    /// Sort and deduplicate `keys` chronologically and number them from 0.
    pub fn from_keys<I, S>(keys: I) -> Result<Self, MonthYearError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // "YYYY-MM" sorts chronologically as a string
        let distinct: BTreeSet<String> = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .collect();

        let mut buckets = Vec::with_capacity(distinct.len());
        let mut index_by_key = HashMap::with_capacity(distinct.len());
        for (index, key) in distinct.into_iter().enumerate() {
            let label = month_year_label(&key)?;
            index_by_key.insert(key.clone(), index);
            buckets.push(TimeBucket { index, key, label });
        }
        Ok(Self {
            buckets,
            index_by_key,
        })
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index_by_key.get(key).copied()
    }

    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.buckets.get(index).map(|b| b.label.as_str())
    }

    /// Range spanning every bucket, or None when there are none.
    pub fn full_range(&self) -> Option<BucketRange> {
        if self.buckets.is_empty() {
            None
        } else {
            Some(BucketRange::new(0, self.buckets.len() - 1))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeBucket> {
        self.buckets.iter()
    }
}
