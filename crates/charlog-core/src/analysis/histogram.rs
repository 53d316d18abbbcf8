use super::config::PERCENT_DECIMALS;
use serde::Serialize;
use std::collections::HashMap;

/// Categorical counts with their share of the contributing records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Histogram {
    /// Records that contributed a value to this table
    pub total: usize,
    pub buckets: Vec<HistogramBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

impl Histogram {
    /// Build a histogram from counts in display order
    pub fn from_counts(counts: Vec<(String, usize)>) -> Self {
        let total = counts.iter().map(|(_, count)| count).sum();
        let buckets = counts
            .into_iter()
            .map(|(label, count)| HistogramBucket {
                label,
                count,
                percentage: percentage(count, total),
            })
            .collect();

        Self { total, buckets }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&HistogramBucket> {
        self.buckets.iter().find(|b| b.label == label)
    }
}

/// `count / total * 100`, rounded to [`PERCENT_DECIMALS`] places
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let scale = 10f64.powi(PERCENT_DECIMALS);
    (count as f64 / total as f64 * 100.0 * scale).round() / scale
}

/// Counter that remembers the order keys were first seen in
#[derive(Debug, Default)]
pub(crate) struct Tally {
    index: HashMap<String, usize>,
    counts: Vec<(String, usize)>,
}

impl Tally {
    pub fn add(&mut self, key: &str) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: &str, n: usize) {
        match self.index.get(key) {
            Some(&i) => self.counts[i].1 += n,
            None => {
                self.index.insert(key.to_string(), self.counts.len());
                self.counts.push((key.to_string(), n));
            }
        }
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Counts sorted descending; the sort is stable so ties keep first-seen order
    pub fn by_count_desc(self) -> Vec<(String, usize)> {
        let mut counts = self.counts;
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }
}
