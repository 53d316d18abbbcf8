use super::config::DurationBuckets;
use super::histogram::percentage;
use serde::Serialize;

/// Summary over the records that carry a valid duration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    /// Number of timed records; unknown for summary files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<usize>,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
}

impl DurationStats {
    /// Returns `None` when there are no samples, so that "no timing data"
    /// is never reported as zeros
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let total: f64 = samples.iter().sum();
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        let median = if sorted.len().is_multiple_of(2) {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            samples: Some(samples.len()),
            min,
            mean: total / samples.len() as f64,
            max,
            total,
            median: Some(median),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationBucketCount {
    pub label: String,
    pub lower_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_ms: Option<f64>,
    pub count: usize,
    pub percentage: f64,
}

/// Histogram of durations over the configured buckets, empty buckets included
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationDistribution {
    pub total: usize,
    pub buckets: Vec<DurationBucketCount>,
}

impl DurationDistribution {
    pub fn from_samples(samples: &[f64], buckets: &DurationBuckets) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut counts = vec![0usize; buckets.len()];
        for sample in samples {
            counts[buckets.index_of(*sample)] += 1;
        }

        let total = samples.len();
        let buckets = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| {
                let (lower_ms, upper_ms) = buckets.range(i);
                DurationBucketCount {
                    label: buckets.label(i),
                    lower_ms,
                    upper_ms,
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect();

        Some(Self { total, buckets })
    }
}
