use crate::{Error, Result};
use serde::Serialize;
use std::str::FromStr;

/// Number of hosts kept in the host ranking unless configured otherwise
pub const DEFAULT_TOP_HOSTS: usize = 10;

/// Upper bounds (ms) of the default duration buckets:
/// `0-100ms`, `100-500ms`, `500ms-1s`, `1s-5s`, `>5s`
pub const DEFAULT_DURATION_BOUNDS_MS: [f64; 4] = [100.0, 500.0, 1000.0, 5000.0];

/// Percentages are rounded half away from zero to this many decimal places
pub const PERCENT_DECIMALS: i32 = 1;

/// How status codes are grouped in the status histogram
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusGrouping {
    /// One bucket per code (`200`, `404`, ...)
    #[default]
    Exact,
    /// One bucket per class (`2xx`, `4xx`, ...)
    Class,
}

impl StatusGrouping {
    /// Sort key of the bucket a status code falls in
    pub fn bucket(&self, code: i64) -> i64 {
        match self {
            StatusGrouping::Exact => code,
            StatusGrouping::Class => code / 100,
        }
    }

    pub fn label(&self, bucket: i64) -> String {
        match self {
            StatusGrouping::Exact => bucket.to_string(),
            StatusGrouping::Class => format!("{}xx", bucket),
        }
    }
}

/// Right-inclusive duration buckets defined by their upper bounds
///
/// With bounds `[b0, b1, ..., bn]` a value `v` falls in the first bucket
/// whose bound satisfies `v <= bi`; values above `bn` land in a final
/// open-ended bucket. The first bucket starts at zero inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationBuckets {
    bounds: Vec<f64>,
}

impl DurationBuckets {
    pub fn new(bounds: Vec<f64>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one duration bucket bound is required".to_string(),
            ));
        }
        if let Some(bad) = bounds.iter().find(|b| !b.is_finite() || **b <= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "duration bucket bound {} must be a positive number",
                bad
            )));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidConfig(
                "duration bucket bounds must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { bounds })
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Number of buckets, the open-ended one included
    pub fn len(&self) -> usize {
        self.bounds.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Bucket index for a non-negative duration
    pub fn index_of(&self, duration_ms: f64) -> usize {
        self.bounds
            .iter()
            .position(|bound| duration_ms <= *bound)
            .unwrap_or(self.bounds.len())
    }

    /// Lower and (optional) upper bound of a bucket
    pub fn range(&self, index: usize) -> (f64, Option<f64>) {
        let lower = if index == 0 {
            0.0
        } else {
            self.bounds[index - 1]
        };
        (lower, self.bounds.get(index).copied())
    }

    pub fn label(&self, index: usize) -> String {
        match self.range(index) {
            (lower, Some(upper)) if upper < 1000.0 => {
                format!("{}-{}ms", format_number(lower), format_number(upper))
            }
            (lower, Some(upper)) => format!("{}-{}", format_ms(lower), format_ms(upper)),
            (lower, None) => format!(">{}", format_ms(lower)),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        (0..self.len()).map(|i| self.label(i)).collect()
    }

    /// Find the bucket with the given label (case-insensitive)
    pub fn position(&self, label: &str) -> Option<usize> {
        let wanted = label.trim().to_lowercase();
        (0..self.len()).find(|i| self.label(*i).to_lowercase() == wanted)
    }
}

impl Default for DurationBuckets {
    fn default() -> Self {
        Self {
            bounds: DEFAULT_DURATION_BOUNDS_MS.to_vec(),
        }
    }
}

impl FromStr for DurationBuckets {
    type Err = Error;

    /// Parse a comma-separated list of bounds in milliseconds, e.g. `100,500,1000`
    fn from_str(s: &str) -> Result<Self> {
        let bounds = s
            .split(',')
            .map(|part| {
                part.trim().parse::<f64>().map_err(|_| {
                    Error::InvalidConfig(format!("invalid duration bucket bound: {}", part))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(bounds)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

fn format_ms(value: f64) -> String {
    if value >= 1000.0 {
        format!("{}s", format_number(value / 1000.0))
    } else {
        format!("{}ms", format_number(value))
    }
}

/// Tunables of the transaction aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    pub top_hosts: usize,
    pub duration_buckets: DurationBuckets,
    pub status_grouping: StatusGrouping,
}

impl AggregatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_hosts(mut self, top_hosts: usize) -> Result<Self> {
        if top_hosts == 0 {
            return Err(Error::InvalidConfig(
                "host ranking size must be at least 1".to_string(),
            ));
        }
        self.top_hosts = top_hosts;
        Ok(self)
    }

    pub fn with_duration_buckets(mut self, buckets: DurationBuckets) -> Self {
        self.duration_buckets = buckets;
        self
    }

    pub fn with_status_grouping(mut self, grouping: StatusGrouping) -> Self {
        self.status_grouping = grouping;
        self
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            top_hosts: DEFAULT_TOP_HOSTS,
            duration_buckets: DurationBuckets::default(),
            status_grouping: StatusGrouping::default(),
        }
    }
}
