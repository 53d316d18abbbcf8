mod host_matcher;

pub use host_matcher::HostPattern;

use crate::analysis::DurationBuckets;
use crate::record::{RecordSet, Transaction};

/// Filter criteria applied to records before aggregation
///
/// All filter conditions are combined with AND logic; host patterns are
/// OR-ed among themselves.
#[derive(Debug, Default)]
pub struct FilterCriteria {
    pub hosts: Vec<HostPattern>,
    /// HTTP status filter (e.g., "2xx", "404", "500-599")
    pub status: Option<StatusFilter>,
    /// HTTP method filter (case-insensitive)
    pub method: Option<String>,
    pub duration: Option<DurationFilter>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hosts(mut self, patterns: Vec<String>) -> crate::Result<Self> {
        for pattern in patterns {
            self.hosts.push(HostPattern::parse(&pattern)?);
        }
        Ok(self)
    }

    pub fn with_status(mut self, pattern: &str) -> crate::Result<Self> {
        self.status = Some(StatusFilter::parse(pattern)?);
        Ok(self)
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = Some(method.trim().to_uppercase());
        self
    }

    /// Keep only records whose duration falls in the bucket with this label
    pub fn with_duration_bucket(
        mut self,
        label: &str,
        buckets: &DurationBuckets,
    ) -> crate::Result<Self> {
        self.duration = Some(DurationFilter::parse(label, buckets)?);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
            && self.status.is_none()
            && self.method.is_none()
            && self.duration.is_none()
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.matches_host(tx)
            && self.matches_status(tx)
            && self.matches_method(tx)
            && self.matches_duration(tx)
    }

    fn matches_host(&self, tx: &Transaction) -> bool {
        self.hosts.is_empty() || self.hosts.iter().any(|pattern| pattern.matches(&tx.host))
    }

    fn matches_status(&self, tx: &Transaction) -> bool {
        match &self.status {
            None => true,
            Some(filter) => tx.status_code.is_some_and(|code| filter.matches(code)),
        }
    }

    fn matches_method(&self, tx: &Transaction) -> bool {
        match &self.method {
            None => true,
            Some(method) => tx.method.trim().to_uppercase() == *method,
        }
    }

    fn matches_duration(&self, tx: &Transaction) -> bool {
        match &self.duration {
            None => true,
            Some(filter) => tx.duration_ms.is_some_and(|d| filter.matches(d)),
        }
    }
}

/// Status filter for HTTP status codes
#[derive(Debug, Clone, PartialEq)]
pub enum StatusFilter {
    Exact(i64),
    /// Inclusive range (e.g., 200-299 for "2xx")
    Range(i64, i64),
}

impl StatusFilter {
    /// Parse a status filter pattern
    ///
    /// Supports:
    /// - Exact: "404", "200"
    /// - Class shorthand: "2xx", "4XX"
    /// - Explicit range: "200-299", "500-599"
    pub fn parse(pattern: &str) -> crate::Result<Self> {
        let pattern = pattern.trim();
        let lower = pattern.to_lowercase();

        if lower.len() == 3
            && let Some(class) = lower.strip_suffix("xx")
            && let Ok(digit) = class.parse::<i64>()
        {
            let start = digit * 100;
            return Ok(StatusFilter::Range(start, start + 99));
        }

        if let Some((start_str, end_str)) = pattern.split_once('-') {
            let start = start_str.trim().parse::<i64>().map_err(|_| {
                crate::Error::InvalidPattern(format!("Invalid status range start: {}", start_str))
            })?;
            let end = end_str.trim().parse::<i64>().map_err(|_| {
                crate::Error::InvalidPattern(format!("Invalid status range end: {}", end_str))
            })?;
            if start > end {
                return Err(crate::Error::InvalidPattern(format!(
                    "Status range {} is reversed",
                    pattern
                )));
            }
            return Ok(StatusFilter::Range(start, end));
        }

        let code = pattern.parse::<i64>().map_err(|_| {
            crate::Error::InvalidPattern(format!("Invalid status code: {}", pattern))
        })?;
        Ok(StatusFilter::Exact(code))
    }

    pub fn matches(&self, status: i64) -> bool {
        match self {
            StatusFilter::Exact(code) => status == *code,
            StatusFilter::Range(start, end) => (*start..=*end).contains(&status),
        }
    }
}

/// Matches durations that fall in one configured bucket
#[derive(Debug, Clone, PartialEq)]
pub struct DurationFilter {
    buckets: DurationBuckets,
    index: usize,
}

impl DurationFilter {
    pub fn parse(label: &str, buckets: &DurationBuckets) -> crate::Result<Self> {
        let index = buckets.position(label).ok_or_else(|| {
            crate::Error::InvalidPattern(format!(
                "Unknown duration bucket '{}' (expected one of: {})",
                label,
                buckets.labels().join(", ")
            ))
        })?;
        Ok(Self {
            buckets: buckets.clone(),
            index,
        })
    }

    pub fn matches(&self, duration_ms: f64) -> bool {
        duration_ms.is_finite()
            && duration_ms >= 0.0
            && self.buckets.index_of(duration_ms) == self.index
    }
}

/// Keep the transactions that match the criteria
///
/// Rejected entries never match anything and are not carried over, so the
/// result is a plain record set. An empty result is valid.
pub fn filter_records(set: &RecordSet, criteria: &FilterCriteria) -> RecordSet {
    let transactions: Vec<Transaction> = set
        .transactions
        .iter()
        .filter(|tx| criteria.matches(tx))
        .cloned()
        .collect();

    if transactions.is_empty() {
        tracing::warn!("No records matched the filter criteria");
    } else {
        tracing::debug!(
            "{} of {} records matched the filter criteria",
            transactions.len(),
            set.transactions.len()
        );
    }

    RecordSet::new(transactions)
}
