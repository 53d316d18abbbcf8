mod aggregator;
mod config;
mod duration;
mod histogram;
mod hosts;

pub use aggregator::Aggregator;
pub use config::{
    AggregatorConfig, DEFAULT_DURATION_BOUNDS_MS, DEFAULT_TOP_HOSTS, DurationBuckets,
    PERCENT_DECIMALS, StatusGrouping,
};
pub use duration::{DurationBucketCount, DurationDistribution, DurationStats};
pub use histogram::{Histogram, HistogramBucket, percentage};
pub use hosts::{HostCount, HostRanking, HostStatusMatrix};

use crate::record::{RecordIssue, RecordSet};
use serde::Serialize;

/// Every table the dashboard renders, derived from one record set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficSummary {
    /// Entries in the input, rejected ones included
    pub total_records: usize,
    pub status_codes: Histogram,
    pub methods: Histogram,
    pub hosts: HostRanking,
    /// Absent when no record carries a valid duration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub durations: Option<DurationStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_distribution: Option<DurationDistribution>,
    pub host_status: HostStatusMatrix,
    pub diagnostics: Diagnostics,
}

/// Records skipped in whole or in part, for troubleshooting parser output
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub invalid_records: usize,
    pub issues: Vec<RecordIssue>,
}

pub trait Analyzer {
    type Output;

    fn analyze(&self, records: &RecordSet) -> crate::Result<Self::Output>;
}
