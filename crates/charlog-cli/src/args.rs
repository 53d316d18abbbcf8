use anyhow::{Context, Result};
use charlog_core::analysis::{AggregatorConfig, DEFAULT_TOP_HOSTS, DurationBuckets, StatusGrouping};
use charlog_core::filter::FilterCriteria;
use clap::Args;

/// Default `--buckets` value, matching the core defaults
pub const DEFAULT_BUCKETS: &str = "100,500,1000,5000";

/// Record filters shared by the commands that read entries
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Only keep hosts matching this pattern (exact or glob; repeatable or comma-separated)
    #[arg(long = "host", value_name = "PATTERN")]
    pub hosts: Vec<String>,

    /// Only keep this status (404, 4xx or 500-599)
    #[arg(long)]
    pub status: Option<String>,

    /// Only keep this HTTP method
    #[arg(long)]
    pub method: Option<String>,

    /// Only keep durations in this bucket (e.g. 100-500ms)
    #[arg(long, value_name = "BUCKET")]
    pub duration: Option<String>,

    /// Duration bucket upper bounds in milliseconds
    #[arg(long, value_name = "MS,MS,...", default_value = DEFAULT_BUCKETS)]
    pub buckets: String,
}

impl Default for FilterArgs {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            status: None,
            method: None,
            duration: None,
            buckets: DEFAULT_BUCKETS.to_string(),
        }
    }
}

impl FilterArgs {
    pub fn duration_buckets(&self) -> Result<DurationBuckets> {
        self.buckets
            .parse::<DurationBuckets>()
            .context("Invalid --buckets value")
    }

    pub fn criteria(&self) -> Result<FilterCriteria> {
        let host_patterns: Vec<String> = self
            .hosts
            .iter()
            .flat_map(|h| h.split(',').map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect();

        let mut criteria = FilterCriteria::new();

        if !host_patterns.is_empty() {
            criteria = criteria.with_hosts(host_patterns)?;
        }

        if let Some(status) = &self.status {
            criteria = criteria.with_status(status)?;
        }

        if let Some(method) = &self.method {
            criteria = criteria.with_method(method);
        }

        if let Some(bucket) = &self.duration {
            criteria = criteria.with_duration_bucket(bucket, &self.duration_buckets()?)?;
        }

        Ok(criteria)
    }
}

/// Tunables of the summary tables
#[derive(Args, Debug, Clone)]
pub struct AggregationArgs {
    /// Number of hosts in the host ranking
    #[arg(long, default_value_t = DEFAULT_TOP_HOSTS)]
    pub top: usize,

    /// Group status codes by class (2xx, 3xx, ...) instead of exact code
    #[arg(long)]
    pub status_classes: bool,
}

impl Default for AggregationArgs {
    fn default() -> Self {
        Self {
            top: DEFAULT_TOP_HOSTS,
            status_classes: false,
        }
    }
}

impl AggregationArgs {
    pub fn config(&self, filters: &FilterArgs) -> Result<AggregatorConfig> {
        let grouping = if self.status_classes {
            StatusGrouping::Class
        } else {
            StatusGrouping::Exact
        };

        Ok(AggregatorConfig::new()
            .with_top_hosts(self.top)?
            .with_duration_buckets(filters.duration_buckets()?)
            .with_status_grouping(grouping))
    }
}
