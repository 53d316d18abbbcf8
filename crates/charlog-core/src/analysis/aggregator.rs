use super::config::AggregatorConfig;
use super::duration::{DurationDistribution, DurationStats};
use super::histogram::{Histogram, Tally};
use super::hosts::{HostRanking, HostStatusMatrix};
use super::{Analyzer, Diagnostics, TrafficSummary};
use crate::Result;
use crate::record::{
    IssueKind, PrecomputedSummary, PrecomputedTiming, RecordIssue, RecordSet, Transaction,
};
use std::collections::{BTreeMap, HashMap};

const STATUS_RANGE: std::ops::RangeInclusive<i64> = 100..=599;

/// Derives every summary table from a full set of transactions
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Aggregate a plain slice; issue indices are positions in the slice
    pub fn aggregate(&self, transactions: &[Transaction]) -> TrafficSummary {
        self.aggregate_indexed(
            transactions.iter().enumerate(),
            transactions.len(),
            &[],
        )
    }

    /// Aggregate the transactions accepted by `keep`
    ///
    /// Issue indices stay positions in the log file. Entries rejected at
    /// decode time cannot be judged by `keep`, so they remain in the totals
    /// and diagnostics of every selection.
    pub fn analyze_matching(
        &self,
        records: &RecordSet,
        keep: impl Fn(&Transaction) -> bool,
    ) -> TrafficSummary {
        let selected: Vec<_> = records
            .input_positions()
            .filter(|(_, tx)| keep(tx))
            .collect();
        tracing::debug!(
            "{} of {} transactions selected",
            selected.len(),
            records.transactions.len()
        );

        let input_len = selected.len() + records.rejected.len();
        self.aggregate_indexed(selected.into_iter(), input_len, &records.rejected)
    }

    fn aggregate_indexed<'a>(
        &self,
        records: impl Iterator<Item = (usize, &'a Transaction)>,
        input_len: usize,
        rejected: &[RecordIssue],
    ) -> TrafficSummary {
        tracing::debug!("Aggregating {} records", input_len);

        if input_len == 0 {
            tracing::warn!("No records to aggregate; all tables will be empty");
        }

        let grouping = self.config.status_grouping;
        let mut statuses: BTreeMap<i64, usize> = BTreeMap::new();
        let mut methods = Tally::default();
        let mut hosts = Tally::default();
        let mut host_statuses: HashMap<String, BTreeMap<i64, usize>> = HashMap::new();
        let mut durations = Vec::new();
        let mut issues: Vec<RecordIssue> = rejected.to_vec();
        let mut invalid_records = rejected.len();

        for (index, tx) in records {
            let mut record_issues = Vec::new();

            let host = tx.host.trim();
            if host.is_empty() {
                record_issues.push(IssueKind::BlankHost);
            } else {
                hosts.add(host);
            }

            let method = tx.method.trim();
            if method.is_empty() {
                record_issues.push(IssueKind::BlankMethod);
            } else {
                methods.add(method);
            }

            if let Some(code) = tx.status_code {
                if STATUS_RANGE.contains(&code) {
                    let bucket = grouping.bucket(code);
                    *statuses.entry(bucket).or_default() += 1;
                    if !host.is_empty() {
                        *host_statuses
                            .entry(host.to_string())
                            .or_default()
                            .entry(bucket)
                            .or_default() += 1;
                    }
                } else {
                    record_issues.push(IssueKind::StatusOutOfRange(code));
                }
            }

            if let Some(duration) = tx.duration_ms {
                if !duration.is_finite() {
                    record_issues.push(IssueKind::NonFiniteDuration);
                } else if duration < 0.0 {
                    record_issues.push(IssueKind::NegativeDuration(duration));
                } else {
                    durations.push(duration);
                }
            }

            if !record_issues.is_empty() {
                invalid_records += 1;
                for kind in record_issues {
                    tracing::debug!("Record {}: {}", index, kind);
                    issues.push(RecordIssue::new(index, kind));
                }
            }
        }

        issues.sort_by_key(|issue| issue.index);

        let status_codes = Histogram::from_counts(
            statuses
                .into_iter()
                .map(|(bucket, count)| (grouping.label(bucket), count))
                .collect(),
        );
        let methods = Histogram::from_counts(methods.by_count_desc());
        let hosts = HostRanking::from_sorted(hosts.by_count_desc(), self.config.top_hosts);
        let host_status =
            HostStatusMatrix::build(&hosts, &host_statuses, |bucket| grouping.label(bucket));

        let duration_stats = DurationStats::from_samples(&durations);
        let duration_distribution =
            DurationDistribution::from_samples(&durations, &self.config.duration_buckets);

        if invalid_records > 0 {
            tracing::warn!(
                "{} of {} records had invalid fields and were partly skipped",
                invalid_records,
                input_len
            );
        }

        tracing::info!(
            "Aggregation complete: {} records, {} hosts, {} timed",
            input_len,
            hosts.distinct_hosts,
            durations.len()
        );

        TrafficSummary {
            total_records: input_len,
            status_codes,
            methods,
            hosts,
            durations: duration_stats,
            duration_distribution,
            host_status,
            diagnostics: Diagnostics {
                invalid_records,
                issues,
            },
        }
    }

    /// Build the summary tables from counts the log parser already aggregated
    ///
    /// Summary files carry no per-record data, so the duration distribution
    /// and the host/status matrix are left empty.
    pub fn summarize_precomputed(&self, summary: &PrecomputedSummary) -> TrafficSummary {
        tracing::debug!("Summarizing precomputed log counts");

        let grouping = self.config.status_grouping;
        let mut statuses: BTreeMap<i64, usize> = BTreeMap::new();
        for (label, count) in &summary.status_codes {
            match label.trim().parse::<i64>() {
                Ok(code) if STATUS_RANGE.contains(&code) => {
                    *statuses.entry(grouping.bucket(code)).or_default() += count;
                }
                _ => tracing::debug!("Skipping status bucket {:?} ({} requests)", label, count),
            }
        }

        let mut methods = Tally::default();
        for (method, count) in &summary.request_methods {
            methods.add_n(method, *count);
        }

        let mut hosts = Tally::default();
        for (host, count) in &summary.hosts {
            hosts.add_n(host, *count);
        }

        let durations = summary.timing.as_ref().and_then(precomputed_durations);

        tracing::info!(
            "Summary complete: {} entries, {} hosts",
            summary.total_entries,
            hosts.distinct()
        );

        TrafficSummary {
            total_records: summary.total_entries,
            status_codes: Histogram::from_counts(
                statuses
                    .into_iter()
                    .map(|(bucket, count)| (grouping.label(bucket), count))
                    .collect(),
            ),
            methods: Histogram::from_counts(methods.by_count_desc()),
            hosts: HostRanking::from_sorted(hosts.by_count_desc(), self.config.top_hosts),
            durations,
            duration_distribution: None,
            host_status: HostStatusMatrix::default(),
            diagnostics: Diagnostics::default(),
        }
    }
}

/// Timing stats from a summary file, only when every value is present
///
/// The file does not say how many requests were timed, so `samples` and the
/// median stay unknown.
fn precomputed_durations(timing: &PrecomputedTiming) -> Option<DurationStats> {
    let (Some(min), Some(max), Some(mean), Some(total)) =
        (timing.min, timing.max, timing.avg, timing.total)
    else {
        tracing::debug!("Summary timing block is incomplete; reporting no timing data");
        return None;
    };

    Some(DurationStats {
        samples: None,
        min,
        mean,
        max,
        total,
        median: None,
    })
}

impl Analyzer for Aggregator {
    type Output = TrafficSummary;

    fn analyze(&self, records: &RecordSet) -> Result<Self::Output> {
        Ok(self.aggregate_indexed(
            records.input_positions(),
            records.input_len(),
            &records.rejected,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StatusGrouping;
    use crate::record::{LogDocument, RecordReader};

    fn statuses(codes: &[i64]) -> Vec<Transaction> {
        codes
            .iter()
            .map(|code| Transaction::new("api.example.com", "GET").with_status(*code))
            .collect()
    }

    #[test]
    fn test_status_histogram_scenario() {
        let summary = Aggregator::default().aggregate(&statuses(&[200, 200, 404, 500, 200]));

        let labels: Vec<_> = summary
            .status_codes
            .buckets
            .iter()
            .map(|b| (b.label.as_str(), b.count, b.percentage))
            .collect();
        assert_eq!(
            labels,
            vec![("200", 3, 60.0), ("404", 1, 20.0), ("500", 1, 20.0)]
        );
    }

    #[test]
    fn test_duration_stats_scenario() {
        let records: Vec<_> = [10.0, 20.0, 30.0]
            .iter()
            .map(|d| Transaction::new("api.example.com", "GET").with_duration(*d))
            .collect();

        let stats = Aggregator::default().aggregate(&records).durations.unwrap();
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.mean, 20.0);
        assert_eq!(stats.max, 30.0);
    }

    #[test]
    fn test_empty_input_yields_empty_tables() {
        let summary = Aggregator::default().aggregate(&[]);

        assert_eq!(summary.total_records, 0);
        assert!(summary.status_codes.is_empty());
        assert!(summary.methods.is_empty());
        assert!(summary.hosts.is_empty());
        assert!(summary.durations.is_none());
        assert!(summary.duration_distribution.is_none());
        assert!(summary.host_status.is_empty());
        assert_eq!(summary.diagnostics.invalid_records, 0);
    }

    #[test]
    fn test_negative_duration_is_isolated() {
        let records = vec![
            Transaction::new("api.example.com", "POST")
                .with_status(201)
                .with_duration(-5.0),
        ];

        let summary = Aggregator::default().aggregate(&records);
        assert!(summary.durations.is_none());
        assert_eq!(summary.status_codes.get("201").unwrap().count, 1);
        assert_eq!(summary.methods.get("POST").unwrap().count, 1);
        assert_eq!(summary.diagnostics.invalid_records, 1);
        assert_eq!(
            summary.diagnostics.issues,
            vec![RecordIssue::new(0, IssueKind::NegativeDuration(-5.0))]
        );
    }

    #[test]
    fn test_record_with_several_bad_fields_counts_once() {
        let records = vec![
            Transaction::new("  ", "GET")
                .with_status(999)
                .with_duration(f64::NAN),
            Transaction::new("api.example.com", "GET").with_status(200),
        ];

        let summary = Aggregator::default().aggregate(&records);
        assert_eq!(summary.diagnostics.invalid_records, 1);
        assert_eq!(summary.diagnostics.issues.len(), 3);
        assert_eq!(summary.hosts.total, 1);
        assert_eq!(summary.methods.total, 2);
        assert_eq!(summary.status_codes.total, 1);
    }

    #[test]
    fn test_absent_fields_are_not_invalid() {
        let records = vec![
            Transaction::new("api.example.com", "GET"),
            Transaction::new("api.example.com", "GET").with_status(200),
        ];

        let summary = Aggregator::default().aggregate(&records);
        assert_eq!(summary.diagnostics.invalid_records, 0);
        // denominator is the records that carry a status
        assert_eq!(summary.status_codes.total, 1);
        assert_eq!(summary.status_codes.get("200").unwrap().percentage, 100.0);
    }

    #[test]
    fn test_host_ranking_top_n_and_ties() {
        let mut records = Vec::new();
        for i in 0..12 {
            let host = format!("host{:02}.example.com", i);
            for _ in 0..(if i == 11 { 5 } else { 1 }) {
                records.push(Transaction::new(host.as_str(), "GET"));
            }
        }

        let summary = Aggregator::default().aggregate(&records);
        let ranking = &summary.hosts;
        assert_eq!(ranking.entries.len(), 10);
        assert_eq!(ranking.distinct_hosts, 12);
        assert_eq!(ranking.entries[0].host, "host11.example.com");
        assert_eq!(ranking.entries[0].count, 5);
        // ties keep first-seen order
        assert_eq!(ranking.entries[1].host, "host00.example.com");
        assert_eq!(ranking.entries[9].host, "host08.example.com");
        assert!(ranking.entries.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_status_classes() {
        let config = AggregatorConfig::new().with_status_grouping(StatusGrouping::Class);
        let summary =
            Aggregator::new(config).aggregate(&statuses(&[200, 204, 301, 404, 418, 503]));

        let labels: Vec<_> = summary
            .status_codes
            .buckets
            .iter()
            .map(|b| (b.label.as_str(), b.count))
            .collect();
        assert_eq!(
            labels,
            vec![("2xx", 2), ("3xx", 1), ("4xx", 2), ("5xx", 1)]
        );
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let summary = Aggregator::default().aggregate(&statuses(&[200, 201, 202, 404, 404, 500, 503]));
        let sum: f64 = summary.status_codes.buckets.iter().map(|b| b.percentage).sum();
        assert!((sum - 100.0).abs() <= 0.5, "sum was {}", sum);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let records = vec![
            Transaction::new("b.example.com", "GET").with_status(200).with_duration(15.0),
            Transaction::new("a.example.com", "POST").with_status(500).with_duration(900.0),
            Transaction::new("c.example.com", "DELETE").with_status(204),
        ];
        let aggregator = Aggregator::default();

        let first = serde_json::to_string(&aggregator.aggregate(&records)).unwrap();
        let second = serde_json::to_string(&aggregator.aggregate(&records)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_host_status_matrix() {
        let records = vec![
            Transaction::new("api.example.com", "GET").with_status(200),
            Transaction::new("api.example.com", "GET").with_status(500),
            Transaction::new("cdn.example.com", "GET").with_status(200),
            Transaction::new("cdn.example.com", "GET"),
        ];

        let matrix = Aggregator::default().aggregate(&records).host_status;
        assert_eq!(matrix.hosts, vec!["api.example.com", "cdn.example.com"]);
        assert_eq!(matrix.statuses, vec!["200", "500"]);
        assert_eq!(matrix.counts, vec![vec![1, 1], vec![1, 0]]);
    }

    #[test]
    fn test_analyze_reports_input_positions() {
        let json = r#"[
            {"host": "api.example.com", "method": "GET", "duration": 10},
            {"method": "GET"},
            {"host": "api.example.com", "method": "GET", "duration": -1}
        ]"#;
        let LogDocument::Entries(set) = RecordReader::from_str(json).unwrap() else {
            panic!("expected entries");
        };

        let summary = Aggregator::default().analyze(&set).unwrap();
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.diagnostics.invalid_records, 2);
        let indices: Vec<_> = summary.diagnostics.issues.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_selection_keeps_file_indices_and_rejections() {
        let json = r#"[
            {"host": "api.example.com", "method": "POST", "duration": -3},
            {"host": "api.example.com", "method": "GET", "duration": 10},
            {"method": "GET"},
            {"host": "cdn.example.com", "method": "GET", "duration": -1}
        ]"#;
        let LogDocument::Entries(set) = RecordReader::from_str(json).unwrap() else {
            panic!("expected entries");
        };

        let summary = Aggregator::default().analyze_matching(&set, |tx| tx.method == "GET");
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.methods.total, 2);
        assert_eq!(summary.diagnostics.invalid_records, 2);
        assert_eq!(
            summary.diagnostics.issues,
            vec![
                RecordIssue::new(2, IssueKind::MissingHost),
                RecordIssue::new(3, IssueKind::NegativeDuration(-1.0)),
            ]
        );
    }

    #[test]
    fn test_precomputed_summary() {
        let json = r#"{
            "total_entries": 4,
            "request_methods": {"GET": 3, "POST": 1},
            "status_codes": {"404": 1, "200": 2, "Unknown": 1},
            "hosts": {"b.example.com": 2, "a.example.com": 2},
            "timing": {"min": 5, "max": 50, "avg": 20, "total": 80}
        }"#;
        let LogDocument::Summary(precomputed) = RecordReader::from_str(json).unwrap() else {
            panic!("expected summary");
        };

        let summary = Aggregator::default().summarize_precomputed(&precomputed);
        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.status_codes.total, 3);
        assert_eq!(summary.status_codes.buckets[0].label, "200");
        assert_eq!(summary.methods.buckets[0].label, "GET");
        assert_eq!(summary.hosts.entries[0].host, "b.example.com");
        let durations = summary.durations.unwrap();
        assert_eq!(durations.mean, 20.0);
        assert_eq!(durations.median, None);
        assert_eq!(durations.samples, None);
        assert!(summary.duration_distribution.is_none());
    }

    #[test]
    fn test_precomputed_incomplete_timing_is_absent() {
        let json = r#"{
            "total_entries": 2,
            "hosts": {"a.example.com": 2},
            "timing": {"avg": 40}
        }"#;
        let LogDocument::Summary(precomputed) = RecordReader::from_str(json).unwrap() else {
            panic!("expected summary");
        };
        assert_eq!(precomputed.timing.as_ref().unwrap().min, None);

        let summary = Aggregator::default().summarize_precomputed(&precomputed);
        assert!(summary.durations.is_none());

        let empty: PrecomputedSummary =
            serde_json::from_str(r#"{"total_entries": 2, "timing": {}}"#).unwrap();
        assert!(
            Aggregator::default()
                .summarize_precomputed(&empty)
                .durations
                .is_none()
        );
    }
}
