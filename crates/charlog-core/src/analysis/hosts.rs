use super::histogram::percentage;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostCount {
    pub host: String,
    pub count: usize,
    pub percentage: f64,
}

/// Most requested hosts, descending by count
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostRanking {
    /// Records with a valid host
    pub total: usize,
    pub distinct_hosts: usize,
    pub entries: Vec<HostCount>,
}

impl HostRanking {
    /// Rank hosts from counts already sorted descending
    pub fn from_sorted(sorted: Vec<(String, usize)>, top_n: usize) -> Self {
        let total = sorted.iter().map(|(_, count)| count).sum();
        let distinct_hosts = sorted.len();
        let entries = sorted
            .into_iter()
            .take(top_n)
            .map(|(host, count)| HostCount {
                host,
                count,
                percentage: percentage(count, total),
            })
            .collect();

        Self {
            total,
            distinct_hosts,
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.host.as_str())
    }
}

/// Status counts per ranked host, suitable for a heatmap
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostStatusMatrix {
    pub hosts: Vec<String>,
    pub statuses: Vec<String>,
    /// `counts[h][s]` is the number of requests to `hosts[h]` with `statuses[s]`
    pub counts: Vec<Vec<usize>>,
}

impl HostStatusMatrix {
    pub(crate) fn build(
        ranking: &HostRanking,
        per_host: &HashMap<String, BTreeMap<i64, usize>>,
        label: impl Fn(i64) -> String,
    ) -> Self {
        let rows: Vec<(&str, Option<&BTreeMap<i64, usize>>)> = ranking
            .hosts()
            .map(|host| (host, per_host.get(host)))
            .filter(|(_, statuses)| statuses.is_some_and(|s| !s.is_empty()))
            .collect();

        let columns: BTreeSet<i64> = rows
            .iter()
            .filter_map(|(_, statuses)| *statuses)
            .flat_map(|statuses| statuses.keys().copied())
            .collect();

        let counts = rows
            .iter()
            .map(|(_, statuses)| {
                columns
                    .iter()
                    .map(|bucket| {
                        statuses
                            .and_then(|s| s.get(bucket))
                            .copied()
                            .unwrap_or(0)
                    })
                    .collect()
            })
            .collect();

        Self {
            hosts: rows.iter().map(|(host, _)| host.to_string()).collect(),
            statuses: columns.into_iter().map(label).collect(),
            counts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn get(&self, host: &str, status: &str) -> Option<usize> {
        let row = self.hosts.iter().position(|h| h == host)?;
        let col = self.statuses.iter().position(|s| s == status)?;
        Some(self.counts[row][col])
    }
}
