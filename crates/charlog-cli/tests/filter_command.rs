use charlog_cli::args::FilterArgs;
use charlog_cli::config::DashboardConfig;
use charlog_core::record::{LogDocument, RecordReader, RecordSet};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to get path to test fixtures
fn fixture_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(filename)
}

fn read_entries(path: &Path) -> RecordSet {
    match RecordReader::from_file(path).unwrap() {
        LogDocument::Entries(set) => set,
        LogDocument::Summary(_) => panic!("filter output should hold entries"),
    }
}

fn run_filter(filters: FilterArgs) -> RecordSet {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("filtered.json");

    let result = charlog_cli::commands::filter::execute(
        &fixture_path("session.json"),
        &filters,
        Some(output.clone()),
        &DashboardConfig::new(temp_dir.path()),
    );
    assert!(result.is_ok(), "filter should succeed: {:?}", result.err());

    read_entries(&output)
}

#[test]
fn test_filter_exact_host_match() {
    let filtered = run_filter(FilterArgs {
        hosts: vec!["api.example.com".to_string()],
        ..FilterArgs::default()
    });

    assert_eq!(filtered.transactions.len(), 3);
    assert!(filtered.rejected.is_empty());
    for tx in &filtered.transactions {
        assert_eq!(tx.host, "api.example.com");
    }
}

#[test]
fn test_filter_glob_and_comma_separated_hosts() {
    let filtered = run_filter(FilterArgs {
        hosts: vec!["cdn.*,*.ads.net".to_string()],
        ..FilterArgs::default()
    });

    let hosts: Vec<_> = filtered.transactions.iter().map(|t| t.host.as_str()).collect();
    assert_eq!(
        hosts,
        vec!["cdn.example.com", "tracker.ads.net", "cdn.example.com"]
    );
}

#[test]
fn test_filter_status_class_and_method() {
    let filtered = run_filter(FilterArgs {
        status: Some("2xx".to_string()),
        method: Some("post".to_string()),
        ..FilterArgs::default()
    });

    assert_eq!(filtered.transactions.len(), 1);
    assert_eq!(filtered.transactions[0].status_code, Some(201));
    assert_eq!(filtered.transactions[0].duration_ms, Some(450.0));
}

#[test]
fn test_filter_duration_bucket() {
    let filtered = run_filter(FilterArgs {
        duration: Some("0-100ms".to_string()),
        ..FilterArgs::default()
    });

    let durations: Vec<_> = filtered
        .transactions
        .iter()
        .filter_map(|t| t.duration_ms)
        .collect();
    assert_eq!(durations, vec![35.0, 80.0]);
}

#[test]
fn test_filter_no_matches_writes_empty_log() {
    let filtered = run_filter(FilterArgs {
        hosts: vec!["nowhere.example.org".to_string()],
        ..FilterArgs::default()
    });

    assert!(filtered.is_empty());
}

#[test]
fn test_filter_unknown_duration_bucket_fails() {
    let temp_dir = TempDir::new().unwrap();
    let filters = FilterArgs {
        duration: Some("forever".to_string()),
        ..FilterArgs::default()
    };

    let result = charlog_cli::commands::filter::execute(
        &fixture_path("session.json"),
        &filters,
        Some(temp_dir.path().join("out.json")),
        &DashboardConfig::new(temp_dir.path()),
    );
    assert!(result.is_err());
}

#[test]
fn test_filter_summary_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    let result = charlog_cli::commands::filter::execute(
        &fixture_path("summary.json"),
        &FilterArgs::default(),
        Some(temp_dir.path().join("out.json")),
        &DashboardConfig::new(temp_dir.path()),
    );
    assert!(result.is_err());
}
