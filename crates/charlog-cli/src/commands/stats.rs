use crate::{OutputFormat, csv_field};
use crate::args::{AggregationArgs, FilterArgs};
use crate::config::DashboardConfig;
use anyhow::{Context, Result, bail};
use charlog_core::analysis::{
    Aggregator, AggregatorConfig, Analyzer, Histogram, HostStatusMatrix, TrafficSummary,
};
use charlog_core::filter::FilterCriteria;
use charlog_core::record::{LogDocument, RecordReader};
use console::{Style, style};
use std::path::Path;

const BAR_WIDTH: usize = 30;

/// Read a parsed log and derive its summary tables
pub fn summarize_file(
    file: &Path,
    criteria: &FilterCriteria,
    config: &AggregatorConfig,
) -> Result<TrafficSummary> {
    tracing::debug!("Reading log file: {}", file.display());

    let document = RecordReader::from_file(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let aggregator = Aggregator::new(config.clone());

    match document {
        LogDocument::Entries(set) if criteria.is_empty() => Ok(aggregator.analyze(&set)?),
        LogDocument::Entries(set) => {
            Ok(aggregator.analyze_matching(&set, |tx| criteria.matches(tx)))
        }
        LogDocument::Summary(_) if !criteria.is_empty() => {
            bail!("{} is a summary file; filters need per-entry data", file.display())
        }
        LogDocument::Summary(summary) => Ok(aggregator.summarize_precomputed(&summary)),
    }
}

pub fn execute(
    file: &Path,
    filters: &FilterArgs,
    aggregation: &AggregationArgs,
    dashboard: &DashboardConfig,
    format: OutputFormat,
) -> Result<()> {
    let file = dashboard.resolve_log(file);
    tracing::info!("Summarizing log file: {}", file.display());

    let criteria = filters.criteria()?;
    let config = aggregation.config(filters)?;
    let summary = summarize_file(&file, &criteria, &config)?;

    tracing::debug!("Rendering summary as {}", format.as_str());
    match format {
        OutputFormat::Json => output_json(&summary)?,
        OutputFormat::Table => output_table(&summary),
        OutputFormat::Pretty => output_pretty(&summary, &file),
    }

    Ok(())
}

/// Colour of a status bucket label, by class
fn status_style(label: &str) -> Style {
    match label.chars().next() {
        Some('2') => Style::new().green(),
        Some('3') => Style::new().blue(),
        Some('4') => Style::new().yellow(),
        Some('5') => Style::new().red(),
        _ => Style::new().dim(),
    }
}

fn bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled.min(BAR_WIDTH))
}

fn print_histogram(histogram: &Histogram, label_style: impl Fn(&str) -> Style, empty: &str) {
    if histogram.is_empty() {
        println!("  {}", style(empty).dim());
        return;
    }

    for bucket in &histogram.buckets {
        let paint = label_style(&bucket.label);
        println!(
            "  {:<10} {:>6}  {:>5.1}%  {}",
            paint.apply_to(&bucket.label),
            bucket.count,
            bucket.percentage,
            paint.apply_to(bar(bucket.percentage))
        );
    }
}

fn print_matrix(matrix: &HostStatusMatrix) {
    let host_width = matrix.hosts.iter().map(|h| h.len()).max().unwrap_or(4).max(4);

    print!("  {:<width$}", "Host", width = host_width);
    for status in &matrix.statuses {
        print!(" {:>6}", status_style(status).apply_to(status));
    }
    println!();

    for (host, row) in matrix.hosts.iter().zip(&matrix.counts) {
        print!("  {:<width$}", host, width = host_width);
        for count in row {
            if *count == 0 {
                print!(" {:>6}", style("·").dim());
            } else {
                print!(" {:>6}", count);
            }
        }
        println!();
    }
}

fn output_pretty(summary: &TrafficSummary, file: &Path) {
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    println!(
        "\n{}",
        style(format!("Charles Log Summary: {}", file_name))
            .bold()
            .cyan()
    );
    println!();

    println!("{}", style("Overview").bold());
    println!(
        "  Entries:        {}",
        style(summary.total_records).yellow()
    );
    println!("  Distinct Hosts: {}", summary.hosts.distinct_hosts);
    if summary.diagnostics.invalid_records > 0 {
        println!(
            "  Invalid:        {} (partly or fully skipped)",
            style(summary.diagnostics.invalid_records).red()
        );
    }

    if summary.total_records == 0 {
        println!("\n  {}", style("No data: the log contains no entries").dim());
        println!();
        return;
    }

    println!("\n{}", style("Status Codes").bold());
    print_histogram(&summary.status_codes, status_style, "No status code data available");

    println!("\n{}", style("Request Methods").bold());
    print_histogram(&summary.methods, |_| Style::new().cyan(), "No method data available");

    println!(
        "\n{}",
        style(format!("Top {} Hosts", summary.hosts.entries.len())).bold()
    );
    if summary.hosts.is_empty() {
        println!("  {}", style("No host data available").dim());
    }
    for (i, host) in summary.hosts.entries.iter().enumerate() {
        println!(
            "  {:>2}. {:<40} {:>6}  {:>5.1}%",
            i + 1,
            host.host,
            host.count,
            host.percentage
        );
    }

    println!("\n{}", style("Timing (ms)").bold());
    match &summary.durations {
        Some(stats) => {
            println!("  Minimum:  {:.2}", stats.min);
            println!("  Average:  {:.2}", stats.mean);
            if let Some(median) = stats.median {
                println!("  Median:   {:.2}", median);
            }
            println!("  Maximum:  {:.2}", stats.max);
            match stats.samples {
                Some(samples) => {
                    println!("  Total:    {:.2} over {} requests", stats.total, samples)
                }
                None => println!("  Total:    {:.2}", stats.total),
            }
        }
        None => println!("  {}", style("No timing data available").dim()),
    }

    if let Some(distribution) = &summary.duration_distribution {
        println!("\n{}", style("Duration Categories").bold());
        for bucket in &distribution.buckets {
            println!(
                "  {:<10} {:>6}  {:>5.1}%  {}",
                bucket.label,
                bucket.count,
                bucket.percentage,
                style(bar(bucket.percentage)).magenta()
            );
        }
    }

    if !summary.host_status.is_empty() {
        println!("\n{}", style("Status Codes by Host").bold());
        print_matrix(&summary.host_status);
    }

    println!();
}

fn output_json(summary: &TrafficSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    println!("{}", json);
    Ok(())
}

fn output_table(summary: &TrafficSummary) {
    println!("Table,Label,Count,Percentage");
    println!("overview,entries,{},", summary.total_records);
    println!(
        "overview,invalid,{},",
        summary.diagnostics.invalid_records
    );

    for bucket in &summary.status_codes.buckets {
        println!(
            "status,{},{},{:.1}",
            csv_field(&bucket.label),
            bucket.count,
            bucket.percentage
        );
    }
    for bucket in &summary.methods.buckets {
        println!(
            "method,{},{},{:.1}",
            csv_field(&bucket.label),
            bucket.count,
            bucket.percentage
        );
    }
    for host in &summary.hosts.entries {
        println!(
            "host,{},{},{:.1}",
            csv_field(&host.host),
            host.count,
            host.percentage
        );
    }
    if let Some(stats) = &summary.durations {
        println!("timing,min,{:.2},", stats.min);
        println!("timing,avg,{:.2},", stats.mean);
        println!("timing,max,{:.2},", stats.max);
    }
    if let Some(distribution) = &summary.duration_distribution {
        for bucket in &distribution.buckets {
            println!(
                "duration,{},{},{:.1}",
                bucket.label, bucket.count, bucket.percentage
            );
        }
    }
}
