use crate::{OutputFormat, csv_field};
use crate::args::FilterArgs;
use crate::config::DashboardConfig;
use anyhow::{Context, Result, bail};
use charlog_core::body;
use charlog_core::filter::FilterCriteria;
use charlog_core::record::{LogDocument, RecordReader, RecordSet, Transaction};
use console::style;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

const PREVIEW_CHARS: usize = 40;

/// One row of the entry listing; `index` is the position in the log file
#[derive(Debug, Serialize)]
pub struct EntryRow<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub transaction: &'a Transaction,
}

/// Load a log that carries individual entries
pub fn load_entries(file: &Path) -> Result<RecordSet> {
    let document = RecordReader::from_file(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    match document {
        LogDocument::Entries(set) => Ok(set),
        LogDocument::Summary(_) => bail!(
            "{} is a summary file; it contains statistics but no entries",
            file.display()
        ),
    }
}

/// Matching transactions with their position in the file
pub fn select<'a>(set: &'a RecordSet, criteria: &FilterCriteria) -> Vec<EntryRow<'a>> {
    set.input_positions()
        .filter(|(_, tx)| criteria.matches(tx))
        .map(|(index, transaction)| EntryRow { index, transaction })
        .collect()
}

pub fn execute(
    file: &Path,
    filters: &FilterArgs,
    show: Option<usize>,
    dashboard: &DashboardConfig,
    format: OutputFormat,
) -> Result<()> {
    let file = dashboard.resolve_log(file);
    let criteria = filters.criteria()?;
    let set = load_entries(&file)?;

    match show {
        Some(index) => show_entry(&set, index, format),
        None => {
            let rows = select(&set, &criteria);
            tracing::info!("{} of {} entries selected", rows.len(), set.input_len());
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                OutputFormat::Table => output_table(&rows),
                OutputFormat::Pretty => output_pretty(&rows),
            }
            Ok(())
        }
    }
}

fn show_entry(set: &RecordSet, index: usize, format: OutputFormat) -> Result<()> {
    let Some((_, transaction)) = set.input_positions().find(|(i, _)| *i == index) else {
        if let Some(issue) = set.rejected.iter().find(|issue| issue.index == index) {
            bail!("Entry {} was skipped: {}", index, issue.kind);
        }
        bail!("No entry at index {} (the log has {})", index, set.input_len());
    };

    let row = EntryRow { index, transaction };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&row)?),
        OutputFormat::Table => {
            println!("Field,Value");
            println!("Index,{}", index);
            println!("Method,{}", csv_field(&transaction.method));
            println!("Status,{}", optional(transaction.status_code));
            println!("Duration (ms),{}", optional(transaction.duration_ms));
            println!("Host,{}", csv_field(&transaction.host));
            if let Some(url) = &transaction.url {
                println!("URL,{}", csv_field(url));
            }
        }
        OutputFormat::Pretty => {
            println!("\n{}", style(format!("Entry {}", index)).bold().cyan());
            println!("  Method:   {}", style(&transaction.method).yellow());
            println!("  Status:   {}", optional(transaction.status_code));
            println!("  Duration: {} ms", optional(transaction.duration_ms));
            println!("  Host:     {}", transaction.host);
            if let Some(url) = &transaction.url {
                println!("  URL:      {}", url);
            }

            print_body("Request Body", transaction.request_body.as_ref());
            print_body("Response Body", transaction.response_body.as_ref());
            println!();
        }
    }

    Ok(())
}

fn print_body(title: &str, content: Option<&Value>) {
    println!("\n{}", style(title).bold());
    match content {
        Some(value) => {
            for line in body::prettify(value).lines() {
                println!("  {}", line);
            }
        }
        None => println!("  {}", style(format!("No {} data available.", title.to_lowercase())).dim()),
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Single-line preview of a response body
fn preview(content: Option<&Value>) -> String {
    let flat = match content {
        Some(Value::String(text)) => text.split_whitespace().collect::<Vec<_>>().join(" "),
        Some(other) => other.to_string(),
        None => return String::new(),
    };
    body::truncate(&flat, PREVIEW_CHARS)
}

fn output_pretty(rows: &[EntryRow]) {
    if rows.is_empty() {
        println!("{}", style("No entries matched").dim());
        return;
    }

    println!(
        "{}",
        style(format!(
            "{:>5}  {:<7} {:>6} {:>10}  {:<32} {}",
            "#", "Method", "Status", "Time (ms)", "Host", "Response"
        ))
        .bold()
    );
    for row in rows {
        let tx = row.transaction;
        println!(
            "{:>5}  {:<7} {:>6} {:>10}  {:<32} {}",
            row.index,
            tx.method,
            optional(tx.status_code),
            tx.duration_ms
                .map(|d| format!("{:.1}", d))
                .unwrap_or_else(|| "-".to_string()),
            tx.host,
            style(preview(tx.response_body.as_ref())).dim()
        );
    }
    println!("\n{} entries", rows.len());
}

fn output_table(rows: &[EntryRow]) {
    println!("Index,Method,Status,Duration (ms),Host,URL");
    for row in rows {
        let tx = row.transaction;
        println!(
            "{},{},{},{},{},{}",
            row.index,
            csv_field(&tx.method),
            tx.status_code.map(|s| s.to_string()).unwrap_or_default(),
            tx.duration_ms.map(|d| d.to_string()).unwrap_or_default(),
            csv_field(&tx.host),
            csv_field(tx.url.as_deref().unwrap_or(""))
        );
    }
}
