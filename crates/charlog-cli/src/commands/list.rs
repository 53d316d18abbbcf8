use crate::{OutputFormat, csv_field};
use crate::config::DashboardConfig;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use console::style;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// A parsed log file found in the output directory
#[derive(Debug, Clone, Serialize)]
pub struct LogFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<String>,
}

/// JSON files in the output directory, sorted by name
pub fn find_logs(dashboard: &DashboardConfig) -> Result<Vec<LogFile>> {
    let dir = &dashboard.output_dir;
    tracing::debug!("Scanning {} for parsed logs", dir.display());

    let mut logs = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json || !path.is_file() {
            continue;
        }

        let metadata = entry.metadata()?;
        let modified = metadata
            .modified()
            .ok()
            .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string());

        logs.push(LogFile {
            name: entry.file_name().to_string_lossy().to_string(),
            path,
            size: metadata.len(),
            modified,
        });
    }

    logs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(logs)
}

pub fn execute(dashboard: &DashboardConfig, create: bool, format: OutputFormat) -> Result<()> {
    let dir = &dashboard.output_dir;

    if !dir.exists() {
        if !create {
            bail!(
                "Directory '{}' not found; pass --create to create it or --output-dir to pick another",
                dir.display()
            );
        }
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        tracing::info!("Created directory: {}", dir.display());
    }

    let logs = find_logs(dashboard)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&logs)?),
        OutputFormat::Table => {
            println!("Name,Size (bytes),Modified");
            for log in &logs {
                println!(
                    "{},{},{}",
                    csv_field(&log.name),
                    log.size,
                    log.modified.as_deref().unwrap_or("")
                );
            }
        }
        OutputFormat::Pretty => {
            println!(
                "\n{}",
                style(format!("Parsed logs in {}", dir.display())).bold().cyan()
            );
            if logs.is_empty() {
                println!(
                    "  {}",
                    style("No JSON files found. Run the log parser with this directory as its output first.")
                        .dim()
                );
            }
            for log in &logs {
                println!(
                    "  {:<40} {:>10} bytes  {}",
                    style(&log.name).green(),
                    log.size,
                    log.modified.as_deref().unwrap_or("")
                );
            }
            println!();
        }
    }

    Ok(())
}
