use crate::args::FilterArgs;
use crate::config::DashboardConfig;
use anyhow::{Context, Result, bail};
use charlog_core::filter::filter_records;
use charlog_core::record::{LogDocument, RecordReader, RecordWriter};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub fn execute(
    file: &Path,
    filters: &FilterArgs,
    output: Option<PathBuf>,
    dashboard: &DashboardConfig,
) -> Result<()> {
    let file = dashboard.resolve_log(file);
    tracing::debug!("Filtering log file: {}", file.display());

    let criteria = filters.criteria()?;

    let document = RecordReader::from_file(&file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let set = match document {
        LogDocument::Entries(set) => set,
        LogDocument::Summary(_) => {
            bail!("{} is a summary file and has no entries to filter", file.display())
        }
    };

    tracing::debug!("Applying filter criteria");
    let filtered = filter_records(&set, &criteria);
    tracing::info!(
        "Kept {} of {} entries",
        filtered.transactions.len(),
        set.transactions.len()
    );

    if let Some(output_path) = output {
        tracing::debug!("Writing filtered log to: {}", output_path.display());
        RecordWriter::to_file(&filtered, &output_path)?;
    } else {
        tracing::debug!("Writing filtered log to stdout");
        let json = RecordWriter::to_string(&filtered)?;
        io::stdout().write_all(json.as_bytes())?;
        io::stdout().write_all(b"\n")?;
    }

    Ok(())
}
