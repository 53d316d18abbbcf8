use super::types::{RecordSet, Transaction};
use crate::Result;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Output document in the parser's "detailed" layout
#[derive(Serialize)]
struct EntriesDocument<'a> {
    entries: &'a [Transaction],
}

pub struct RecordWriter;

impl RecordWriter {
    /// Write the transactions of a record set to a file
    pub fn to_file(set: &RecordSet, path: &Path) -> Result<()> {
        tracing::debug!("Writing log file to: {}", path.display());

        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(
            writer,
            &EntriesDocument {
                entries: &set.transactions,
            },
        )?;

        tracing::info!(
            "Successfully wrote {} entries to {}",
            set.transactions.len(),
            path.display()
        );

        Ok(())
    }

    /// Convert the transactions of a record set to a JSON string
    pub fn to_string(set: &RecordSet) -> Result<String> {
        let json = serde_json::to_string_pretty(&EntriesDocument {
            entries: &set.transactions,
        })?;
        Ok(json)
    }
}
