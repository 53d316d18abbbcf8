use super::types::{LogDocument, PrecomputedSummary, RecordIssue, RecordSet, Transaction};
use crate::{Error, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct RecordReader;

impl RecordReader {
    /// Read and decode a parsed log file from the given path
    pub fn from_file(path: &Path) -> Result<LogDocument> {
        tracing::debug!("Reading log file from: {}", path.display());

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let value: Value = serde_json::from_reader(reader)?;

        Self::from_value(value)
    }

    /// Decode a parsed log from a JSON string
    pub fn from_str(content: &str) -> Result<LogDocument> {
        tracing::debug!("Parsing log from string");

        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Classify an already-deserialized document and decode its entries
    ///
    /// Individual entries that cannot form a transaction are collected in
    /// [`RecordSet::rejected`]; only a document that is not a record sequence
    /// at all is an error.
    pub fn from_value(value: Value) -> Result<LogDocument> {
        match value {
            Value::Array(entries) => Ok(LogDocument::Entries(Self::decode_entries(entries))),
            Value::Object(mut object) => {
                if let Some(entries) = object.remove("entries") {
                    match entries {
                        Value::Array(entries) => {
                            Ok(LogDocument::Entries(Self::decode_entries(entries)))
                        }
                        other => Err(Error::Input(format!(
                            "`entries` must be an array, found {}",
                            json_type(&other)
                        ))),
                    }
                } else if object.contains_key("total_entries") {
                    let summary: PrecomputedSummary =
                        serde_json::from_value(Value::Object(object))?;
                    tracing::info!(
                        "Loaded summary log with {} total entries",
                        summary.total_entries
                    );
                    Ok(LogDocument::Summary(summary))
                } else {
                    Err(Error::Input(
                        "expected an `entries` array or a `total_entries` summary".to_string(),
                    ))
                }
            }
            other => Err(Error::Input(format!(
                "expected a JSON array or object, found {}",
                json_type(&other)
            ))),
        }
    }

    fn decode_entries(entries: Vec<Value>) -> RecordSet {
        let mut set = RecordSet::default();

        for (index, entry) in entries.into_iter().enumerate() {
            match Transaction::from_value(entry) {
                Ok(tx) => set.transactions.push(tx),
                Err(kind) => {
                    tracing::debug!("Rejected entry {}: {}", index, kind);
                    set.rejected.push(RecordIssue::new(index, kind));
                }
            }
        }

        if !set.rejected.is_empty() {
            tracing::warn!(
                "{} of {} entries could not be decoded",
                set.rejected.len(),
                set.input_len()
            );
        }

        tracing::info!(
            "Successfully decoded {} transactions",
            set.transactions.len()
        );

        set
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
