use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

/// One captured HTTP exchange as emitted by the log parser
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub host: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
}

impl Transaction {
    /// Create a transaction with only the required fields set
    pub fn new(host: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            method: method.into(),
            status_code: None,
            duration_ms: None,
            url: None,
            request_body: None,
            response_body: None,
        }
    }

    pub fn with_status(mut self, status: i64) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Decode a single parser entry, tolerating the field variants the
    /// parser is known to emit
    pub fn from_value(value: Value) -> Result<Self, IssueKind> {
        if !value.is_object() {
            return Err(IssueKind::NotAnObject);
        }

        let wire: WireEntry =
            serde_json::from_value(value).map_err(|e| IssueKind::Malformed(e.to_string()))?;
        wire.try_into()
    }
}

/// Why a record (or one of its fields) was left out of a table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum IssueKind {
    NotAnObject,
    Malformed(String),
    MissingHost,
    MissingMethod,
    BlankHost,
    BlankMethod,
    NegativeDuration(f64),
    NonFiniteDuration,
    StatusOutOfRange(i64),
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueKind::NotAnObject => write!(f, "entry is not a JSON object"),
            IssueKind::Malformed(msg) => write!(f, "malformed entry: {}", msg),
            IssueKind::MissingHost => write!(f, "missing host"),
            IssueKind::MissingMethod => write!(f, "missing method"),
            IssueKind::BlankHost => write!(f, "blank host"),
            IssueKind::BlankMethod => write!(f, "blank method"),
            IssueKind::NegativeDuration(d) => write!(f, "negative duration {}ms", d),
            IssueKind::NonFiniteDuration => write!(f, "non-finite duration"),
            IssueKind::StatusOutOfRange(s) => write!(f, "status code {} out of range", s),
        }
    }
}

/// An issue tied to the position of the entry in the input sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordIssue {
    pub index: usize,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl RecordIssue {
    pub fn new(index: usize, kind: IssueKind) -> Self {
        Self { index, kind }
    }
}

/// Decoded entries plus the ones that could not form a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordSet {
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<RecordIssue>,
}

impl RecordSet {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            rejected: Vec::new(),
        }
    }

    /// Number of entries in the original input, rejected ones included
    pub fn input_len(&self) -> usize {
        self.transactions.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.rejected.is_empty()
    }

    /// Transactions paired with their position in the original input
    ///
    /// Rejected entries occupy the gaps, so positions line up with the
    /// indices reported in [`RecordSet::rejected`].
    pub fn input_positions(&self) -> impl Iterator<Item = (usize, &Transaction)> {
        let mut gaps: Vec<usize> = self.rejected.iter().map(|r| r.index).collect();
        gaps.sort_unstable();
        gaps.dedup();
        let mut gaps = gaps.into_iter().peekable();
        let mut position = 0;

        self.transactions.iter().map(move |tx| {
            while gaps.next_if_eq(&position).is_some() {
                position += 1;
            }
            let current = position;
            position += 1;
            (current, tx)
        })
    }
}

/// Timing block of a parser summary file; missing values stay absent
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PrecomputedTiming {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
}

/// Counts already aggregated by the log parser ("summary" output format)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PrecomputedSummary {
    pub total_entries: usize,
    #[serde(default, deserialize_with = "ordered_counts")]
    pub request_methods: Vec<(String, usize)>,
    #[serde(default, deserialize_with = "ordered_counts")]
    pub status_codes: Vec<(String, usize)>,
    #[serde(default, deserialize_with = "ordered_counts")]
    pub hosts: Vec<(String, usize)>,
    #[serde(default)]
    pub timing: Option<PrecomputedTiming>,
}

/// A parsed log file in one of the parser's output formats
#[derive(Debug, Clone, PartialEq)]
pub enum LogDocument {
    /// "raw" (bare array) or "detailed" (object with `entries`)
    Entries(RecordSet),
    /// "summary" (pre-aggregated counts)
    Summary(PrecomputedSummary),
}

#[derive(Debug, Deserialize)]
struct WireEntry {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default, alias = "status", deserialize_with = "lenient_status")]
    status_code: Option<i64>,
    #[serde(default, alias = "duration", deserialize_with = "lenient_duration")]
    duration_ms: Option<f64>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    request_body: Option<Value>,
    #[serde(default)]
    response_body: Option<Value>,
}

impl TryFrom<WireEntry> for Transaction {
    type Error = IssueKind;

    fn try_from(wire: WireEntry) -> Result<Self, Self::Error> {
        let host = match wire.host {
            Some(host) => host,
            None => wire
                .url
                .as_deref()
                .and_then(host_from_url)
                .ok_or(IssueKind::MissingHost)?,
        };
        let method = wire.method.ok_or(IssueKind::MissingMethod)?;

        Ok(Transaction {
            host,
            method,
            status_code: wire.status_code,
            duration_ms: wire.duration_ms,
            url: wire.url,
            request_body: wire.request_body.filter(|v| !v.is_null()),
            response_body: wire.response_body.filter(|v| !v.is_null()),
        })
    }
}

fn host_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    url.host_str().map(|h| h.to_string())
}

/// Numbers and numeric strings; anything else ("Unknown", null) is absent
fn lenient_status<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }))
}

fn lenient_duration<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}

/// Read a JSON object of counts while keeping the order of the file
fn ordered_counts<'de, D>(deserializer: D) -> Result<Vec<(String, usize)>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{MapAccess, Visitor};

    struct OrderedCounts;

    impl<'de> Visitor<'de> for OrderedCounts {
        type Value = Vec<(String, usize)>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a map of names to counts")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut counts = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, count)) = map.next_entry::<String, usize>()? {
                counts.push((name, count));
            }
            Ok(counts)
        }
    }

    deserializer.deserialize_map(OrderedCounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_canonical_fields() {
        let tx = Transaction::from_value(json!({
            "host": "api.example.com",
            "method": "GET",
            "status_code": 200,
            "duration_ms": 12.5
        }))
        .unwrap();

        assert_eq!(tx.host, "api.example.com");
        assert_eq!(tx.method, "GET");
        assert_eq!(tx.status_code, Some(200));
        assert_eq!(tx.duration_ms, Some(12.5));
    }

    #[test]
    fn test_decode_parser_aliases_and_strings() {
        let tx = Transaction::from_value(json!({
            "host": "cdn.example.com",
            "method": "POST",
            "status": "404",
            "duration": "87"
        }))
        .unwrap();

        assert_eq!(tx.status_code, Some(404));
        assert_eq!(tx.duration_ms, Some(87.0));
    }

    #[test]
    fn test_unknown_status_is_absent_not_zero() {
        let tx = Transaction::from_value(json!({
            "host": "a.example.com",
            "method": "GET",
            "status": "Unknown",
            "duration": null
        }))
        .unwrap();

        assert_eq!(tx.status_code, None);
        assert_eq!(tx.duration_ms, None);
    }

    #[test]
    fn test_host_derived_from_url() {
        let tx = Transaction::from_value(json!({
            "url": "https://api.example.com:8443/v1/users",
            "method": "GET"
        }))
        .unwrap();

        assert_eq!(tx.host, "api.example.com");
    }

    #[test]
    fn test_missing_required_fields() {
        assert_eq!(
            Transaction::from_value(json!({"method": "GET"})),
            Err(IssueKind::MissingHost)
        );
        assert_eq!(
            Transaction::from_value(json!({"host": "a.example.com"})),
            Err(IssueKind::MissingMethod)
        );
        assert_eq!(
            Transaction::from_value(json!("GET /")),
            Err(IssueKind::NotAnObject)
        );
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let result = Transaction::from_value(json!({"host": 42, "method": "GET"}));
        assert!(matches!(result, Err(IssueKind::Malformed(_))));
    }

    #[test]
    fn test_input_positions_skip_rejected() {
        let set = RecordSet {
            transactions: vec![
                Transaction::new("a.example.com", "GET"),
                Transaction::new("b.example.com", "GET"),
            ],
            rejected: vec![
                RecordIssue::new(0, IssueKind::MissingHost),
                RecordIssue::new(2, IssueKind::NotAnObject),
            ],
        };

        let positions: Vec<_> = set
            .input_positions()
            .map(|(i, tx)| (i, tx.host.as_str()))
            .collect();
        assert_eq!(positions, vec![(1, "a.example.com"), (3, "b.example.com")]);
        assert_eq!(set.input_len(), 4);
    }

    #[test]
    fn test_summary_counts_keep_file_order() {
        let summary: PrecomputedSummary = serde_json::from_str(
            r#"{
                "total_entries": 6,
                "hosts": {"z.example.com": 3, "a.example.com": 3},
                "status_codes": {"200": 6}
            }"#,
        )
        .unwrap();

        assert_eq!(summary.hosts[0].0, "z.example.com");
        assert_eq!(summary.hosts[1].0, "a.example.com");
        assert!(summary.request_methods.is_empty());
        assert!(summary.timing.is_none());
    }
}
