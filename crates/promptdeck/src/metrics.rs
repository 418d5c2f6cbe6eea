//! Streaming metrics over the usage log.
//!
//! [`aggregate`] re-reads the whole log on every call and folds it into
//! per-id summaries. No state is held between calls — the full linear scan
//! is a deliberate tradeoff, and a summary is never allowed to report
//! fewer records than had been appended when the read started.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::Error;
use crate::usage::UsageLog;
use crate::version;

/// Bucket for ids that lack one in their stored record.
const UNKNOWN_ID: &str = "<unknown>";

/// Per-id summary folded from the usage log.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MetricsSummary {
    /// Total records seen for this id, numeric latency or not.
    pub count: u64,
    /// Mean of the numeric latencies; absent when none were numeric.
    pub avg_latency_ms: Option<f64>,
    /// Lexically greatest timestamp string (ISO 8601 makes that
    /// chronological).
    pub last_seen: Option<String>,
    /// Greatest version by numeric comparison, lexical fallback.
    pub latest_version: Option<String>,
}

/// Running fold state; collapses into a [`MetricsSummary`] at the end.
#[derive(Default)]
struct Fold {
    count: u64,
    latency_sum: f64,
    latency_count: u64,
    last_seen: Option<String>,
    latest_version: Option<String>,
}

impl Fold {
    fn absorb(&mut self, record: &serde_json::Map<String, Value>) {
        self.count += 1;

        if let Some(latency) = record.get("latency_ms").and_then(Value::as_f64) {
            self.latency_sum += latency;
            self.latency_count += 1;
        }

        if let Some(ts) = record.get("timestamp").and_then(Value::as_str)
            && self.last_seen.as_deref().is_none_or(|seen| ts > seen)
        {
            self.last_seen = Some(ts.to_string());
        }

        if let Some(ver) = record.get("version").and_then(Value::as_str)
            && self
                .latest_version
                .as_deref()
                .is_none_or(|latest| version::compare(ver, latest).is_gt())
        {
            self.latest_version = Some(ver.to_string());
        }
    }

    fn finish(self) -> MetricsSummary {
        MetricsSummary {
            count: self.count,
            avg_latency_ms: (self.latency_count > 0)
                .then(|| self.latency_sum / self.latency_count as f64),
            last_seen: self.last_seen,
            latest_version: self.latest_version,
        }
    }
}

/// Fold the whole usage log into per-id summaries, in storage order.
///
/// Malformed lines are skipped individually with a diagnostic and never
/// abort the aggregation. A missing log file yields an empty map.
pub fn aggregate(log: &UsageLog) -> Result<BTreeMap<String, MetricsSummary>, Error> {
    let mut folds: BTreeMap<String, Fold> = BTreeMap::new();

    let file = match std::fs::File::open(log.path()) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };

    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // A line must at least be a JSON object to count as a record.
        let record = match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(record)) => record,
            _ => {
                warn!("Skipping malformed usage log line {}", lineno + 1);
                continue;
            }
        };

        // An absent or empty id buckets under the unknown marker.
        let id = record
            .get("prompt_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .unwrap_or(UNKNOWN_ID)
            .to_string();
        folds.entry(id).or_default().absorb(&record);
    }

    Ok(folds
        .into_iter()
        .map(|(id, fold)| (id, fold.finish()))
        .collect())
}
