//! Append-only usage log.
//!
//! Every rendering/use event is captured as one immutable [`UsageRecord`]
//! and appended as a single JSON line to a durable log file. Records are
//! never edited or deleted; the log grows monotonically for the life of
//! the process and beyond.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Error;
use crate::store::Registry;
use crate::validate::validate_response;

/// Metadata key under which a validation failure is recorded.
pub const VALIDATION_ERROR_KEY: &str = "validation_error";

/// One usage event: what was sent, what came back, and how long it took.
///
/// Immutable once written. The timestamp is the time of recording, not of
/// the original request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageRecord {
    /// RFC 3339 UTC timestamp of the append.
    pub timestamp: String,
    /// Identifier of the prompt used.
    pub prompt_id: String,
    /// Caller-declared version; not necessarily one the registry knows.
    pub version: String,
    /// Variables the caller rendered with.
    pub input: Map<String, Value>,
    /// Model response payload.
    pub response: Map<String, Value>,
    /// Request latency in milliseconds.
    pub latency_ms: f64,
    /// Caller metadata, possibly annotated with a validation error.
    pub metadata: Map<String, Value>,
}

/// Append-only JSONL log backed by a single file.
///
/// The file is lazily created on first append. Appends from concurrent
/// workers serialize through a mutex and each record goes out as one
/// `write_all` of a complete line, so a reader never observes a partial
/// record.
#[derive(Debug)]
pub struct UsageLog {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl UsageLog {
    /// Create a handle to a log file. The file itself is not touched until
    /// the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one usage event and return the appended record.
    ///
    /// `(prompt_id, version)` is resolved against the registry purely to
    /// obtain the declared output schema; an unresolved pair annotates the
    /// record's metadata rather than aborting. A non-empty schema triggers
    /// advisory validation whose failure is likewise attached under
    /// [`VALIDATION_ERROR_KEY`]. Usage is always durably recorded
    /// regardless of payload shape — only an I/O fault on the append
    /// itself fails the call.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        registry: &Registry,
        prompt_id: &str,
        version: &str,
        input: Map<String, Value>,
        response: Map<String, Value>,
        latency_ms: f64,
        metadata: Option<Map<String, Value>>,
    ) -> Result<UsageRecord, Error> {
        let validation_error = match registry.resolve(prompt_id, Some(version)) {
            Ok(definition) if !definition.expected_output_schema.is_empty() => {
                validate_response(&definition.expected_output_schema, &response)
            }
            Ok(_) => None,
            // Traceability note, not a failure: the caller may log usage of
            // versions the registry never saw.
            Err(_) => Some("prompt metadata not found".to_string()),
        };

        let mut metadata = metadata.unwrap_or_default();
        if let Some(error) = validation_error {
            metadata.insert(VALIDATION_ERROR_KEY.to_string(), Value::String(error));
        }

        let record = UsageRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            prompt_id: prompt_id.to_string(),
            version: version.to_string(),
            input,
            response,
            latency_ms,
            metadata,
        };

        self.append(&record)?;
        Ok(record)
    }

    /// Append one record as a self-contained JSON line.
    fn append(&self, record: &UsageRecord) -> Result<(), Error> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.append_lock.lock().unwrap();
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        debug!(
            "Appended usage record for {} v{}",
            record.prompt_id, record.version
        );
        Ok(())
    }
}
