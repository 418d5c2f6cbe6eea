//! Definition store: load-once registry of versioned prompt definitions.
//!
//! [`Registry::load`] scans a directory of YAML definition documents at
//! process start. Loading is best-effort per document: a file that fails to
//! parse or lacks a `prompt_id` is skipped with a diagnostic, never fatal
//! to the whole load. The resulting [`Registry`] is immutable and shared
//! read-only by every other component.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::version;

/// One version of a prompt template, as loaded from a definition document.
///
/// Immutable once constructed. Optional document fields are defaulted at
/// load time, so consumers never see an absent schema or example list.
#[derive(Debug, Clone, Serialize)]
pub struct Definition {
    /// Identifier grouping all versions of this template.
    pub prompt_id: String,
    /// Version string as declared; semantic-version-shaped but not enforced.
    pub version: String,
    /// Template body, rendered under strict-undefined semantics.
    pub template: String,
    /// Example input bindings declared by the author.
    pub example_inputs: Vec<Map<String, Value>>,
    /// JSON Schema for the expected response; empty means no validation.
    pub expected_output_schema: Map<String, Value>,
    /// File name of the source document.
    pub source_file: String,
    /// UTC timestamp of when the document was loaded.
    pub loaded_at: String,
}

/// Raw shape of a definition document before defaulting and provenance.
#[derive(Deserialize)]
struct RawDefinition {
    prompt_id: Option<String>,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    template: String,
    #[serde(default)]
    example_inputs: Vec<Map<String, Value>>,
    #[serde(default)]
    expected_output_schema: Map<String, Value>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

/// Read-only index of definitions, grouped by id and sorted by version
/// (newest first).
///
/// Built once by [`Registry::load`] and handed to all other components as
/// a shared value; nothing mutates it after construction.
#[derive(Debug, Default)]
pub struct Registry {
    index: BTreeMap<String, Vec<Definition>>,
    /// Number of documents skipped during the load.
    pub skipped: usize,
}

impl Registry {
    /// Load all `.yaml`/`.yml` documents under `dir`.
    ///
    /// Directory entries are visited in file-name order so equal-version
    /// ties break deterministically. An unreadable directory yields an
    /// empty registry with a diagnostic; reachability is the health
    /// endpoint's concern, not the loader's.
    pub fn load(dir: &Path) -> Registry {
        let mut registry = Registry::default();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read prompts directory {}: {e}", dir.display());
                return registry;
            }
        };

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("yaml" | "yml")
                )
            })
            .collect();
        paths.sort();

        for path in paths {
            match load_document(&path) {
                Some(definition) => {
                    debug!(
                        "Loaded {} v{} from {}",
                        definition.prompt_id, definition.version, definition.source_file
                    );
                    registry
                        .index
                        .entry(definition.prompt_id.clone())
                        .or_default()
                        .push(definition);
                }
                None => registry.skipped += 1,
            }
        }

        for versions in registry.index.values_mut() {
            sort_versions(versions);
        }

        info!(
            "Registry loaded: {} ids, {} skipped documents",
            registry.index.len(),
            registry.skipped
        );
        registry
    }

    /// Resolve a definition by id and optional exact version.
    ///
    /// With no version, returns the highest-ordered entry. With a version,
    /// matches by string equality — `"1.0"` and `"1.0.0"` are distinct.
    /// Pure lookup; no side effects.
    pub fn resolve(&self, id: &str, version: Option<&str>) -> Result<&Definition, Error> {
        let candidates = self.index.get(id).ok_or_else(|| Error::not_found(id))?;
        match version {
            None => candidates.first().ok_or_else(|| Error::not_found(id)),
            Some(wanted) => candidates
                .iter()
                .find(|d| d.version == wanted)
                .ok_or_else(|| Error::version_not_found(id, wanted)),
        }
    }

    /// All registered ids, in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// All versions registered for an id, newest first.
    pub fn versions(&self, id: &str) -> Option<&[Definition]> {
        self.index.get(id).map(Vec::as_slice)
    }

    /// Number of distinct ids in the registry.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the registry holds no definitions at all.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Parse one document, defaulting optional fields and stamping provenance.
/// Returns `None` (with a diagnostic) if the document is unparseable or
/// its `prompt_id` is absent or empty.
fn load_document(path: &Path) -> Option<Definition> {
    let source_file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Skipping {}: unreadable: {e}", path.display());
            return None;
        }
    };

    let raw: RawDefinition = match serde_yaml::from_str(&contents) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Skipping {}: parse error: {e}", path.display());
            return None;
        }
    };

    let prompt_id = match raw.prompt_id {
        Some(id) if !id.is_empty() => id,
        _ => {
            warn!("Skipping {}: missing prompt_id", path.display());
            return None;
        }
    };

    Some(Definition {
        prompt_id,
        version: raw.version,
        template: raw.template,
        example_inputs: raw.example_inputs,
        expected_output_schema: raw.expected_output_schema,
        source_file,
        loaded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
    })
}

/// Sort a group descending by version, preserving load order for ties.
///
/// If every version in the group parses as dotted-numeric, the group is
/// ordered by numeric precedence; otherwise the whole group falls back to
/// descending lexical order. Each version is parsed once; the probe keys
/// are reused for the sort itself.
fn sort_versions(versions: &mut Vec<Definition>) {
    let keys: Option<Vec<Vec<u64>>> = versions
        .iter()
        .map(|d| version::parse_numeric(&d.version))
        .collect();

    match keys {
        Some(keys) => {
            let mut keyed: Vec<(Reverse<Vec<u64>>, Definition)> =
                keys.into_iter().map(Reverse).zip(versions.drain(..)).collect();
            // Stable sort keeps load order for equal versions.
            keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
            versions.extend(keyed.into_iter().map(|(_, definition)| definition));
        }
        None => versions.sort_by(|a, b| b.version.cmp(&a.version)),
    }
}
