//! Versioned prompt registry with strict rendering, usage logging, and
//! streaming metrics.
//!
//! `promptdeck` keeps a directory of YAML prompt definitions indexed in an
//! immutable, load-once [`Registry`], renders templates under
//! strict-undefined semantics, and appends every usage event to an
//! append-only JSONL log that a metrics fold can replay on demand.
//!
//! # Getting started
//!
//! ```no_run
//! use promptdeck::{Registry, UsageLog, render};
//! use std::path::Path;
//!
//! // Load once at startup; the registry is read-only afterwards.
//! let registry = Registry::load(Path::new("prompts"));
//!
//! // Resolve the newest version and render it.
//! let def = registry.resolve("greeting", None)?;
//! let vars = serde_json::json!({"name": "Ada"});
//! let rendered = render(def, vars.as_object().unwrap())?;
//!
//! // Record the usage event.
//! let log = UsageLog::new("prompt_usage.jsonl");
//! log.record(&registry, "greeting", &def.version,
//!     vars.as_object().unwrap().clone(),
//!     serde_json::Map::new(), 12.5, None)?;
//! # Ok::<(), promptdeck::Error>(())
//! ```
//!
//! # Where to find things
//!
//! - **Load and resolve definitions:** [`store::Registry`] — best-effort
//!   directory load, descending version order, exact-string version lookup.
//! - **Render a template:** [`render::render`] — minijinja with strict
//!   undefined; a missing variable is a hard error naming it.
//! - **Record usage:** [`usage::UsageLog`] — one atomic JSON line per
//!   event, with advisory schema validation attached as metadata.
//! - **Summarize usage:** [`metrics::aggregate`] — full-log streaming fold
//!   into per-id [`metrics::MetricsSummary`] values.

pub mod error;
pub mod metrics;
pub mod render;
pub mod store;
pub mod usage;
pub mod validate;
pub mod version;

pub use error::Error;
pub use metrics::{MetricsSummary, aggregate};
pub use render::render;
pub use store::{Definition, Registry};
pub use usage::{UsageLog, UsageRecord, VALIDATION_ERROR_KEY};
