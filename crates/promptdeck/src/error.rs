//! Error types for registry lookup, rendering, and log persistence.

use thiserror::Error;

/// Errors surfaced by the core registry operations.
///
/// `NotFound` and the two render variants are client-input errors and map
/// to 4xx at the HTTP boundary. `Io`/`Json` come from the usage-log write
/// path and abort only the write attempt that hit them, never the process.
#[derive(Debug, Error)]
pub enum Error {
    /// No prompt registered under this id, or no entry with the requested
    /// version string.
    #[error("prompt '{id}' not found{}", match version {
        Some(v) => format!(" at version '{v}'"),
        None => String::new(),
    })]
    NotFound { id: String, version: Option<String> },

    /// The template referenced variables absent from the supplied inputs.
    #[error("missing template variables: {}", variables.join(", "))]
    MissingVariables { variables: Vec<String> },

    /// The template failed to parse or evaluate.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Usage-log file could not be created, opened, or appended to.
    #[error("usage log I/O: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized for the log.
    #[error("record serialization: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Construct a `NotFound` for an id-only lookup.
    pub fn not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            id: id.into(),
            version: None,
        }
    }

    /// Construct a `NotFound` for an exact-version lookup.
    pub fn version_not_found(id: impl Into<String>, version: impl Into<String>) -> Self {
        Error::NotFound {
            id: id.into(),
            version: Some(version.into()),
        }
    }
}
