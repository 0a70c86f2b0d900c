// src/error.rs

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Fatal conditions for a pipeline run.
///
/// Recoverable problems (malformed lines, hits without taxonomy) never
/// show up here; they go to the [`Diagnostics`](crate::diagnostics::Diagnostics)
/// sink and processing continues.
#[derive(Error, Debug)]
pub enum AmpliconError {
    /// File could not be opened, read or written
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON input could not be decoded, or a record could not be encoded
    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from a tabular input
    #[error("{} is missing required column '{field}'", .path.display())]
    MissingField { path: PathBuf, field: String },

    /// The search tool could not be started at all
    #[error("failed to launch {tool}: {source}")]
    SearchToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The search tool ran but exited unsuccessfully
    #[error("{tool} exited with {status}: {stderr}")]
    SearchToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },
}

impl AmpliconError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AmpliconError::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        AmpliconError::Json { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, AmpliconError>;
