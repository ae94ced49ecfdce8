//! CLI errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced to the command line.
#[derive(Debug, Error)]
pub enum Error {
    /// Engine error.
    #[error(transparent)]
    Core(#[from] ormadmin_core::Error),

    /// A file could not be read or written.
    #[error("{path}: {source}")]
    File {
        /// File involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A config or data file is not valid JSON for its shape.
    #[error("{path}: {source}")]
    Parse {
        /// File involved.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// JSON output failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error writing output.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A `--filter` argument without `=`.
    #[error("invalid filter `{0}`: expected key=value")]
    InvalidFilter(String),

    /// No registered admin matches the model argument.
    #[error("no admin for `{0}`")]
    UnknownAdmin(String),
}

/// Result alias for the CLI.
pub type Result<T> = std::result::Result<T, Error>;
