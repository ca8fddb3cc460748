//! Error taxonomy shared by every module of the crate

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while defining, simulating, analysing or exporting tables
#[derive(Debug, Error)]
pub enum ClusterMakerError {
    /// Invalid argument values: empty or inconsistent specs, bad counts or scales
    #[error("usage error: {0}")]
    Usage(String),

    /// Argument has the wrong shape (e.g. `reps` is not a sequence)
    #[error("type error: {0}")]
    Type(String),

    /// Source file is missing
    #[error("no such file: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Destination directory is missing
    #[error("directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("no numeric columns found in the table")]
    NoNumericColumns,

    #[error("failed to render plot: {0}")]
    Plot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ClusterMakerError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }
}
