// src/error.rs

use std::path::PathBuf;

/// Everything the source reader, shuffle store and picker can fail with.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A persisted set or configuration resource is missing or unusable.
    #[error("not found: {what} ({})", .path.display())]
    NotFound { what: String, path: PathBuf },

    /// The remote sheet could not be fetched.
    #[error("unable to fetch {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// Local files must be `.csv` or `.txt`.
    #[error("unsupported file format {path:?}; expected one of .csv, .txt")]
    UnsupportedFormat { path: PathBuf },

    /// The working set has no data rows left to pop.
    #[error("working set is empty")]
    Empty,

    #[error("malformed record in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn not_found(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::NotFound {
            what: what.into(),
            path: path.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Error::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
