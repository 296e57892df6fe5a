// src/source/mod.rs
//
// Source Reader: turns a local file or a published sheet URL into a RowSet.

pub mod local;
pub mod sheet;

use reqwest::Client;
use std::{
    fmt,
    path::{Path, PathBuf},
};
use tracing::info;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::rows::RowSet;

/// Where the rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A local `.csv` or `.txt` file.
    File(PathBuf),
    /// A published spreadsheet export.
    Sheet(Url),
}

impl Source {
    /// Pick the source for a reload.
    ///
    /// An explicit `url` wins, then an explicit `file`; otherwise the default
    /// sheet URL is read from the config file at `config_path`.
    pub fn resolve(url: Option<&str>, file: Option<&Path>, config_path: &Path) -> Result<Self> {
        if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
            return Self::sheet(url);
        }
        if let Some(file) = file {
            return Ok(Source::File(file.to_path_buf()));
        }
        let config = Config::load(config_path)?;
        Self::sheet(config.default_url())
    }

    pub fn sheet(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| Error::Unreachable {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Source::Sheet(parsed))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Sheet(url) => write!(f, "{}", url),
        }
    }
}

/// Fetches rows from a [`Source`]. Holds the HTTP client used for sheets.
#[derive(Debug, Clone, Default)]
pub struct SourceReader {
    client: Client,
}

impl SourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn read(&self, source: &Source) -> Result<RowSet> {
        let rows = match source {
            Source::File(path) => local::read_file(path)?,
            Source::Sheet(url) => RowSet::Tabular(sheet::fetch_sheet(&self.client, url).await?),
        };
        info!(%source, rows = rows.len(), "loaded source");
        Ok(rows)
    }

    /// Headless rendering of `source`: one `", "`-joined line per data row.
    pub async fn read_values(&self, source: &Source) -> Result<Vec<String>> {
        Ok(self.read(source).await?.values())
    }
}
