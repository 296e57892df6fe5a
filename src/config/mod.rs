// src/config/mod.rs

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// The configuration resource. Only `sheets.public.url` is required.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub sheets: Sheets,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Sheets {
    pub public: PublicSheet,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PublicSheet {
    pub url: String,
}

impl Config {
    /// Load a JSON or YAML config file, picking the parser from the extension.
    ///
    /// A missing or unreadable file, a parse failure or a missing
    /// `sheets.public.url` key is reported as [`Error::NotFound`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::not_found("default sheet config", path));
        }

        let text = fs::read_to_string(path)
            .map_err(|e| Error::not_found(format!("default sheet config ({e})"), path))?;
        let parsed = match extension(path).as_deref() {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str::<Config>(&text).map_err(|e| e.to_string())
            }
            _ => serde_json::from_str::<Config>(&text).map_err(|e| e.to_string()),
        };

        let config = parsed.map_err(|reason| {
            debug!(path = %path.display(), %reason, "config rejected");
            Error::not_found(format!("sheets.public.url ({reason})"), path)
        })?;

        info!(path = %path.display(), "found sheet url in config");
        Ok(config)
    }

    pub fn default_url(&self) -> &str {
        &self.sheets.public.url
    }
}

/// `<data_dir>/config.json`
pub fn default_path(data_dir: impl AsRef<Path>) -> PathBuf {
    data_dir.as_ref().join(CONFIG_FILE)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
