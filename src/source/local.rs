// src/source/local.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::{fs, path::Path};
use tracing::debug;

use crate::error::{Error, Result};
use crate::rows::{PlainRows, RowSet};
use crate::store::RowReader;

/// Header given to the single column of a `.txt` list.
pub const TXT_COLUMN: &str = "item";

// List markers: "1. foo", "- foo", " foo".
static NUMBER_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1. ]*").unwrap());
static DASH_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[- ]*").unwrap());

/// Read a local `.csv` or `.txt` file; any other extension is rejected.
pub fn read_file(path: &Path) -> Result<RowSet> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => Ok(RowSet::Plain(read_csv(path)?)),
        Some("txt") => Ok(RowSet::Plain(read_txt(path)?)),
        _ => Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// First record is the header; blank records are skipped.
pub fn read_csv(path: &Path) -> Result<PlainRows> {
    debug!(path = %path.display(), "reading csv");
    RowReader::open(path, "csv file")?.into_rowset()
}

/// One item per line, list markers stripped, under a single `item` column.
pub fn read_txt(path: &Path) -> Result<PlainRows> {
    debug!(path = %path.display(), "reading txt");
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::not_found("txt file", path),
        _ => Error::io(path, e),
    })?;

    let rows = text
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(|line| vec![line.to_string()])
        .collect();

    Ok(PlainRows::new(vec![TXT_COLUMN.to_string()], rows))
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim_end_matches('\r');
    let line = &line[NUMBER_MARKER.find(line).map_or(0, |m| m.end())..];
    &line[DASH_MARKER.find(line).map_or(0, |m| m.end())..]
}
