// src/store/records.rs
//
// Comma-delimited record files: a header row followed by data rows.

use csv::{ReaderBuilder, StringRecordsIntoIter, WriterBuilder};
use std::{
    fs::{self, File},
    io::{self, BufWriter},
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::error::{Error, Result};
use crate::rows::{PlainRows, Row};

/// Lazy reader over a record file. Yields the header first, then data rows.
///
/// Data records whose fields are all empty are skipped.
pub struct RowReader {
    path: PathBuf,
    records: StringRecordsIntoIter<File>,
    header_read: bool,
}

impl RowReader {
    /// Open `path`; a missing file is reported as [`Error::NotFound`] for `what`.
    pub fn open(path: &Path, what: &str) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::not_found(what, path),
            _ => Error::io(path, e),
        })?;
        let records = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file)
            .into_records();
        Ok(Self {
            path: path.to_path_buf(),
            records,
            header_read: false,
        })
    }

    /// Drain the reader into a header plus rows. An empty file gives an empty header.
    pub fn into_rowset(mut self) -> Result<PlainRows> {
        let header = self.next().transpose()?.unwrap_or_default();
        let rows = self.collect::<Result<Vec<_>>>()?;
        Ok(PlainRows::new(header, rows))
    }
}

impl Iterator for RowReader {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(r) => r,
                Err(e) => return Some(Err(Error::csv(&self.path, e))),
            };
            if self.header_read && record.iter().all(str::is_empty) {
                continue;
            }
            self.header_read = true;
            return Some(Ok(record.iter().map(str::to_string).collect()));
        }
    }
}

/// Write `header` and `rows` to `path` via a sibling `.tmp` file and a rename,
/// so a reader sees either the old file or the complete new one.
///
/// The `.tmp` file is removed again if any step fails.
pub fn write_rows(path: &Path, header: &[String], rows: impl IntoIterator<Item = Row>) -> Result<()> {
    let tmp = tmp_path(path);
    let written = write_tmp(&tmp, header, rows)
        .and_then(|_| fs::rename(&tmp, path).map_err(|e| Error::io(path, e)));
    if written.is_err() {
        if let Err(e) = fs::remove_file(&tmp) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %e, "failed to remove tmp file");
            }
        }
    }
    written
}

fn write_tmp(tmp: &Path, header: &[String], rows: impl IntoIterator<Item = Row>) -> Result<()> {
    let file = File::create(tmp).map_err(|e| Error::io(tmp, e))?;
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .from_writer(BufWriter::new(file));

    writer.write_record(header).map_err(|e| Error::csv(tmp, e))?;
    for row in rows {
        writer.write_record(&row).map_err(|e| Error::csv(tmp, e))?;
    }

    writer.flush().map_err(|e| Error::io(tmp, e))?;
    writer
        .get_ref()
        .get_ref()
        .sync_all()
        .map_err(|e| Error::io(tmp, e))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
