// src/rows/mod.rs

use rand::{seq::SliceRandom, Rng};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, warn};

/// Column names, shared by every row of a set.
pub type Header = Vec<String>;

/// One record; every value is kept as text.
pub type Row = Vec<String>;

/// A header plus row-major records, e.g. as read from a local CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainRows {
    pub header: Header,
    pub rows: Vec<Row>,
}

impl PlainRows {
    pub fn new(header: Header, rows: Vec<Row>) -> Self {
        Self { header, rows }
    }
}

/// A single named column of a [`TabularRows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub values: Vec<String>,
}

/// Column-major table, as produced from a remote sheet export.
///
/// Every column always holds exactly `len` values; short rows are padded with
/// empty strings and surplus fields are dropped when pushed. Rows left with
/// only empty fields are not kept, matching what the record files persist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularRows {
    columns: Vec<Column>,
    len: usize,
}

impl TabularRows {
    pub fn new(header: Header) -> Self {
        Self {
            columns: header
                .into_iter()
                .map(|name| Column {
                    name,
                    values: Vec::new(),
                })
                .collect(),
            len: 0,
        }
    }

    pub fn from_rows(header: Header, rows: impl IntoIterator<Item = Row>) -> Self {
        let mut table = Self::new(header);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, row: Row) {
        if row.iter().take(self.columns.len()).all(String::is_empty) {
            debug!(fields = row.len(), "skipping blank row");
            return;
        }
        if row.len() > self.columns.len() {
            warn!(
                expected = self.columns.len(),
                got = row.len(),
                "dropping surplus fields from row"
            );
        }
        let mut fields = row.into_iter();
        for column in &mut self.columns {
            column.values.push(fields.next().unwrap_or_default());
        }
        self.len += 1;
    }

    pub fn header(&self) -> Header {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Materialize row `idx` across all columns.
    pub fn row(&self, idx: usize) -> Option<Row> {
        if idx >= self.len {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[idx].clone()).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.len).filter_map(move |idx| self.row(idx))
    }

    /// Return a copy of the table with its rows in a random order.
    ///
    /// One permutation is drawn and applied to every column so rows stay intact.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TabularRows {
        let mut order: Vec<usize> = (0..self.len).collect();
        order.shuffle(rng);

        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: order.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();

        TabularRows {
            columns,
            len: self.len,
        }
    }
}

/// A header plus ordered rows, tagged by how the rows are laid out.
///
/// The shuffle store picks its shuffling strategy from the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSet {
    Plain(PlainRows),
    Tabular(TabularRows),
}

impl RowSet {
    pub fn header(&self) -> Header {
        match self {
            RowSet::Plain(plain) => plain.header.clone(),
            RowSet::Tabular(table) => table.header(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RowSet::Plain(plain) => plain.rows.len(),
            RowSet::Tabular(table) => table.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rows(&self) -> Box<dyn Iterator<Item = Row> + '_> {
        match self {
            RowSet::Plain(plain) => Box::new(plain.rows.iter().cloned()),
            RowSet::Tabular(table) => Box::new(table.rows()),
        }
    }

    /// Headless rendering: each row's values joined with `", "`.
    pub fn values(&self) -> Vec<String> {
        self.rows().map(|row| row.join(", ")).collect()
    }

    /// Pair every row with the header.
    pub fn items(&self) -> Vec<Item> {
        let header = self.header();
        self.rows().map(|row| Item::new(&header, row)).collect()
    }
}

impl From<PlainRows> for RowSet {
    fn from(plain: PlainRows) -> Self {
        RowSet::Plain(plain)
    }
}

impl From<TabularRows> for RowSet {
    fn from(table: TabularRows) -> Self {
        RowSet::Tabular(table)
    }
}

/// A row paired with its header, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    fields: Vec<(String, String)>,
}

impl Item {
    /// Zip `header` with `row`; the shorter of the two decides the length.
    pub fn new(header: &[String], row: Row) -> Self {
        Self {
            fields: header.iter().cloned().zip(row).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn joined_values(&self) -> String {
        self.fields
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
