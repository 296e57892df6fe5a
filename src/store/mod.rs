// src/store/mod.rs

mod records;

pub use records::{write_rows, RowReader};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::rows::{Header, Row, RowSet};

/// File holding the full set, as last loaded from a source.
pub const SONGS_FILE: &str = "songs.csv";
/// File holding the shrinking, shuffled working set.
pub const SHUFFLED_FILE: &str = "shuffled.csv";

/// Durable storage for the full set and the working set.
///
/// Writes go through a store-wide lock and land via tmp-file + rename, so
/// concurrent callers never see a partially written working set.
pub struct ShuffleStore {
    dir: PathBuf,
    songs_path: PathBuf,
    shuffled_path: PathBuf,
    rng: Mutex<StdRng>,
    write_lock: Mutex<()>,
}

impl ShuffleStore {
    /// Open a store in `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_rng(dir, StdRng::from_os_rng())
    }

    /// Same as [`ShuffleStore::new`] but with a reproducible shuffle order.
    pub fn with_seed(dir: impl Into<PathBuf>, seed: u64) -> Result<Self> {
        Self::with_rng(dir, StdRng::seed_from_u64(seed))
    }

    fn with_rng(dir: impl Into<PathBuf>, rng: StdRng) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(Self {
            songs_path: dir.join(SONGS_FILE),
            shuffled_path: dir.join(SHUFFLED_FILE),
            dir,
            rng: Mutex::new(rng),
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Overwrite the full set, keeping row order.
    #[instrument(level = "debug", skip_all, fields(rows = rows.len()))]
    pub fn save_full(&self, rows: &RowSet) -> Result<()> {
        let _guard = self.lock();
        write_rows(&self.songs_path, &rows.header(), rows.rows())?;
        debug!(path = %self.songs_path.display(), "wrote full set");
        Ok(())
    }

    /// Overwrite the working set with a random permutation of `rows`.
    ///
    /// Tabular sets are sampled column-wise; plain sets are shuffled in place.
    #[instrument(level = "debug", skip_all, fields(rows = rows.len()))]
    pub fn save_working(&self, rows: &RowSet) -> Result<()> {
        let _guard = self.lock();
        self.write_working(rows)
    }

    fn write_working(&self, rows: &RowSet) -> Result<()> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        match rows {
            RowSet::Tabular(table) => {
                let sampled = table.sample(&mut *rng);
                write_rows(&self.shuffled_path, &sampled.header(), sampled.rows())?;
            }
            RowSet::Plain(plain) => {
                let mut shuffled = plain.rows.clone();
                shuffled.shuffle(&mut *rng);
                write_rows(&self.shuffled_path, &plain.header, shuffled)?;
            }
        }
        debug!(path = %self.shuffled_path.display(), "wrote working set");
        Ok(())
    }

    /// Lazily read the full set, header first.
    pub fn load_full(&self) -> Result<RowReader> {
        RowReader::open(&self.songs_path, "full set")
    }

    /// Lazily read the working set, header first.
    pub fn load_working(&self) -> Result<RowReader> {
        RowReader::open(&self.shuffled_path, "working set")
    }

    /// Drop the first data row of the working set.
    ///
    /// Fails with [`Error::Empty`] when no data rows remain; the file is left
    /// untouched in that case.
    pub fn pop_working(&self) -> Result<()> {
        self.take_working().map(|_| ())
    }

    /// Remove the first data row of the working set and hand it back with
    /// the header, in one locked read-rewrite.
    pub(crate) fn take_working(&self) -> Result<(Header, Row)> {
        let _guard = self.lock();
        self.take_first()
    }

    /// Like [`ShuffleStore::take_working`], but an empty working set is
    /// refilled from the full set under the same lock and `None` is returned.
    ///
    /// No other writer can run between finding the set empty and refilling
    /// it, so every row is handed out once per round.
    pub(crate) fn take_or_reshuffle(&self) -> Result<Option<(Header, Row)>> {
        let _guard = self.lock();
        match self.take_first() {
            Ok(taken) => Ok(Some(taken)),
            Err(Error::Empty) => {
                self.refill()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn take_first(&self) -> Result<(Header, Row)> {
        let set = self.load_working()?.into_rowset()?;
        let mut rows = set.rows.into_iter();
        let first = rows.next().ok_or(Error::Empty)?;

        write_rows(&self.shuffled_path, &set.header, rows)?;
        Ok((set.header, first))
    }

    /// Data rows left in the working set.
    pub fn working_len(&self) -> Result<usize> {
        count_rows(self.load_working()?)
    }

    /// Data rows in the full set.
    pub fn full_len(&self) -> Result<usize> {
        count_rows(self.load_full()?)
    }

    /// Reshuffle the full set into a new working set.
    pub fn reshuffle(&self) -> Result<usize> {
        let _guard = self.lock();
        self.refill()
    }

    fn refill(&self) -> Result<usize> {
        let full = RowSet::Plain(self.load_full()?.into_rowset()?);
        self.write_working(&full)?;
        info!(rows = full.len(), "reshuffled working set from full set");
        Ok(full.len())
    }

    // Not reentrant: helpers called with the guard held must not lock again.
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn count_rows(reader: RowReader) -> Result<usize> {
    let mut n = 0;
    // skip the header
    for row in reader.skip(1) {
        row?;
        n += 1;
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::{PlainRows, TabularRows};
    use tempfile::tempdir;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn plain(n: usize) -> RowSet {
        RowSet::Plain(PlainRows::new(
            strings(&["id", "title"]),
            (0..n).map(|i| vec![i.to_string(), format!("song {}", i)]).collect(),
        ))
    }

    fn sorted_rows(reader: RowReader) -> (Header, Vec<Row>) {
        let set = reader.into_rowset().unwrap();
        let mut rows = set.rows;
        rows.sort();
        (set.header, rows)
    }

    #[test]
    fn test_load_before_save_is_not_found() {
        let tmp = tempdir().unwrap();
        let store = ShuffleStore::new(tmp.path()).unwrap();
        assert!(matches!(store.load_full().err().unwrap(), Error::NotFound { .. }));
        assert!(matches!(store.load_working().err().unwrap(), Error::NotFound { .. }));
        assert!(matches!(store.pop_working(), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_save_full_keeps_order() {
        let tmp = tempdir().unwrap();
        let store = ShuffleStore::new(tmp.path()).unwrap();
        let rows = plain(5);
        store.save_full(&rows).unwrap();

        let set = store.load_full().unwrap().into_rowset().unwrap();
        assert_eq!(RowSet::Plain(set), rows);
    }

    #[test]
    fn test_save_working_is_permutation() {
        let tmp = tempdir().unwrap();
        let store = ShuffleStore::with_seed(tmp.path(), 42).unwrap();
        let rows = plain(20);
        store.save_working(&rows).unwrap();

        let (header, got) = sorted_rows(store.load_working().unwrap());
        let mut want: Vec<Row> = rows.rows().collect();
        want.sort();
        assert_eq!(header, rows.header());
        assert_eq!(got, want);
    }

    #[test]
    fn test_save_working_tabular_is_permutation() {
        let tmp = tempdir().unwrap();
        let store = ShuffleStore::with_seed(tmp.path(), 3).unwrap();
        let table = TabularRows::from_rows(
            strings(&["id", "col1", "col2"]),
            vec![strings(&["A", "a", "x"]), strings(&["B", "b", "y"]), strings(&["C", "c", "z"])],
        );
        let rows = RowSet::Tabular(table);
        store.save_working(&rows).unwrap();

        let (header, got) = sorted_rows(store.load_working().unwrap());
        assert_eq!(header, strings(&["id", "col1", "col2"]));
        assert_eq!(got, rows.rows().collect::<Vec<_>>());
    }

    #[test]
    fn test_pop_shrinks_and_keeps_header() {
        let tmp = tempdir().unwrap();
        let store = ShuffleStore::new(tmp.path()).unwrap();
        store.save_working(&plain(3)).unwrap();

        let before: Vec<Row> = store.load_working().unwrap().collect::<Result<_>>().unwrap();
        store.pop_working().unwrap();
        let after: Vec<Row> = store.load_working().unwrap().collect::<Result<_>>().unwrap();

        assert_eq!(after[0], strings(&["id", "title"]));
        assert_eq!(after.len(), before.len() - 1);
        assert_eq!(&after[1..], &before[2..]);
        assert!(!tmp.path().join("shuffled.csv.tmp").exists());
    }

    #[test]
    fn test_pop_empty_is_empty_error() {
        let tmp = tempdir().unwrap();
        let store = ShuffleStore::new(tmp.path()).unwrap();
        store.save_working(&plain(1)).unwrap();

        store.pop_working().unwrap();
        assert_eq!(store.working_len().unwrap(), 0);
        assert!(matches!(store.pop_working(), Err(Error::Empty)));

        let set = store.load_working().unwrap().into_rowset().unwrap();
        assert_eq!(set.header, strings(&["id", "title"]));
    }

    #[test]
    fn test_reshuffle_restores_full_count() {
        let tmp = tempdir().unwrap();
        let store = ShuffleStore::new(tmp.path()).unwrap();
        let rows = plain(4);
        store.save_full(&rows).unwrap();
        store.save_working(&rows).unwrap();
        for _ in 0..4 {
            store.pop_working().unwrap();
        }

        assert_eq!(store.reshuffle().unwrap(), 4);
        assert_eq!(store.working_len().unwrap(), 4);
        assert_eq!(store.full_len().unwrap(), 4);
    }

    #[test]
    fn test_concurrent_pops_never_lose_rows() {
        use std::sync::Arc;
        use std::thread;

        let tmp = tempdir().unwrap();
        let store = Arc::new(ShuffleStore::new(tmp.path()).unwrap());
        store.save_working(&plain(40)).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut taken = Vec::new();
                    for _ in 0..10 {
                        taken.push(store.take_working().unwrap().1);
                    }
                    taken
                })
            })
            .collect();

        let mut all: Vec<Row> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 40);
        assert_eq!(store.working_len().unwrap(), 0);
    }

    #[test]
    fn test_take_or_reshuffle_refills_once() {
        let tmp = tempdir().unwrap();
        let store = ShuffleStore::new(tmp.path()).unwrap();
        let rows = plain(2);
        store.save_full(&rows).unwrap();
        store.save_working(&rows).unwrap();

        assert!(store.take_or_reshuffle().unwrap().is_some());
        assert!(store.take_or_reshuffle().unwrap().is_some());
        assert!(store.take_or_reshuffle().unwrap().is_none());
        assert_eq!(store.working_len().unwrap(), 2);
        assert!(store.take_or_reshuffle().unwrap().is_some());
    }
}
