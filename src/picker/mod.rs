// src/picker/mod.rs
//
// Shuffle/consume/reset state machine over a ShuffleStore.

pub mod sequence;

pub use sequence::{shuffle_picks, PickResult};

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;
use crate::rows::{Item, RowSet};
use crate::store::ShuffleStore;

/// Outcome of [`Picker::pick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    /// The next row, paired with its header.
    Item(Item),
    /// The working set was empty and has been refilled from the full set.
    /// No item is returned on this call; pick again for the next one.
    Reset,
}

/// Whether the working set still has rows to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    HasItems,
    Exhausted,
}

/// Hands out one random, non-repeating row per call.
#[derive(Clone)]
pub struct Picker {
    store: Arc<ShuffleStore>,
}

impl Picker {
    pub fn new(store: Arc<ShuffleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ShuffleStore {
        &self.store
    }

    /// Replace both sets with freshly loaded rows. Returns the row count.
    pub fn load(&self, rows: &RowSet) -> Result<usize> {
        self.store.save_full(rows)?;
        self.store.save_working(rows)?;
        info!(rows = rows.len(), "loaded new full set");
        Ok(rows.len())
    }

    /// Take the next row from the working set.
    ///
    /// When the working set is exhausted it is refilled, in a new random order,
    /// from the full set and [`Pick::Reset`] is returned instead of an item.
    /// Fails with [`crate::Error::NotFound`] if nothing has been loaded yet.
    pub fn pick(&self) -> Result<Pick> {
        match self.store.take_or_reshuffle()? {
            Some((header, row)) => {
                let item = Item::new(&header, row);
                debug!(item = %item.joined_values(), "picked");
                Ok(Pick::Item(item))
            }
            None => {
                info!("end of items, restarting");
                Ok(Pick::Reset)
            }
        }
    }

    pub fn state(&self) -> Result<PickerState> {
        Ok(if self.remaining()? == 0 {
            PickerState::Exhausted
        } else {
            PickerState::HasItems
        })
    }

    /// Rows left before the next reset.
    pub fn remaining(&self) -> Result<usize> {
        self.store.working_len()
    }

    /// Rows in the full set.
    pub fn total(&self) -> Result<usize> {
        self.store.full_len()
    }
}
