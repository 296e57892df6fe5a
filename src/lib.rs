//! Hand out one random, non-repeating row at a time from a CSV/TXT file or a
//! published spreadsheet export. Rows are persisted as a full set plus a
//! shrinking shuffled working set; exhausting the working set reshuffles the
//! full set.

pub mod config;
pub mod error;
pub mod picker;
pub mod rows;
pub mod source;
pub mod store;

pub use error::{Error, Result};
pub use picker::{Pick, Picker};
pub use rows::{Item, RowSet};
pub use source::{Source, SourceReader};
pub use store::ShuffleStore;
