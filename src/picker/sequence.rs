// src/picker/sequence.rs

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// One step of a [`shuffle_picks`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickResult<T> {
    pub item: T,
    /// Items left including this one; counts down from `total` to 1.
    pub remaining: usize,
    pub total: usize,
}

/// Shuffle `items` once and yield them one by one with a countdown.
///
/// Passing a `seed` makes the order reproducible.
pub fn shuffle_picks<T>(
    items: impl IntoIterator<Item = T>,
    seed: Option<u64>,
) -> impl Iterator<Item = PickResult<T>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut items: Vec<T> = items.into_iter().collect();
    items.shuffle(&mut rng);
    let total = items.len();

    items
        .into_iter()
        .enumerate()
        .map(move |(i, item)| PickResult {
            item,
            remaining: total - i,
            total,
        })
}
