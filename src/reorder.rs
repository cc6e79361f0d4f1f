//! Reorder Utilities
//!
//! Pure sequence helpers used by the drag reconciler and the commit paths.

use crate::models::{ItemId, RepositionEntry};

/// Move the element at `from` to `to`, shifting the elements in between by one.
///
/// Out-of-range indices return the input unchanged.
pub fn move_within_sequence<T: Clone>(seq: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = seq.to_vec();
    if from >= seq.len() || to >= seq.len() || from == to {
        return moved;
    }
    let element = moved.remove(from);
    moved.insert(to, element);
    moved
}

/// Dense positions for a sequence: each id gets its index
pub fn dense_entries<I>(ids: I) -> Vec<RepositionEntry>
where
    I: IntoIterator<Item = ItemId>,
{
    ids.into_iter()
        .enumerate()
        .map(|(index, id)| RepositionEntry { id, position: index as i32 })
        .collect()
}

/// True when the positions are exactly `0..n` in some order
pub fn is_dense<I>(positions: I) -> bool
where
    I: IntoIterator<Item = i32>,
{
    let mut positions: Vec<i32> = positions.into_iter().collect();
    positions.sort_unstable();
    positions.iter().enumerate().all(|(index, &p)| p == index as i32)
}
