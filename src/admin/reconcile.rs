//! Local list updates after a successful mutation. Each function is a pure
//! projection of (old list, server result) to the new list; panels never
//! re-fetch after a mutation.

use crate::models::Identified;

/// Created entity goes first
pub fn insert_front<T: Clone>(items: &[T], created: T) -> Vec<T> {
    std::iter::once(created)
        .chain(items.iter().cloned())
        .collect()
}

/// Created entity goes last
pub fn append<T: Clone>(items: &[T], created: T) -> Vec<T> {
    items.iter().cloned().chain(std::iter::once(created)).collect()
}

/// Swap in the server's version of every entry with the same id
pub fn replace_by_id<T: Identified + Clone>(items: &[T], updated: T) -> Vec<T> {
    items
        .iter()
        .map(|item| {
            if item.id() == updated.id() {
                updated.clone()
            } else {
                item.clone()
            }
        })
        .collect()
}

pub fn remove_by_id<T: Identified + Clone>(items: &[T], id: u64) -> Vec<T> {
    items.iter().filter(|item| item.id() != id).cloned().collect()
}
