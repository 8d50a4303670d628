use std::collections::HashSet;
use std::hash::Hash;

use crate::models::Event;

// First occurrence wins, order holds, keyless items always pass.
pub fn dedupe_by_key<T, K, F>(items: Vec<T>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> Option<K>,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        match key(&item) {
            Some(k) => {
                if seen.insert(k) {
                    kept.push(item);
                }
            }
            None => kept.push(item),
        }
    }
    kept
}

pub fn dedupe_events(events: Vec<Event>) -> Vec<Event> {
    dedupe_by_key(events, |event| Some(event.composite_key()))
}
