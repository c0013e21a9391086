//! Fixed-capacity newest-first log.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use tracing::debug;

/// A bounded sequence ordered newest first.
///
/// Inserting beyond capacity evicts from the oldest end. Serialized form is a
/// plain JSON array, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct CappedLog<T> {
    /// Entries, newest at front.
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> CappedLog<T> {
    /// Create an empty log holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build from an already newest-first sequence, dropping anything past capacity.
    pub fn from_newest_first(items: Vec<T>, capacity: usize) -> Self {
        let mut entries: VecDeque<T> = items.into();
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    /// Insert as the newest entry. Returns the number of entries evicted.
    pub fn push_newest(&mut self, item: T) -> usize {
        self.entries.push_front(item);

        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
            evicted += 1;
        }
        evicted
    }

    /// Keep only entries matching the predicate.
    pub fn retain(&mut self, f: impl FnMut(&T) -> bool) {
        self.entries.retain(f);
    }

    /// Newest entry.
    pub fn front(&self) -> Option<&T> {
        self.entries.front()
    }

    /// Iterate newest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as a newest-first vector.
    pub fn into_vec(self) -> Vec<T> {
        self.entries.into()
    }
}

impl<T: DeserializeOwned> CappedLog<T> {
    /// Parse a stored JSON array. Absent, unparseable, or non-array input
    /// yields an empty log.
    pub fn parse(raw: Option<&str>, capacity: usize) -> Self {
        let Some(raw) = raw else {
            return Self::with_capacity(capacity);
        };

        match serde_json::from_str::<Vec<T>>(raw) {
            Ok(items) => Self::from_newest_first(items, capacity),
            Err(e) => {
                debug!(target: "guideqa::store", "Discarding malformed log: {}", e);
                Self::with_capacity(capacity)
            }
        }
    }
}

impl<T: Serialize> CappedLog<T> {
    /// Serialize as a newest-first JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }
}
