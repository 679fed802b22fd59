//! Concurrency-safe named counters.

use std::collections::BTreeMap;

use dashmap::DashMap;

/// In-memory store of named `i64` counters.
///
/// Each key lives in a `DashMap` shard guarded by its own lock, so concurrent
/// updates of the same name are never lost and updates of different names do
/// not contend unless they share a shard.
#[derive(Debug, Default)]
pub struct CounterStore {
    values: DashMap<String, i64>,
}

impl CounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to the named counter and return the new value.
    pub fn increment(&self, name: &str) -> i64 {
        self.add(name, 1)
    }

    /// Subtract one from the named counter and return the new value.
    pub fn decrement(&self, name: &str) -> i64 {
        self.add(name, -1)
    }

    /// Current value, or 0 for a name that was never touched.
    pub fn get(&self, name: &str) -> i64 {
        self.values.get(name).map(|value| *value).unwrap_or(0)
    }

    /// Overwrite the named counter.
    pub fn set(&self, name: &str, value: i64) {
        self.values.insert(name.to_string(), value);
    }

    /// Copy of every entry, ordered by name.
    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        self.values
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    fn add(&self, name: &str, delta: i64) -> i64 {
        // Fast path avoids allocating the key once the counter exists.
        if let Some(mut value) = self.values.get_mut(name) {
            *value += delta;
            return *value;
        }

        let mut value = self.values.entry(name.to_string()).or_insert(0);
        *value += delta;
        *value
    }
}
