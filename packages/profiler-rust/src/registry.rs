//! Registry of named statistics entries.
//!
//! One registry lives for the whole process and is owned by the host
//! application, which hands out `Arc` handles to anything that profiles calls
//! or exports metrics. Entries are created lazily on first use of a name and
//! never evicted.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use floodgate_core::naming::NameError;

use crate::statistics::{ServiceStatistics, StatisticsSnapshot};

// ---------------------------------------------------------------------------
// StatisticsRegistry
// ---------------------------------------------------------------------------

/// Concurrent name-to-statistics map with race-free lazy creation.
#[derive(Default)]
pub struct StatisticsRegistry {
    by_name: DashMap<String, Arc<ServiceStatistics>>,
}

impl StatisticsRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: DashMap::new(),
        }
    }

    /// Fetch the entry for `name`, constructing it with `init` on first use.
    ///
    /// Concurrent first calls for the same name construct exactly one entry;
    /// every caller observes the same instance, and `init` never runs again
    /// for a known name.
    ///
    /// # Errors
    ///
    /// Propagates the `init` failure (an invalid name). Nothing is inserted
    /// in that case and other entries are unaffected.
    pub fn get_or_create(
        &self,
        name: &str,
        init: impl FnOnce() -> Result<ServiceStatistics, NameError>,
    ) -> Result<Arc<ServiceStatistics>, NameError> {
        if let Some(existing) = self.by_name.get(name) {
            return Ok(existing.clone());
        }
        match self.by_name.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let stats = Arc::new(init()?);
                entry.insert(stats.clone());
                Ok(stats)
            }
        }
    }

    /// Fetch an existing entry without creating it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ServiceStatistics>> {
        self.by_name.get(name).map(|entry| entry.value().clone())
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no entries exist yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Registered names, in no particular order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.by_name
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// One snapshot per entry, for handing to an exporter.
    #[must_use]
    pub fn snapshots(&self) -> Vec<StatisticsSnapshot> {
        self.by_name
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
