//! Immutable definition snapshots and the registry that publishes them.
//!
//! A [`Snapshot`] never changes after it is built. The [`Registry`] holds the
//! current one behind `RwLock<Arc<_>>`: readers clone the `Arc` and drop the
//! lock immediately, a reload builds the next snapshot without holding any
//! lock and then swaps the pointer.

use crate::error::{NotFoundError, ValidationError};
use crate::loader;
use crate::schema::{Dimension, Kind, Metric, Record};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry as MapEntry;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct Entry {
    record: Record,
    source: PathBuf,
}

/// All definitions admitted by one successful load.
#[derive(Debug)]
pub struct Snapshot {
    metrics: BTreeMap<String, Entry>,
    dimensions: BTreeMap<String, Entry>,
    loaded_at: DateTime<Utc>,
}

impl Snapshot {
    fn table(&self, kind: Kind) -> &BTreeMap<String, Entry> {
        match kind {
            Kind::Metric => &self.metrics,
            Kind::Dimension => &self.dimensions,
        }
    }

    /// Names of the given kind in lexicographic order.
    pub fn list_names(&self, kind: Kind) -> Vec<&str> {
        self.table(kind).keys().map(String::as_str).collect()
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, kind: Kind, name: &str) -> Result<&Record, NotFoundError> {
        self.table(kind)
            .get(name)
            .map(|entry| &entry.record)
            .ok_or_else(|| NotFoundError {
                kind,
                name: name.to_string(),
            })
    }

    pub fn metric(&self, name: &str) -> Result<&Metric, NotFoundError> {
        match self.get(Kind::Metric, name)? {
            Record::Metric(metric) => Ok(metric),
            Record::Dimension(_) => unreachable!("dimension stored in metric table"),
        }
    }

    pub fn dimension(&self, name: &str) -> Result<&Dimension, NotFoundError> {
        match self.get(Kind::Dimension, name)? {
            Record::Dimension(dimension) => Ok(dimension),
            Record::Metric(_) => unreachable!("metric stored in dimension table"),
        }
    }

    /// Path of the document a record was loaded from.
    pub fn source(&self, kind: Kind, name: &str) -> Result<&Path, NotFoundError> {
        self.table(kind)
            .get(name)
            .map(|entry| entry.source.as_path())
            .ok_or_else(|| NotFoundError {
                kind,
                name: name.to_string(),
            })
    }

    pub fn len(&self, kind: Kind) -> usize {
        self.table(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.dimensions.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Draft snapshot used while a load is in progress. Never escapes a failed load.
#[derive(Debug, Default)]
pub(crate) struct SnapshotBuilder {
    metrics: BTreeMap<String, Entry>,
    dimensions: BTreeMap<String, Entry>,
}

impl SnapshotBuilder {
    pub(crate) fn insert(&mut self, record: Record, source: PathBuf) -> Result<(), ValidationError> {
        let kind = record.kind();
        let table = match kind {
            Kind::Metric => &mut self.metrics,
            Kind::Dimension => &mut self.dimensions,
        };

        match table.entry(record.name().to_string()) {
            MapEntry::Occupied(existing) => Err(ValidationError::Duplicate {
                kind,
                name: existing.key().clone(),
                first: existing.get().source.clone(),
                second: source,
            }),
            MapEntry::Vacant(slot) => {
                let _ = slot.insert(Entry { record, source });
                Ok(())
            }
        }
    }

    pub(crate) fn finish(self) -> Snapshot {
        Snapshot {
            metrics: self.metrics,
            dimensions: self.dimensions,
            loaded_at: Utc::now(),
        }
    }
}

/// The process-wide holder of the current snapshot.
#[derive(Debug)]
pub struct Registry {
    sources: Vec<PathBuf>,
    current: RwLock<Arc<Snapshot>>,
}

impl Registry {
    /// Loads the initial snapshot from `sources`. Fails if that load fails.
    pub fn open(sources: Vec<PathBuf>) -> Result<Self, ValidationError> {
        let snapshot = loader::load(&sources)?;
        info!(
            metrics = snapshot.len(Kind::Metric),
            dimensions = snapshot.len(Kind::Dimension),
            "loaded semantic definitions"
        );
        Ok(Self {
            sources,
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// The currently published snapshot. Stays valid after a later reload.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        // The guarded value is a plain Arc, so a poisoned lock still holds a whole snapshot.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Rebuilds from the configured sources and publishes the result.
    ///
    /// On failure the previously published snapshot stays in effect.
    pub fn reload(&self) -> Result<Arc<Snapshot>, ValidationError> {
        let next = match loader::load(&self.sources) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                warn!(error = %e, "reload rejected, keeping previous definitions");
                return Err(e);
            }
        };

        {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *guard = Arc::clone(&next);
        }

        info!(
            metrics = next.len(Kind::Metric),
            dimensions = next.len(Kind::Dimension),
            "reloaded semantic definitions"
        );
        Ok(next)
    }
}
