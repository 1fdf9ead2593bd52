use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

/// Set of identity keys seen so far in the run
///
/// Keys are only ever added. Rebuilding from a checkpoint happens through
/// [`DedupIndex::restore`], which constructs a fresh index, so an index that
/// has already accepted keys can never be overwritten mid-run.
#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
    keys: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from a checkpoint's saved keys
    pub fn restore<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Adds a key, returning true if it was not present before
    pub fn add(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    /// Sorted copy of every key, as written to the checkpoint
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.keys.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A dedup index shared by concurrent keyword workers
///
/// Membership test and insert happen under one lock, so two workers that
/// find the same key at the same time cannot both see it as new.
#[derive(Debug, Clone, Default)]
pub struct SharedDedupIndex {
    inner: Arc<Mutex<DedupIndex>>,
}

impl SharedDedupIndex {
    pub fn new(index: DedupIndex) -> Self {
        Self {
            inner: Arc::new(Mutex::new(index)),
        }
    }

    /// Inserts `key` if absent; returns true only for the caller that inserted it
    pub fn check_and_insert(&self, key: &str) -> bool {
        let mut index = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if index.has(key) {
            false
        } else {
            index.add(key)
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .has(key)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> BTreeSet<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }
}
