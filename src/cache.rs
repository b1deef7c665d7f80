//! Shared registry of loaded encodings, keyed by model identifier.
//!
//! Entries are inserted once and never replaced or evicted. The lock only
//! guards the map; vocabulary files are parsed outside it, so different
//! models load in parallel. Two racing loads of the same model may both
//! parse, but only the first insert is kept and every caller gets that one.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{debug, warn};

use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::loader;

static GLOBAL: OnceLock<Arc<EncodingCache>> = OnceLock::new();

#[derive(Default)]
pub struct EncodingCache {
    entries: Mutex<HashMap<String, Arc<Encoding>>>,
}

impl EncodingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache used by [`crate::provider::create`].
    pub fn global() -> Arc<EncodingCache> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(EncodingCache::new())))
    }

    // The map is insert-only, so a panic elsewhere cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Encoding>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, model: &str) -> Option<Arc<Encoding>> {
        self.lock().get(model).cloned()
    }

    /// Like [`get`](Self::get), but a missing model is an error.
    pub fn require(&self, model: &str) -> Result<Arc<Encoding>> {
        self.get(model)
            .ok_or_else(|| Error::ModelNotPrepared(model.to_string()))
    }

    pub fn contains(&self, model: &str) -> bool {
        self.lock().contains_key(model)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Loads the vocabulary file at `model` unless it is already cached.
    pub fn prepare(&self, model: &str) -> Result<Arc<Encoding>> {
        self.prepare_with(model, || loader::load(Path::new(model)))
    }

    /// Caches the encoding produced by `load` under `model`, unless one is
    /// already cached. `load` runs without the lock held.
    pub fn prepare_with<F>(&self, model: &str, load: F) -> Result<Arc<Encoding>>
    where
        F: FnOnce() -> Result<Encoding>,
    {
        if let Some(encoding) = self.get(model) {
            debug!(model, "encoding cache hit");
            return Ok(encoding);
        }

        let loaded = Arc::new(load()?);

        match self.lock().entry(model.to_string()) {
            Entry::Occupied(existing) => {
                warn!(model, "discarding duplicate encoding load");
                Ok(Arc::clone(existing.get()))
            }
            Entry::Vacant(slot) => Ok(Arc::clone(slot.insert(loaded))),
        }
    }
}
