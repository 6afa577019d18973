//! Process-wide cache of metadata, keyed by type.
//!
//! [`MetadataRegistry`] holds at most one [`Metadata`] per Rust type behind a
//! `RwLock`, so metadata is built once and shared by every comparison that
//! needs it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::{DeltaError, DeltaResult};
use crate::metadata::Metadata;

type Entry = Arc<dyn Any + Send + Sync>;

/// A registry of [`Metadata`], one entry per type.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: RwLock<HashMap<TypeId, Entry>>,
}

impl MetadataRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for `T`, replacing any previous entry.
    pub fn register<T: 'static>(&self, metadata: Metadata<T>) -> DeltaResult<Arc<Metadata<T>>> {
        let metadata = Arc::new(metadata);
        let mut entries = self
            .entries
            .write()
            .map_err(|e| DeltaError::Registry(format!("lock poisoned: {e}")))?;
        let replaced = entries
            .insert(TypeId::of::<T>(), metadata.clone() as Entry)
            .is_some();
        debug!(type_name = metadata.type_name(), replaced, "registered metadata");
        Ok(metadata)
    }

    /// Metadata registered for `T`.
    pub fn get<T: 'static>(&self) -> DeltaResult<Option<Arc<Metadata<T>>>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| DeltaError::Registry(format!("lock poisoned: {e}")))?;
        Ok(entries.get(&TypeId::of::<T>()).and_then(downcast))
    }

    /// Metadata for `T`, building and registering it on first use.
    ///
    /// `build` runs at most once per type, even when several threads race
    /// on the first lookup.
    pub fn get_or_register<T, F>(&self, build: F) -> DeltaResult<Arc<Metadata<T>>>
    where
        T: 'static,
        F: FnOnce() -> Metadata<T>,
    {
        if let Some(metadata) = self.get::<T>()? {
            return Ok(metadata);
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|e| DeltaError::Registry(format!("lock poisoned: {e}")))?;
        // Another writer may have won the race between the two locks.
        if let Some(metadata) = entries.get(&TypeId::of::<T>()).and_then(downcast) {
            return Ok(metadata);
        }
        let metadata = Arc::new(build());
        entries.insert(TypeId::of::<T>(), metadata.clone() as Entry);
        debug!(type_name = metadata.type_name(), "built and registered metadata");
        Ok(metadata)
    }

    /// Returns `true` if metadata is registered for `T`.
    pub fn contains<T: 'static>(&self) -> DeltaResult<bool> {
        let entries = self
            .entries
            .read()
            .map_err(|e| DeltaError::Registry(format!("lock poisoned: {e}")))?;
        Ok(entries.contains_key(&TypeId::of::<T>()))
    }

    /// Number of registered types.
    pub fn len(&self) -> DeltaResult<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|e| DeltaError::Registry(format!("lock poisoned: {e}")))?;
        Ok(entries.len())
    }
}

fn downcast<T: 'static>(entry: &Entry) -> Option<Arc<Metadata<T>>> {
    entry.clone().downcast::<Metadata<T>>().ok()
}
