//! In-memory exercise store.
//!
//! Ids are decimal strings minted from a counter starting at `1`. Any other
//! id shape is rejected as invalid, the same way a document database rejects
//! a malformed object id.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::storage::{
    ExerciseStore, ListFilter, StoreError, StoreResult, StoredExercise, UpdateMask,
};

/// A thread-safe exercise store backed by a concurrent map.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: Arc<DashMap<u64, StoredExercise>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn parse_id(id: &str) -> StoreResult<u64> {
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        id.parse()
            .map_err(|_| StoreError::InvalidId(id.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExerciseStore for MemoryStore {
    async fn create(&self, mut exercise: StoredExercise) -> StoreResult<StoredExercise> {
        let key = self.next_id.fetch_add(1, Ordering::Relaxed);
        exercise.id = key.to_string();
        self.records.insert(key, exercise.clone());
        tracing::trace!(id = %exercise.id, "Exercise stored");
        Ok(exercise)
    }

    async fn read(&self, id: &str) -> StoreResult<StoredExercise> {
        let key = Self::parse_id(id)?;
        self.records
            .get(&key)
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update(
        &self,
        id: &str,
        exercise: StoredExercise,
        mask: &UpdateMask,
    ) -> StoreResult<StoredExercise> {
        let key = Self::parse_id(id)?;
        let mut entry = self
            .records
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        mask.apply(&exercise, entry.value_mut());
        Ok(entry.value().clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let key = Self::parse_id(id)?;
        self.records
            .remove(&key)
            .map(|_| true)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self, filter: &ListFilter) -> StoreResult<Vec<StoredExercise>> {
        let mut found: Vec<(u64, StoredExercise)> = self
            .records
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        // Insertion order
        found.sort_unstable_by_key(|(key, _)| *key);
        Ok(found.into_iter().map(|(_, exercise)| exercise).collect())
    }
}
