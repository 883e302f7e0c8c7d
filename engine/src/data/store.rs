// In-memory keyed store for uploaded datasets, normalized datasets and dashboards.
use crate::models::NormalizedDataset;
use shared::models::{ColumnClassification, DashboardDoc, RawDataset};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Map of id to immutable snapshot. Writers swap whole `Arc`s, so a reader holding a
/// snapshot never observes a later write.
pub struct KeyedStore<T> {
    entries: RwLock<HashMap<String, Arc<T>>>,
}

impl<T> KeyedStore<T> {
    pub fn new() -> Self {
        KeyedStore { entries: RwLock::new(HashMap::new()) }
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(id).cloned()
    }

    /// Inserts or replaces the snapshot stored under `id`.
    pub fn put(&self, id: &str, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(id.to_string(), Arc::clone(&value));
        value
    }

    /// Stores `value` under a fresh `<prefix>_<6 hex>` id.
    pub fn insert_new(&self, prefix: &str, value: T) -> (String, Arc<T>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let id = loop {
            let candidate = new_id(prefix);
            if !entries.contains_key(&candidate) {
                break candidate;
            }
        };
        let value = Arc::new(value);
        entries.insert(id.clone(), Arc::clone(&value));
        (id, value)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for KeyedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub fn new_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &hex[..6])
}

/// A normalized dataset together with where it came from and its semantic hints.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntry {
    pub dataset_id: String,
    pub dataset: NormalizedDataset,
    pub columns: Vec<ColumnClassification>,
}

#[derive(Default)]
pub struct DatasetStore {
    pub raw: KeyedStore<RawDataset>,
    pub normalized: KeyedStore<NormalizedEntry>,
    /// Latest dashboard per normalized dataset id.
    pub dashboards: KeyedStore<DashboardDoc>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }
}
