//! Stored food items: a search candidate the user picked, kept under a stable
//! id so meals can refer to it.

use crate::models::{FoodCandidate, FoodSource};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: u64,
    #[serde(flatten)]
    pub food: FoodCandidate,
}

#[derive(Debug, Default)]
pub struct FoodCatalog {
    by_identity: DashMap<(FoodSource, String), Arc<FoodItem>>,
    by_id: DashMap<u64, Arc<FoodItem>>,
    next_id: AtomicU64,
}

impl FoodCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored item for the candidate's `(source, source_id)`,
    /// creating it on first use. Candidates without a source id are never
    /// shared.
    pub fn get_or_create(&self, candidate: &FoodCandidate) -> Arc<FoodItem> {
        if candidate.source_id.trim().is_empty() {
            return self.insert(candidate);
        }
        let key = (candidate.source, candidate.source_id.clone());
        self.by_identity
            .entry(key)
            .or_insert_with(|| self.insert(candidate))
            .value()
            .clone()
    }

    pub fn get(&self, id: u64) -> Option<Arc<FoodItem>> {
        self.by_id.get(&id).map(|item| item.value().clone())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn insert(&self, candidate: &FoodCandidate) -> Arc<FoodItem> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let item = Arc::new(FoodItem {
            id,
            food: candidate.clone().sanitized(),
        });
        self.by_id.insert(id, item.clone());
        item
    }
}
