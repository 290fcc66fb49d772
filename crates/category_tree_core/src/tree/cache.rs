//! Confirmed snapshot plus speculative order overlay.
//!
//! # Invariants
//! - `pending` is cleared exactly when a new confirmed snapshot arrives.
//! - Later patches for the same id win over earlier ones.

use crate::model::category::{CategoryId, CategoryNode, CategoryRecord};
use crate::repo::category_repo::OrderUpdate;
use crate::tree::normalize::normalize;
use std::collections::HashMap;

/// Read model shown to the organizer: last authoritative rows and the
/// optimistic order patches applied on top.
#[derive(Debug, Clone, Default)]
pub struct TreeCache {
    confirmed: Vec<CategoryRecord>,
    pending: HashMap<CategoryId, i64>,
    revision: u64,
}

impl TreeCache {
    pub fn new(records: Vec<CategoryRecord>) -> Self {
        Self {
            confirmed: records,
            pending: HashMap::new(),
            revision: 1,
        }
    }

    /// Installs an authoritative snapshot and drops every pending patch.
    pub fn replace_confirmed(&mut self, records: Vec<CategoryRecord>) {
        self.confirmed = records;
        self.pending.clear();
        self.revision += 1;
    }

    /// Overlays order values ahead of store confirmation.
    pub fn apply_patches(&mut self, updates: &[OrderUpdate]) {
        for update in updates {
            self.pending.insert(update.id, update.order);
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of snapshots installed so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn confirmed(&self) -> &[CategoryRecord] {
        &self.confirmed
    }

    /// Confirmed rows with pending order patches applied.
    pub fn records(&self) -> Vec<CategoryRecord> {
        self.confirmed
            .iter()
            .map(|record| match self.pending.get(&record.id) {
                Some(order) => CategoryRecord {
                    order: *order,
                    ..record.clone()
                },
                None => record.clone(),
            })
            .collect()
    }

    pub fn tree(&self) -> Vec<CategoryNode> {
        normalize(&self.records())
    }
}
