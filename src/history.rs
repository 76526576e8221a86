//! Append-only record of top-level chat interactions.

use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;

use crate::proposal::store::lock_unpoisoned;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionRecord {
    pub input: String,
    pub action: String,
    pub params: Value,
    pub result: String,
}

/// Records are only ever appended; arrival order is preserved.
#[derive(Debug, Default)]
pub struct InteractionLog {
    records: Mutex<Vec<InteractionRecord>>,
}

impl InteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: InteractionRecord) {
        lock_unpoisoned(&self.records).push(record);
    }

    pub fn snapshot(&self) -> Vec<InteractionRecord> {
        lock_unpoisoned(&self.records).clone()
    }

    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
