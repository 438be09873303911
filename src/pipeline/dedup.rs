//! Identity-based deduplication.

use crate::models::{IdentityKey, StudentRecord};
use std::collections::HashMap;

/// Field never overwritten by a merge: the stored copy is already encrypted.
const PROTECTED_FIELD: &str = "email";

/// Outcome of offering a record to the [`Deduplicator`].
#[derive(Debug)]
pub enum Insertion<'a> {
    /// First record with this identity; the stored copy is returned.
    Fresh(&'a mut StudentRecord),
    /// The identity was already known and the fields were merged.
    Merged,
}

/// Insertion-ordered record store keyed by identity.
#[derive(Debug, Default)]
pub struct Deduplicator {
    records: Vec<StudentRecord>,
    index: HashMap<IdentityKey, usize>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a record with this identity has been stored.
    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.index.contains_key(key)
    }

    /// Stores a record, merging it into an earlier one with the same identity.
    pub fn insert(&mut self, key: IdentityKey, record: StudentRecord) -> Insertion<'_> {
        if let Some(&position) = self.index.get(&key) {
            let stored = &mut self.records[position];
            for (field, value) in record.0 {
                if field != PROTECTED_FIELD {
                    stored.insert(field, value);
                }
            }
            return Insertion::Merged;
        }

        let position = self.records.len();
        self.index.insert(key, position);
        self.records.push(record);
        Insertion::Fresh(&mut self.records[position])
    }

    /// Final records in order of first occurrence.
    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
