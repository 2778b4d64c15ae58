//! Change set for live result set notifications.
//!
//! A ChangeSet describes one committed write as seen by a single result set:
//! which positions disappeared, which appeared, and which rows changed in
//! place. Deletions are indices into the result set as it was before the
//! write; insertions and modifications are indices into the result set after
//! it.

use alloc::vec::Vec;
use hashbrown::HashMap;
use notekeep_core::RowId;

/// A batch of index changes delivered atomically per write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Pre-change indices of rows that left the result set
    pub deletions: Vec<usize>,
    /// Post-change indices of rows that entered the result set
    pub insertions: Vec<usize>,
    /// Post-change indices of rows whose contents changed
    pub modifications: Vec<usize>,
}

impl ChangeSet {
    /// Creates a new empty change set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deletion indices.
    pub fn with_deletions(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.deletions = indices.into_iter().collect();
        self
    }

    /// Sets the insertion indices.
    pub fn with_insertions(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.insertions = indices.into_iter().collect();
        self
    }

    /// Sets the modification indices.
    pub fn with_modifications(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.modifications = indices.into_iter().collect();
        self
    }

    /// Computes the change set between two snapshots of `(row id, version)`.
    ///
    /// A row present in both snapshots with a different version is a
    /// modification; reordering alone produces no entries.
    pub fn diff(old: &[(RowId, u64)], new: &[(RowId, u64)]) -> Self {
        let before: HashMap<RowId, u64> = old.iter().copied().collect();
        let after: HashMap<RowId, u64> = new.iter().copied().collect();

        let mut changes = Self::new();
        for (index, (id, _)) in old.iter().enumerate() {
            if !after.contains_key(id) {
                changes.deletions.push(index);
            }
        }
        for (index, (id, version)) in new.iter().enumerate() {
            match before.get(id) {
                None => changes.insertions.push(index),
                Some(previous) if previous != version => changes.modifications.push(index),
                Some(_) => {}
            }
        }
        changes
    }

    /// Returns true if there are no changes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.insertions.is_empty() && self.modifications.is_empty()
    }

    /// Returns the total number of changed indices.
    #[inline]
    pub fn len(&self) -> usize {
        self.deletions.len() + self.insertions.len() + self.modifications.len()
    }

    /// Returns true if any row left the result set.
    #[inline]
    pub fn has_deletions(&self) -> bool {
        !self.deletions.is_empty()
    }

    /// Merges another change set into this one.
    pub fn merge(&mut self, other: ChangeSet) {
        self.deletions.extend(other.deletions);
        self.insertions.extend(other.insertions);
        self.modifications.extend(other.modifications);
    }

    /// Clears all changes.
    pub fn clear(&mut self) {
        self.deletions.clear();
        self.insertions.clear();
        self.modifications.clear();
    }
}
