//! # Aggregate Cache
//!
//! Lazily computed, memoized metrics of a group's subtree.
//!
//! Every metric starts uncomputed and is filled on first read. Once filled it
//! is never recomputed: the tree has no structural edit path, so a cached
//! value can only go stale by rebuilding the whole tree, which discards it.
//!
//! Sorting reorders children but never changes subtree membership, so
//! aggregates cached before a sort remain valid after it.
//!
//! The cache uses `OnceCell` and is therefore not `Sync`. A tree must not be
//! sorted on one thread while another thread reads aggregates.

use crate::tree::{Group, NativeObjectTree};
use std::cell::OnceCell;

/// Per-group memo of derived metrics.
#[derive(Debug, Clone, Default)]
pub struct AggregateCache {
    size: OnceCell<u64>,
    count: OnceCell<u64>,
    max_references: OnceCell<u32>,
    max_referenced_by: OnceCell<u32>,
}

impl AggregateCache {
    /// Cached total size, if it has been computed.
    #[must_use]
    pub fn cached_size(&self) -> Option<u64> {
        self.size.get().copied()
    }

    /// Cached leaf count, if it has been computed.
    #[must_use]
    pub fn cached_count(&self) -> Option<u64> {
        self.count.get().copied()
    }

    /// Cached maximum references, if it has been computed.
    #[must_use]
    pub fn cached_max_references(&self) -> Option<u32> {
        self.max_references.get().copied()
    }

    /// Cached maximum referenced-by, if it has been computed.
    #[must_use]
    pub fn cached_max_referenced_by(&self) -> Option<u32> {
        self.max_referenced_by.get().copied()
    }
}

impl NativeObjectTree {
    /// Sum of the children's sizes.
    pub(crate) fn group_size(&self, group: &Group) -> u64 {
        *group.aggregates.size.get_or_init(|| {
            group
                .children
                .iter()
                .fold(0u64, |acc, &id| acc.saturating_add(self.node(id).size()))
        })
    }

    /// Direct children plus everything they count.
    pub(crate) fn group_count(&self, group: &Group) -> u64 {
        *group.aggregates.count.get_or_init(|| {
            group.children.iter().fold(group.children.len() as u64, |acc, &id| {
                acc.saturating_add(self.node(id).count())
            })
        })
    }

    /// Worst-case member, not a total.
    pub(crate) fn group_max_references(&self, group: &Group) -> u32 {
        *group.aggregates.max_references.get_or_init(|| {
            group
                .children
                .iter()
                .map(|&id| self.node(id).references())
                .max()
                .unwrap_or(0)
        })
    }

    pub(crate) fn group_max_referenced_by(&self, group: &Group) -> u32 {
        *group.aggregates.max_referenced_by.get_or_init(|| {
            group
                .children
                .iter()
                .map(|&id| self.node(id).referenced_by())
                .max()
                .unwrap_or(0)
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
