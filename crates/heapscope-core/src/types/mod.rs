//! # Core Type Definitions
//!
//! This module contains the shared types of the native-object view:
//! - Tree and snapshot identifiers (`NodeId`, `TypeKey`)
//! - The flat object record (`Record`) and its connectivity counts
//! - Secondary name resolution output (`SecondaryName`)
//! - Error types (`HeapscopeError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they are used as `BTreeMap` keys

use crate::primitives::DONT_UNLOAD_UNUSED_ASSET;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a node in a built tree.
///
/// Assigned sequentially during a single build, starting at 1.
/// `NodeId(0)` is reserved for the synthetic root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// The synthetic root.
    pub const ROOT: NodeId = NodeId(0);

    /// Arena slot of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a native type in the snapshot's type table.
///
/// This is the primary classification key of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeKey(pub u32);

// =============================================================================
// RECORD
// =============================================================================

/// One native object instance captured in a snapshot.
///
/// Records are owned by the record source and never mutated by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Position of the object in the snapshot's object table.
    #[serde(default)]
    pub index: usize,
    /// Object name as reported by the engine (may be empty).
    #[serde(default)]
    pub name: String,
    /// Raw type table index. Negative or out-of-range values classify as unknown.
    pub type_index: i64,
    /// Native size in bytes.
    pub size: u64,
    /// Native address. Unique among the records of one snapshot.
    pub address: u64,
    /// Engine instance id.
    #[serde(default)]
    pub instance_id: i32,
    /// Assets and scene objects are persistent; runtime-created objects are not.
    #[serde(default)]
    pub is_persistent: bool,
    /// Marked to survive scene reloads.
    #[serde(default)]
    pub is_dont_destroy_on_load: bool,
    /// Engine manager object.
    #[serde(default)]
    pub is_manager: bool,
    /// Engine hide-flags bit set. See [`crate::primitives::DONT_UNLOAD_UNUSED_ASSET`].
    #[serde(default)]
    pub hide_flags: u32,
}

impl Record {
    /// Create a record with the given type, size and address; all flags cleared.
    #[must_use]
    pub fn new(type_index: i64, size: u64, address: u64) -> Self {
        Self {
            index: 0,
            name: String::new(),
            type_index,
            size,
            address,
            instance_id: 0,
            is_persistent: false,
            is_dont_destroy_on_load: false,
            is_manager: false,
            hide_flags: 0,
        }
    }

    /// Set the object name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the instance id.
    #[must_use]
    pub fn with_instance_id(mut self, instance_id: i32) -> Self {
        self.instance_id = instance_id;
        self
    }

    /// Set the persistent / don't-destroy-on-load flags.
    #[must_use]
    pub fn with_flags(mut self, is_persistent: bool, is_dont_destroy_on_load: bool) -> Self {
        self.is_persistent = is_persistent;
        self.is_dont_destroy_on_load = is_dont_destroy_on_load;
        self
    }

    /// Set the raw hide-flags bits.
    #[must_use]
    pub fn with_hide_flags(mut self, hide_flags: u32) -> Self {
        self.hide_flags = hide_flags;
        self
    }

    /// True if the object does not unload automatically on scene changes.
    #[must_use]
    pub fn is_non_unloading(&self) -> bool {
        self.is_dont_destroy_on_load
            || self.is_manager
            || self.hide_flags & DONT_UNLOAD_UNUSED_ASSET != 0
    }
}

/// Reference counts of one record in the snapshot's connection graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Connectivity {
    /// Outgoing connections.
    pub references: u32,
    /// Incoming connections.
    pub referenced_by: u32,
}

impl Connectivity {
    #[must_use]
    pub const fn new(references: u32, referenced_by: u32) -> Self {
        Self {
            references,
            referenced_by,
        }
    }
}

/// A better name for a record hidden behind a shared polymorphic native type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryName {
    /// Descriptive name (the script name).
    pub name: String,
    /// Type of the object the name was resolved from.
    pub key: TypeKey,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in Heapscope.
///
/// Tree construction, aggregation, sorting and address lookup never fail;
/// errors come from loading snapshots and configuration.
#[derive(Debug, Error)]
pub enum HeapscopeError {
    /// The snapshot data is internally inconsistent.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A sort column name could not be parsed.
    #[error("Unknown sort column: {0}")]
    UnknownSortColumn(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The configuration file is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A command-line argument could not be interpreted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_id_maps_to_slot_zero() {
        assert_eq!(NodeId::ROOT.index(), 0);
        assert_eq!(NodeId(7).index(), 7);
    }

    #[test]
    fn record_builder_sets_fields() {
        let record = Record::new(3, 128, 0x1000)
            .with_name("Main Camera")
            .with_instance_id(-42)
            .with_flags(true, false);

        assert_eq!(record.type_index, 3);
        assert_eq!(record.size, 128);
        assert_eq!(record.address, 0x1000);
        assert_eq!(record.name, "Main Camera");
        assert_eq!(record.instance_id, -42);
        assert!(record.is_persistent);
        assert!(!record.is_dont_destroy_on_load);
    }

    #[test]
    fn non_unloading_covers_ddol_managers_and_hide_flags() {
        let plain = Record::new(0, 1, 1);
        assert!(!plain.is_non_unloading());

        let ddol = Record::new(0, 1, 2).with_flags(false, true);
        assert!(ddol.is_non_unloading());

        let mut manager = Record::new(0, 1, 3);
        manager.is_manager = true;
        assert!(manager.is_non_unloading());

        let kept = Record::new(0, 1, 4).with_hide_flags(DONT_UNLOAD_UNUSED_ASSET | 0x1);
        assert!(kept.is_non_unloading());

        let hidden_only = Record::new(0, 1, 5).with_hide_flags(0x1 | 0x2);
        assert!(!hidden_only.is_non_unloading());
    }
}
