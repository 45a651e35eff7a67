//! # heapscope-core
//!
//! The native-object view of a memory snapshot - THE LOGIC.
//!
//! This crate turns the flat native-object table of a captured snapshot into
//! a type-keyed hierarchy that can be aggregated, sorted and searched.
//!
//! ## Pipeline
//!
//! - `snapshot` validates the raw tables and serves them as a `RecordSource`
//! - `grouping` builds the tree, re-groups polymorphic records by script
//!   name and collapses single-child groups
//! - `aggregate` memoizes subtree metrics on first read
//! - `sort` reorders every level by one column
//! - `address` finds the leaf holding a native address
//!
//! ## Architectural Constraints
//!
//! - The snapshot is read-only; a refresh is a full rebuild
//! - Builds are deterministic: same records, same tree, same ids
//! - No async, no network, no floating point

// =============================================================================
// MODULES
// =============================================================================

pub mod address;
pub mod aggregate;
pub mod formats;
pub mod grouping;
pub mod primitives;
pub mod snapshot;
pub mod sort;
pub mod source;
pub mod tree;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Connectivity, HeapscopeError, NodeId, Record, SecondaryName, TypeKey};

// =============================================================================
// RE-EXPORTS: Input
// =============================================================================

pub use snapshot::{Connection, CoreTypes, NativeType, Snapshot, SnapshotData};
pub use source::{PolymorphicMarkers, RecordSource};

// =============================================================================
// RE-EXPORTS: Tree Engine
// =============================================================================

pub use address::{find_by_address, find_path};
pub use aggregate::AggregateCache;
pub use grouping::{BuildOptions, BuildStats, GroupingEngine, script_group_key};
pub use sort::{SortColumn, SortDirection, SortSpec, compare, compare_by_column};
pub use tree::{NativeObjectTree, NodeRef, TreeNode, Walk};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    MAX_SNAPSHOT_PAYLOAD_SIZE, SnapshotHeader, has_snapshot_magic, snapshot_from_bytes,
    snapshot_to_bytes,
};
