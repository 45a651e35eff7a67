//! # Primitives
//!
//! Fixed constants of the Heapscope core.
//!
//! These values are compiled in and immutable at runtime.

use crate::NodeId;

/// Identifier of the synthetic root of every tree.
pub const ROOT_ID: NodeId = NodeId::ROOT;

/// Depth of the synthetic root. Top-level rows have depth 0.
pub const ROOT_DEPTH: i32 = -1;

/// Label of the synthetic root.
pub const ROOT_LABEL: &str = "Root";

/// Display name of the bucket holding records whose type cannot be resolved.
pub const UNKNOWN_TYPE_NAME: &str = "<unknown>";

/// Magic bytes for the binary snapshot format header.
///
/// - File Header = Magic Bytes ("HSNP") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"HSNP";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 2;

/// Hide-flags bit that keeps an asset loaded even when nothing references it.
pub const DONT_UNLOAD_UNUSED_ASSET: u32 = 32;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of object records accepted in a single snapshot.
///
/// Snapshots larger than this are rejected before any tree is built.
pub const MAX_RECORDS: usize = 10_000_000;

/// Maximum number of connections accepted in a single snapshot.
pub const MAX_CONNECTIONS: usize = 50_000_000;
