//! # Persistence Format
//!
//! Binary serialization for snapshot tables.
//!
//! Format: Header (5 bytes) + postcard-serialized [`SnapshotData`].
//! - 4 bytes: Magic ("HSNP")
//! - 1 byte: Version
//!
//! ## Validation
//!
//! Size limits and the header are checked before the payload is decoded,
//! and the decoded tables go through [`Snapshot::new`] like any other input.

use crate::snapshot::{Snapshot, SnapshotData};
use crate::{HeapscopeError, primitives};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted size of an encoded snapshot.
///
/// Checked before deserialization so a corrupted length prefix cannot drive
/// a huge allocation.
pub const MAX_SNAPSHOT_PAYLOAD_SIZE: usize = 500 * 1024 * 1024; // 500 MB

/// Length of the header in bytes.
pub const HEADER_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header that precedes every encoded snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Check magic bytes and version.
    pub fn validate(&self) -> Result<(), HeapscopeError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(HeapscopeError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(HeapscopeError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HeapscopeError> {
        if bytes.len() < HEADER_SIZE {
            return Err(HeapscopeError::DeserializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// True if `bytes` start with the binary snapshot magic.
///
/// Used to tell binary snapshots from JSON ones without decoding.
#[must_use]
pub fn has_snapshot_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(primitives::MAGIC_BYTES)
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Encode snapshot tables to bytes (header + payload).
pub fn snapshot_to_bytes(data: &SnapshotData) -> Result<Vec<u8>, HeapscopeError> {
    let header = SnapshotHeader::new();
    let payload =
        postcard::to_stdvec(data).map_err(|e| HeapscopeError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Decode and validate a snapshot.
///
/// Checks, in order: minimum size, maximum size, header, payload, and
/// finally the table invariants enforced by [`Snapshot::new`].
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Snapshot, HeapscopeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(HeapscopeError::DeserializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_SIZE
        )));
    }

    if bytes.len() > MAX_SNAPSHOT_PAYLOAD_SIZE {
        return Err(HeapscopeError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_PAYLOAD_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[HEADER_SIZE..];
    let data: SnapshotData = postcard::from_bytes(payload).map_err(|e| {
        HeapscopeError::DeserializationError(format!("Failed to decode snapshot data: {}", e))
    })?;

    tracing::debug!(
        objects = data.objects.len(),
        types = data.types.len(),
        connections = data.connections.len(),
        "decoded binary snapshot"
    );

    Snapshot::new(data)
}

// =============================================================================
// TESTS
// =============================================================================
