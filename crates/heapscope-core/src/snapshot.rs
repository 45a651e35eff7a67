//! # Snapshot
//!
//! In-memory record source backed by a captured snapshot's native tables.
//!
//! A snapshot holds the native type table, the native object table and the
//! directed connections between objects. Construction validates the tables
//! and precomputes everything the record-source queries need, so every
//! query afterwards is a lookup.

use crate::primitives::{MAX_CONNECTIONS, MAX_RECORDS, UNKNOWN_TYPE_NAME};
use crate::source::{PolymorphicMarkers, RecordSource};
use crate::{Connectivity, HeapscopeError, Record, SecondaryName, TypeKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// SNAPSHOT TABLES
// =============================================================================

/// One entry of the native type table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeType {
    pub name: String,
}

impl NativeType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Directed connection between two objects, by object table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: usize,
    pub to: usize,
}

impl Connection {
    #[must_use]
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

/// Well-known types of the captured engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoreTypes {
    /// Base type of scripted components.
    #[serde(default)]
    pub behaviour: Option<TypeKey>,
    /// Base type of scripted data assets.
    #[serde(default)]
    pub scripted_data: Option<TypeKey>,
    /// Type of the script objects that carry the real class name.
    #[serde(default)]
    pub script: Option<TypeKey>,
}

/// Raw snapshot tables as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    pub types: Vec<NativeType>,
    pub objects: Vec<Record>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub core_types: CoreTypes,
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// A validated snapshot, usable as a [`RecordSource`].
#[derive(Debug, Clone)]
pub struct Snapshot {
    data: SnapshotData,
    /// Per-object reference counts, indexed like `data.objects`.
    connectivity: Vec<Connectivity>,
    /// Object index -> index of the first script object it references.
    script_links: BTreeMap<usize, usize>,
}

impl Snapshot {
    /// Validate the tables and build the lookup indexes.
    ///
    /// Object `index` fields are normalized to their table position.
    pub fn new(mut data: SnapshotData) -> Result<Self, HeapscopeError> {
        if data.objects.len() > MAX_RECORDS {
            return Err(HeapscopeError::InvalidSnapshot(format!(
                "object count {} exceeds maximum {}",
                data.objects.len(),
                MAX_RECORDS
            )));
        }
        if data.connections.len() > MAX_CONNECTIONS {
            return Err(HeapscopeError::InvalidSnapshot(format!(
                "connection count {} exceeds maximum {}",
                data.connections.len(),
                MAX_CONNECTIONS
            )));
        }

        let type_count = data.types.len();
        let core = data.core_types;
        for (label, key) in [
            ("behaviour", core.behaviour),
            ("scripted_data", core.scripted_data),
            ("script", core.script),
        ] {
            if let Some(key) = key.filter(|k| k.0 as usize >= type_count) {
                return Err(HeapscopeError::InvalidSnapshot(format!(
                    "core type '{}' references type {} but only {} types exist",
                    label, key.0, type_count
                )));
            }
        }

        let object_count = data.objects.len();
        for (position, connection) in data.connections.iter().enumerate() {
            if connection.from >= object_count || connection.to >= object_count {
                return Err(HeapscopeError::InvalidSnapshot(format!(
                    "connection {} ({} -> {}) is out of range for {} objects",
                    position, connection.from, connection.to, object_count
                )));
            }
        }

        for (index, object) in data.objects.iter_mut().enumerate() {
            object.index = index;
        }

        let mut connectivity = vec![Connectivity::default(); object_count];
        for connection in &data.connections {
            let from = &mut connectivity[connection.from];
            from.references = from.references.saturating_add(1);
            let to = &mut connectivity[connection.to];
            to.referenced_by = to.referenced_by.saturating_add(1);
        }

        let mut script_links = BTreeMap::new();
        if let Some(script) = core.script {
            for connection in &data.connections {
                let target = &data.objects[connection.to];
                if type_key_in(type_count, target.type_index) == Some(script) {
                    script_links.entry(connection.from).or_insert(connection.to);
                }
            }
        }

        Ok(Self {
            data,
            connectivity,
            script_links,
        })
    }

    /// Raw tables.
    #[must_use]
    pub fn data(&self) -> &SnapshotData {
        &self.data
    }

    /// Give back the raw tables.
    #[must_use]
    pub fn into_data(self) -> SnapshotData {
        self.data
    }

    /// Number of native types.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.data.types.len()
    }

    /// Number of native objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.data.objects.len()
    }

    /// Sum of all object sizes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.data
            .objects
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.size))
    }

    fn type_key(&self, type_index: i64) -> Option<TypeKey> {
        type_key_in(self.data.types.len(), type_index)
    }
}

/// Map a raw type index to a key, if it addresses the type table.
fn type_key_in(type_count: usize, type_index: i64) -> Option<TypeKey> {
    let index = u32::try_from(type_index).ok()?;
    ((index as usize) < type_count).then_some(TypeKey(index))
}

impl RecordSource for Snapshot {
    fn records(&self) -> &[Record] {
        &self.data.objects
    }

    fn classification_key(&self, record: &Record) -> Option<TypeKey> {
        self.type_key(record.type_index)
    }

    fn resolve_secondary_name(&self, record: &Record) -> Option<SecondaryName> {
        let link = *self.script_links.get(&record.index)?;
        let script = self.data.objects.get(link)?;
        if script.name.is_empty() {
            return None;
        }
        let key = self.type_key(script.type_index)?;
        Some(SecondaryName {
            name: script.name.clone(),
            key,
        })
    }

    fn display_name(&self, key: TypeKey) -> String {
        self.data
            .types
            .get(key.0 as usize)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| UNKNOWN_TYPE_NAME.to_string())
    }

    fn connectivity(&self, record: &Record) -> Connectivity {
        self.connectivity
            .get(record.index)
            .copied()
            .unwrap_or_default()
    }

    fn polymorphic_markers(&self) -> PolymorphicMarkers {
        PolymorphicMarkers {
            behaviour: self.data.core_types.behaviour,
            scripted_data: self.data.core_types.scripted_data,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
