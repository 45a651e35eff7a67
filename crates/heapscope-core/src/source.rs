//! # Record Source
//!
//! The read-only accessor interface the core consumes.
//!
//! A record source owns the flat object table of one snapshot and answers
//! type-resolution queries about it. Every query is in-memory and
//! non-blocking; the core never mutates a source.

use crate::{Connectivity, Record, SecondaryName, TypeKey};

/// The two native types whose real identity is hidden behind a shared type.
///
/// Records of these types are re-grouped by their resolved script name.
/// Either marker may be absent, in which case nothing matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolymorphicMarkers {
    /// Behaviour-like marker (e.g. a scripted component base type).
    pub behaviour: Option<TypeKey>,
    /// Data-object-like marker (e.g. a scripted asset base type).
    pub scripted_data: Option<TypeKey>,
}

impl PolymorphicMarkers {
    /// Markers that match nothing.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            behaviour: None,
            scripted_data: None,
        }
    }

    /// Create markers from both type keys.
    #[must_use]
    pub const fn new(behaviour: TypeKey, scripted_data: TypeKey) -> Self {
        Self {
            behaviour: Some(behaviour),
            scripted_data: Some(scripted_data),
        }
    }

    /// Check whether `key` is one of the designated markers.
    #[must_use]
    pub fn matches(&self, key: TypeKey) -> bool {
        self.behaviour == Some(key) || self.scripted_data == Some(key)
    }
}

/// Read-only view of a snapshot's object records.
///
/// `records()` must return the same order on every call for a given snapshot.
pub trait RecordSource {
    /// All object records, in snapshot order.
    fn records(&self) -> &[Record];

    /// Primary grouping key of a record.
    ///
    /// `None` marks a malformed or missing type; such records are grouped
    /// under the unknown bucket instead of failing the build.
    fn classification_key(&self, record: &Record) -> Option<TypeKey>;

    /// Resolve a descriptive name for a record of a polymorphic type.
    ///
    /// Only consulted for records matching [`RecordSource::polymorphic_markers`].
    /// Returns `None` when no better name is resolvable.
    fn resolve_secondary_name(&self, record: &Record) -> Option<SecondaryName>;

    /// Human-readable name of a type.
    fn display_name(&self, key: TypeKey) -> String;

    /// Reference / referenced-by counts of a record.
    ///
    /// Only consulted when reference tracking is enabled for a build.
    fn connectivity(&self, record: &Record) -> Connectivity;

    /// The designated polymorphic types of this snapshot.
    fn polymorphic_markers(&self) -> PolymorphicMarkers {
        PolymorphicMarkers::none()
    }
}
