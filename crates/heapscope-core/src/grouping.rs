//! # Grouping Engine
//!
//! Builds the native object tree from a record source.
//!
//! 1. Every record is bucketed under a top-level group keyed by its type.
//!    Records without a resolvable type share the unknown bucket.
//! 2. Records of a polymorphic marker type are re-grouped by their resolved
//!    script name into a nested sub-group of their type's group.
//! 3. Top-level groups holding exactly one child are replaced by that child.
//! 4. The tree is sorted by the requested column, if any.
//!
//! Ids come from a counter local to one build, so builds are independent.

use crate::primitives::{ROOT_ID, UNKNOWN_TYPE_NAME};
use crate::sort::SortSpec;
use crate::source::RecordSource;
use crate::tree::{NativeObjectTree, TreeNode, TypeSlot};
use crate::{NodeId, TypeKey};
use std::collections::BTreeMap;

// =============================================================================
// OPTIONS
// =============================================================================

/// Options for a single build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    /// Order applied before the tree is returned. `None` keeps snapshot order.
    pub sort: Option<SortSpec>,
    /// Query per-record connectivity and expose reference columns.
    pub track_references: bool,
}

impl BuildOptions {
    #[must_use]
    pub fn sorted(sort: SortSpec) -> Self {
        Self {
            sort: Some(sort),
            track_references: false,
        }
    }

    #[must_use]
    pub fn with_references(mut self, track_references: bool) -> Self {
        self.track_references = track_references;
        self
    }
}

// =============================================================================
// GROUP KEYS
// =============================================================================

/// Lookup key of a group created during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey {
    Unknown,
    Type(TypeKey),
    /// Script sub-group, scoped to the polymorphic type it refines.
    Script { primary: TypeKey, composite: u64 },
}

/// Composite key of a script sub-group.
///
/// The 32-bit FNV-1a hash of `name` fills the high half and the secondary
/// type key the low half. Distinct names whose hashes collide share a group.
#[must_use]
pub fn script_group_key(name: &str, secondary: TypeKey) -> u64 {
    (u64::from(fnv1a32(name.as_bytes())) << 32) | u64::from(secondary.0)
}

fn fnv1a32(bytes: &[u8]) -> u32 {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut h = FNV_OFFSET;
    for b in bytes {
        h ^= u32::from(*b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

// =============================================================================
// ENGINE
// =============================================================================

/// Counters reported after a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildStats {
    pub records: usize,
    pub groups: usize,
    pub script_groups: usize,
    pub collapsed: usize,
}

/// Turns a record source into a [`NativeObjectTree`].
pub struct GroupingEngine;

impl GroupingEngine {
    /// Build, collapse and sort a tree.
    ///
    /// An empty source yields a tree whose root has no children.
    pub fn build<S: RecordSource + ?Sized>(source: &S, options: BuildOptions) -> NativeObjectTree {
        Self::build_with_stats(source, options).0
    }

    /// Like [`GroupingEngine::build`], also returning the build counters.
    pub fn build_with_stats<S: RecordSource + ?Sized>(
        source: &S,
        options: BuildOptions,
    ) -> (NativeObjectTree, BuildStats) {
        let mut tree = NativeObjectTree::with_root();
        let mut stats = BuildStats::default();
        let markers = source.polymorphic_markers();
        let mut groups: BTreeMap<GroupKey, (NodeId, TypeSlot)> = BTreeMap::new();

        for record in source.records() {
            let primary = source.classification_key(record);
            let key = primary.map_or(GroupKey::Unknown, GroupKey::Type);

            let (type_group, type_slot) = *groups.entry(key).or_insert_with(|| {
                stats.groups += 1;
                let type_name = primary.map_or_else(
                    || UNKNOWN_TYPE_NAME.to_string(),
                    |k| source.display_name(k),
                );
                let slot = tree.add_type_name(type_name);
                (tree.push_group(ROOT_ID, String::new(), slot), slot)
            });

            let mut parent = type_group;
            let script = primary
                .filter(|&k| markers.matches(k))
                .and_then(|k| source.resolve_secondary_name(record).map(|s| (k, s)));
            if let Some((primary, secondary)) = script {
                let composite = script_group_key(&secondary.name, secondary.key);
                parent = groups
                    .entry(GroupKey::Script { primary, composite })
                    .or_insert_with(|| {
                        stats.script_groups += 1;
                        let group = tree.push_group(type_group, secondary.name, type_slot);
                        (group, type_slot)
                    })
                    .0;
            }

            let connectivity = options
                .track_references
                .then(|| source.connectivity(record));
            tree.push_leaf(parent, record.clone(), type_slot, connectivity);
            stats.records += 1;
        }

        stats.collapsed = collapse_singletons(&mut tree);

        if let Some(spec) = options.sort {
            tree.sort(spec);
        }

        tracing::debug!(
            records = stats.records,
            groups = stats.groups,
            script_groups = stats.script_groups,
            collapsed = stats.collapsed,
            "built native object tree"
        );

        (tree, stats)
    }
}

/// Replace every top-level group that has exactly one child by that child.
///
/// Single pass over the root's children as they were before the pass: a
/// promoted child is appended to the root and not examined again.
fn collapse_singletons(tree: &mut NativeObjectTree) -> usize {
    let mut top = tree.take_children(ROOT_ID);
    let mut collapsed = 0;

    for n in (0..top.len()).rev() {
        let group = top[n];
        let only_child = match tree.slot(group) {
            TreeNode::Group(g) if g.children.len() == 1 => g.children[0],
            _ => continue,
        };

        tree.shift_depth(only_child, -1);
        tree.vacate(group);
        top.push(only_child);
        top.remove(n);
        collapsed += 1;
    }

    tree.set_children(ROOT_ID, top);
    collapsed
}

// =============================================================================
// TESTS
// =============================================================================
