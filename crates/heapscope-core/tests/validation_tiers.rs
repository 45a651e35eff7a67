//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the native object view is INVALID.
//!
//! ## Tiers
//! - T0: Snapshot Integrity
//! - T1: Type Grouping and Collapse
//! - T2: Script Re-grouping
//! - T3: Sorting and Address Lookup

use heapscope_core::{
    BuildOptions, Connectivity, GroupingEngine, HeapscopeError, NodeId, PolymorphicMarkers, Record,
    RecordSource, SecondaryName, TypeKey,
};
use std::collections::BTreeMap;

/// Hand-built record source with explicit script names.
struct StubSource {
    records: Vec<Record>,
    names: BTreeMap<usize, SecondaryName>,
    markers: PolymorphicMarkers,
}

impl StubSource {
    fn new(records: Vec<Record>) -> Self {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(index, mut r)| {
                r.index = index;
                r
            })
            .collect();
        Self {
            records,
            names: BTreeMap::new(),
            markers: PolymorphicMarkers::none(),
        }
    }

    fn with_markers(mut self, behaviour: u32, scripted_data: u32) -> Self {
        self.markers = PolymorphicMarkers::new(TypeKey(behaviour), TypeKey(scripted_data));
        self
    }

    fn with_script(mut self, index: usize, name: &str, key: u32) -> Self {
        self.names.insert(
            index,
            SecondaryName {
                name: name.to_string(),
                key: TypeKey(key),
            },
        );
        self
    }
}

impl RecordSource for StubSource {
    fn records(&self) -> &[Record] {
        &self.records
    }

    fn classification_key(&self, record: &Record) -> Option<TypeKey> {
        u32::try_from(record.type_index).ok().map(TypeKey)
    }

    fn resolve_secondary_name(&self, record: &Record) -> Option<SecondaryName> {
        self.names.get(&record.index).cloned()
    }

    fn display_name(&self, key: TypeKey) -> String {
        format!("T{}", key.0)
    }

    fn connectivity(&self, record: &Record) -> Connectivity {
        Connectivity::new(record.index as u32, 1)
    }

    fn polymorphic_markers(&self) -> PolymorphicMarkers {
        self.markers
    }
}

// =============================================================================
// TIER T0: SNAPSHOT INTEGRITY
// =============================================================================

mod t0_snapshot_integrity {
    use super::*;
    use heapscope_core::{Connection, CoreTypes, NativeType, Snapshot, SnapshotData};

    /// T0.1: An empty source yields an empty tree, never a fault.
    #[test]
    fn empty_source_builds_empty_tree() {
        let tree = GroupingEngine::build(&StubSource::new(Vec::new()), BuildOptions::default());

        assert!(tree.is_empty());
        assert_eq!(tree.root().size(), 0);
        assert_eq!(tree.root().count(), 0);
        assert_eq!(tree.walk().count(), 0);
    }

    /// T0.2: Records with missing types land in one unknown bucket.
    #[test]
    fn malformed_types_share_unknown_bucket() {
        let source = StubSource::new(vec![
            Record::new(-1, 7, 0x10),
            Record::new(-5, 3, 0x20),
            Record::new(0, 1, 0x30),
            Record::new(0, 1, 0x40),
        ]);
        let tree = GroupingEngine::build(&source, BuildOptions::default());

        let labels: Vec<_> = tree.root().children().map(|n| n.display_label()).collect();
        assert_eq!(labels, vec!["<unknown>", "T0"]);
        assert_eq!(tree.get(NodeId(1)).expect("unknown bucket").size(), 10);
    }

    /// T0.3: A connection past the object table is rejected.
    #[test]
    fn dangling_connection_rejected() {
        let data = SnapshotData {
            types: vec![NativeType::new("Mesh")],
            objects: vec![Record::new(0, 1, 0x10)],
            connections: vec![Connection::new(0, 1)],
            core_types: CoreTypes::default(),
        };

        assert!(matches!(
            Snapshot::new(data),
            Err(HeapscopeError::InvalidSnapshot(_))
        ));
    }

    /// T0.4: Building twice from one source gives identical ids.
    #[test]
    fn builds_are_independent() {
        let source = StubSource::new(vec![Record::new(0, 1, 0x10), Record::new(0, 2, 0x20)]);
        let a = GroupingEngine::build(&source, BuildOptions::default());
        let b = GroupingEngine::build(&source, BuildOptions::default());

        let ids = |t: &heapscope_core::NativeObjectTree| -> Vec<NodeId> {
            t.walk().map(|n| n.id()).collect()
        };
        assert_eq!(ids(&a), vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(ids(&a), ids(&b));
    }
}

// =============================================================================
// TIER T1: TYPE GROUPING AND COLLAPSE
// =============================================================================

mod t1_type_grouping {
    use super::*;

    /// T1.1: [T1 10, T1 20, T2 5] -> [Group(T1, 30, 2), Leaf(T2, 5)].
    #[test]
    fn singleton_type_collapses_to_leaf() {
        let source = StubSource::new(vec![
            Record::new(1, 10, 0x10),
            Record::new(1, 20, 0x20),
            Record::new(2, 5, 0x30),
        ]);
        let tree = GroupingEngine::build(&source, BuildOptions::default());
        let top: Vec<_> = tree.root().children().collect();

        assert_eq!(top.len(), 2);

        assert!(top[0].is_group());
        assert_eq!(top[0].display_label(), "T1");
        assert_eq!(top[0].size(), 30);
        assert_eq!(top[0].count(), 2);
        assert_eq!(top[0].child_count(), 2);

        assert!(top[1].is_leaf());
        assert_eq!(top[1].display_label(), "T2");
        assert_eq!(top[1].size(), 5);
        assert_eq!(top[1].count(), 0);
        // Promoted to the level of the T1 group.
        assert_eq!(top[1].depth(), 0);
        assert_eq!(top[0].children().next().expect("leaf").depth(), 1);
    }

    /// T1.2: Leaves keep source order inside their group.
    #[test]
    fn insertion_order_preserved() {
        let source = StubSource::new(vec![
            Record::new(0, 3, 0x30),
            Record::new(0, 1, 0x10),
            Record::new(0, 2, 0x20),
        ]);
        let tree = GroupingEngine::build(&source, BuildOptions::default());

        let group = tree.root().children().next().expect("group");
        let addresses: Vec<_> = group.children().map(|n| n.address()).collect();
        assert_eq!(addresses, vec![0x30, 0x10, 0x20]);
    }

    /// T1.3: Every top-level singleton collapses, wherever it sits.
    #[test]
    fn all_singletons_collapse() {
        let source = StubSource::new(vec![
            Record::new(0, 1, 0x10),
            Record::new(1, 1, 0x20),
            Record::new(1, 1, 0x30),
            Record::new(2, 1, 0x40),
        ]);
        let tree = GroupingEngine::build(&source, BuildOptions::default());

        let shape: Vec<_> = tree
            .root()
            .children()
            .map(|n| (n.display_label(), n.is_group()))
            .collect();
        assert_eq!(shape, vec![("T1", true), ("T2", false), ("T0", false)]);
    }

    /// T1.4: Reference maxima only appear when tracking is on.
    #[test]
    fn reference_maxima_follow_tracking() {
        let source = StubSource::new(vec![
            Record::new(0, 1, 0x10),
            Record::new(0, 1, 0x20),
            Record::new(0, 1, 0x30),
        ]);

        let off = GroupingEngine::build(&source, BuildOptions::default());
        assert_eq!(off.root().children().next().expect("group").references(), 0);

        let on = GroupingEngine::build(&source, BuildOptions::default().with_references(true));
        let group = on.root().children().next().expect("group");
        assert_eq!(group.references(), 2);
        assert_eq!(group.referenced_by(), 1);
    }
}

// =============================================================================
// TIER T2: SCRIPT RE-GROUPING
// =============================================================================

mod t2_script_regrouping {
    use super::*;

    const BEHAVIOUR: u32 = 7;
    const SCRIPTED_DATA: u32 = 8;
    const SCRIPT: u32 = 9;

    /// T2.1: Same script name, same sub-group; different names, different sub-groups.
    #[test]
    fn records_split_by_script_name() {
        let source = StubSource::new(vec![
            Record::new(BEHAVIOUR as i64, 10, 0x10),
            Record::new(BEHAVIOUR as i64, 20, 0x20),
            Record::new(BEHAVIOUR as i64, 40, 0x30),
        ])
        .with_markers(BEHAVIOUR, SCRIPTED_DATA)
        .with_script(0, "Player", SCRIPT)
        .with_script(1, "Enemy", SCRIPT)
        .with_script(2, "Player", SCRIPT);
        let tree = GroupingEngine::build(&source, BuildOptions::default());

        let primary = tree.root().children().next().expect("primary");
        assert_eq!(primary.display_label(), "T7");

        let subs: Vec<_> = primary
            .children()
            .map(|n| (n.display_label(), n.size(), n.child_count()))
            .collect();
        assert_eq!(subs, vec![("Player", 50, 2), ("Enemy", 20, 1)]);

        for sub in primary.children() {
            assert_eq!(sub.type_name(), "T7");
            assert_eq!(sub.depth(), 1);
        }
    }

    /// T2.2: Without a resolvable name a record stays under its primary group.
    #[test]
    fn unresolved_record_stays_in_primary() {
        let source = StubSource::new(vec![
            Record::new(SCRIPTED_DATA as i64, 1, 0x10),
            Record::new(SCRIPTED_DATA as i64, 2, 0x20),
        ])
        .with_markers(BEHAVIOUR, SCRIPTED_DATA)
        .with_script(0, "Settings", SCRIPT);
        let tree = GroupingEngine::build(&source, BuildOptions::default());

        let primary = tree.root().children().next().expect("primary");
        let shape: Vec<_> = primary
            .children()
            .map(|n| (n.display_label(), n.is_group()))
            .collect();
        assert_eq!(shape, vec![("Settings", true), ("T8", false)]);
    }

    /// T2.3: Names are never consulted for non-marker types.
    #[test]
    fn non_marker_types_ignore_names() {
        let source = StubSource::new(vec![Record::new(1, 1, 0x10), Record::new(1, 1, 0x20)])
            .with_markers(BEHAVIOUR, SCRIPTED_DATA)
            .with_script(0, "Player", SCRIPT);
        let tree = GroupingEngine::build(&source, BuildOptions::default());

        let group = tree.root().children().next().expect("group");
        assert!(group.children().all(|n| n.is_leaf()));
    }

    /// T2.4: The secondary type is part of the sub-group key.
    #[test]
    fn same_name_different_secondary_type_splits() {
        let source = StubSource::new(vec![
            Record::new(BEHAVIOUR as i64, 1, 0x10),
            Record::new(BEHAVIOUR as i64, 1, 0x20),
        ])
        .with_markers(BEHAVIOUR, SCRIPTED_DATA)
        .with_script(0, "Player", SCRIPT)
        .with_script(1, "Player", SCRIPT + 1);
        let tree = GroupingEngine::build(&source, BuildOptions::default());

        let primary = tree.root().children().next().expect("primary");
        assert_eq!(primary.child_count(), 2);
    }

    /// T2.5: Sub-groups are scoped to their primary group.
    #[test]
    fn sub_groups_do_not_cross_primaries() {
        let source = StubSource::new(vec![
            Record::new(BEHAVIOUR as i64, 1, 0x10),
            Record::new(SCRIPTED_DATA as i64, 1, 0x20),
            Record::new(BEHAVIOUR as i64, 1, 0x30),
            Record::new(SCRIPTED_DATA as i64, 1, 0x40),
        ])
        .with_markers(BEHAVIOUR, SCRIPTED_DATA)
        .with_script(0, "Shared", SCRIPT)
        .with_script(1, "Shared", SCRIPT)
        .with_script(2, "Shared", SCRIPT)
        .with_script(3, "Shared", SCRIPT);
        let tree = GroupingEngine::build(&source, BuildOptions::default());

        // Each primary holds one "Shared" sub-group and collapses into it.
        let top: Vec<_> = tree
            .root()
            .children()
            .map(|n| (n.display_label(), n.type_name(), n.child_count()))
            .collect();
        assert_eq!(top, vec![("Shared", "T8", 2), ("Shared", "T7", 2)]);
    }

    /// T2.6: A lone scripted record leaves a nested singleton behind.
    ///
    /// The primary group is replaced by its only child, the named sub-group.
    /// That sub-group still holds one leaf and is not examined again.
    #[test]
    fn collapse_is_not_recursive() {
        let source = StubSource::new(vec![Record::new(BEHAVIOUR as i64, 64, 0x10)])
            .with_markers(BEHAVIOUR, SCRIPTED_DATA)
            .with_script(0, "Player", SCRIPT);
        let tree = GroupingEngine::build(&source, BuildOptions::default());

        let top: Vec<_> = tree.root().children().collect();
        assert_eq!(top.len(), 1);
        assert!(top[0].is_group());
        assert_eq!(top[0].display_label(), "Player");
        assert_eq!(top[0].depth(), 0);
        assert_eq!(top[0].child_count(), 1);

        let leaf = top[0].children().next().expect("leaf");
        assert!(leaf.is_leaf());
        assert_eq!(leaf.depth(), 1);
        assert_eq!(leaf.size(), 64);

        // The primary group's id is vacant.
        assert!(tree.get(NodeId(1)).is_none());
    }
}

// =============================================================================
// TIER T3: SORTING AND ADDRESS LOOKUP
// =============================================================================

mod t3_sort_and_lookup {
    use super::*;
    use heapscope_core::{SortColumn, SortSpec, find_by_address};

    fn source() -> StubSource {
        StubSource::new(vec![
            Record::new(0, 300, 0x500).with_instance_id(5),
            Record::new(0, 100, 0x100).with_instance_id(-2),
            Record::new(1, 50, 0x300).with_flags(true, false),
            Record::new(1, 60, 0x200),
            Record::new(2, 1000, 0x400).with_flags(false, true),
        ])
    }

    fn top_labels(tree: &heapscope_core::NativeObjectTree) -> Vec<String> {
        tree.root()
            .children()
            .map(|n| n.display_label().to_string())
            .collect()
    }

    /// T3.1: Descending size puts the heaviest row first at every level.
    #[test]
    fn size_descending() {
        let spec = SortSpec::descending(SortColumn::Size);
        let tree = GroupingEngine::build(&source(), BuildOptions::sorted(spec));

        assert_eq!(top_labels(&tree), vec!["T2", "T0", "T1"]);
        let t0 = tree.root().children().nth(1).expect("T0");
        let sizes: Vec<_> = t0.children().map(|n| n.size()).collect();
        assert_eq!(sizes, vec![300, 100]);
    }

    /// T3.2: Ascending then descending reverses an untied level.
    #[test]
    fn direction_reverses() {
        let mut tree = GroupingEngine::build(&source(), BuildOptions::default());

        tree.sort(SortSpec::ascending(SortColumn::Size));
        let mut ascending = top_labels(&tree);
        tree.sort(SortSpec::descending(SortColumn::Size));
        ascending.reverse();

        assert_eq!(top_labels(&tree), ascending);
    }

    /// T3.3: Flags and instance ids put groups on the neutral side.
    #[test]
    fn group_neutral_values() {
        let spec = SortSpec::descending(SortColumn::DontDestroyOnLoad);
        let tree = GroupingEngine::build(&source(), BuildOptions::sorted(spec));
        assert_eq!(top_labels(&tree)[0], "T2");

        let spec = SortSpec::ascending(SortColumn::InstanceId);
        let tree = GroupingEngine::build(&source(), BuildOptions::sorted(spec));
        let t0 = tree
            .root()
            .children()
            .find(|n| n.display_label() == "T0")
            .expect("T0");
        let ids: Vec<_> = t0.children().map(|n| n.instance_id()).collect();
        assert_eq!(ids, vec![-2, 5]);
    }

    /// T3.4: Type names compare without case.
    #[test]
    fn type_name_ignores_case() {
        let source = StubSource::new(vec![Record::new(0, 1, 0x10), Record::new(1, 1, 0x20)]);

        struct Named(StubSource);
        impl RecordSource for Named {
            fn records(&self) -> &[Record] {
                self.0.records()
            }
            fn classification_key(&self, record: &Record) -> Option<TypeKey> {
                self.0.classification_key(record)
            }
            fn resolve_secondary_name(&self, record: &Record) -> Option<SecondaryName> {
                self.0.resolve_secondary_name(record)
            }
            fn display_name(&self, key: TypeKey) -> String {
                ["zeta", "Alpha"][key.0 as usize].to_string()
            }
            fn connectivity(&self, record: &Record) -> Connectivity {
                self.0.connectivity(record)
            }
        }

        let spec = SortSpec::ascending(SortColumn::TypeName);
        let tree = GroupingEngine::build(&Named(source), BuildOptions::sorted(spec));
        assert_eq!(top_labels(&tree), vec!["Alpha", "zeta"]);
    }

    /// T3.5: Lookup finds the leaf in a sorted tree and misses absent addresses.
    #[test]
    fn find_by_address_after_sort() {
        let spec = SortSpec::ascending(SortColumn::Address);
        let tree = GroupingEngine::build(&source(), BuildOptions::sorted(spec));

        let hit = find_by_address(&tree, 0x300).expect("present");
        assert_eq!(hit.size(), 50);
        assert!(hit.is_persistent());

        assert!(find_by_address(&tree, 0x999).is_none());
        assert!(find_by_address(&tree, 0).is_none());
    }
}
