//! # Sort Engine
//!
//! Column-driven recursive ordering of a tree's children.
//!
//! Each column has one comparator over [`NodeRef`]s. Groups answer the
//! scalar columns with neutral values (address 0, flags false, instance id 0)
//! and the metric columns with their cached aggregates.
//!
//! Descending order swaps the operands before comparing instead of reversing
//! the result. Ties keep their previous relative order (stable sort).

use crate::tree::{NativeObjectTree, NodeRef};
use crate::{HeapscopeError, NodeId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// SORT SPECIFICATION
// =============================================================================

/// Sortable column of the native object view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortColumn {
    TypeName,
    Size,
    Count,
    Address,
    DontDestroyOnLoad,
    Persistent,
    InstanceId,
    References,
    ReferencedBy,
}

impl SortColumn {
    /// Every column, in header order.
    pub const ALL: [SortColumn; 9] = [
        SortColumn::TypeName,
        SortColumn::Size,
        SortColumn::Count,
        SortColumn::Address,
        SortColumn::DontDestroyOnLoad,
        SortColumn::Persistent,
        SortColumn::InstanceId,
        SortColumn::References,
        SortColumn::ReferencedBy,
    ];

    /// Canonical name, as accepted by `FromStr`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::TypeName => "type-name",
            SortColumn::Size => "size",
            SortColumn::Count => "count",
            SortColumn::Address => "address",
            SortColumn::DontDestroyOnLoad => "dont-destroy-on-load",
            SortColumn::Persistent => "persistent",
            SortColumn::InstanceId => "instance-id",
            SortColumn::References => "references",
            SortColumn::ReferencedBy => "referenced-by",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortColumn {
    type Err = HeapscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase().replace('_', "-");
        let column = match lowered.as_str() {
            "type" | "type-name" => SortColumn::TypeName,
            "size" => SortColumn::Size,
            "count" => SortColumn::Count,
            "address" => SortColumn::Address,
            "ddol" | "dont-destroy-on-load" => SortColumn::DontDestroyOnLoad,
            "persistent" => SortColumn::Persistent,
            "instance-id" | "instanceid" => SortColumn::InstanceId,
            "refs" | "references" => SortColumn::References,
            "refby" | "referenced-by" => SortColumn::ReferencedBy,
            _ => return Err(HeapscopeError::UnknownSortColumn(s.to_string())),
        };
        Ok(column)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }

    #[must_use]
    pub fn is_ascending(&self) -> bool {
        matches!(self, SortDirection::Ascending)
    }
}

/// Active column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub const fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    #[must_use]
    pub const fn ascending(column: SortColumn) -> Self {
        Self::new(column, SortDirection::Ascending)
    }

    #[must_use]
    pub const fn descending(column: SortColumn) -> Self {
        Self::new(column, SortDirection::Descending)
    }
}

// =============================================================================
// COMPARATORS
// =============================================================================

/// Compare two nodes by one column, ascending.
#[must_use]
pub fn compare_by_column(column: SortColumn, a: NodeRef<'_>, b: NodeRef<'_>) -> Ordering {
    match column {
        SortColumn::TypeName => compare_ignore_case(a.display_label(), b.display_label()),
        SortColumn::Size => a.size().cmp(&b.size()),
        SortColumn::Count => a.count().cmp(&b.count()),
        SortColumn::Address => a.address().cmp(&b.address()),
        SortColumn::DontDestroyOnLoad => a
            .is_dont_destroy_on_load()
            .cmp(&b.is_dont_destroy_on_load()),
        SortColumn::Persistent => a.is_persistent().cmp(&b.is_persistent()),
        SortColumn::InstanceId => a.instance_id().cmp(&b.instance_id()),
        SortColumn::References => a.references().cmp(&b.references()),
        SortColumn::ReferencedBy => a.referenced_by().cmp(&b.referenced_by()),
    }
}

/// Compare two nodes under a column and direction.
///
/// Descending swaps the operands; the comparator itself is never negated.
#[must_use]
pub fn compare(spec: SortSpec, a: NodeRef<'_>, b: NodeRef<'_>) -> Ordering {
    match spec.direction {
        SortDirection::Ascending => compare_by_column(spec.column, a, b),
        SortDirection::Descending => compare_by_column(spec.column, b, a),
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

// =============================================================================
// RECURSIVE SORT
// =============================================================================

impl NativeObjectTree {
    /// Sort every level of the tree and remember `spec` as the active order.
    pub fn sort(&mut self, spec: SortSpec) {
        tracing::debug!(column = %spec.column, ascending = spec.direction.is_ascending(), "sorting tree");
        self.sort_subtree(crate::primitives::ROOT_ID, spec);
        self.set_sort(spec);
    }

    /// Sort the children of `node`, and theirs, recursively.
    ///
    /// Unknown or collapsed ids are ignored.
    pub fn sort_subtree(&mut self, node: NodeId, spec: SortSpec) {
        if self.get(node).is_none() {
            return;
        }
        self.sort_children(node, spec);
    }

    // Post-order: a node's own list is detached only while its children,
    // whose subtrees are already complete, are being compared.
    fn sort_children(&mut self, id: NodeId, spec: SortSpec) {
        let mut children = self.take_children(id);
        for &child in &children {
            self.sort_children(child, spec);
        }
        children.sort_by(|&a, &b| compare(spec, self.node(a), self.node(b)));
        self.set_children(id, children);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ROOT_ID;
    use crate::{Connectivity, Record};

    /// Root -> [Group "beta"(30, 2 leaves), Leaf "Alpha"(5), Group "gamma"(12, 1 leaf)]
    fn mixed_tree() -> NativeObjectTree {
        let mut tree = NativeObjectTree::with_root();
        let beta_ty = tree.add_type_name("beta");
        let alpha_ty = tree.add_type_name("Alpha");
        let gamma_ty = tree.add_type_name("gamma");
        let beta = tree.push_group(ROOT_ID, String::new(), beta_ty);
        tree.push_leaf(
            beta,
            Record::new(0, 10, 0x300).with_instance_id(3),
            beta_ty,
            Some(Connectivity::new(1, 5)),
        );
        tree.push_leaf(
            beta,
            Record::new(0, 20, 0x100).with_instance_id(1),
            beta_ty,
            Some(Connectivity::new(6, 0)),
        );
        tree.push_leaf(
            ROOT_ID,
            Record::new(1, 5, 0x200).with_flags(true, true),
            alpha_ty,
            Some(Connectivity::new(2, 2)),
        );
        let gamma = tree.push_group(ROOT_ID, String::new(), gamma_ty);
        tree.push_leaf(
            gamma,
            Record::new(2, 12, 0x400),
            gamma_ty,
            None,
        );
        tree
    }

    fn top_labels(tree: &NativeObjectTree) -> Vec<&str> {
        tree.root().children().map(|n| n.display_label()).collect()
    }

    #[test]
    fn column_names_roundtrip_through_from_str() {
        for column in SortColumn::ALL {
            assert_eq!(column.as_str().parse::<SortColumn>().expect("parse"), column);
        }
        assert_eq!("DDOL".parse::<SortColumn>().expect("parse"), SortColumn::DontDestroyOnLoad);
        assert!(matches!(
            "colour".parse::<SortColumn>(),
            Err(HeapscopeError::UnknownSortColumn(_))
        ));
    }

    #[test]
    fn type_name_ignores_case() {
        let mut tree = mixed_tree();
        tree.sort(SortSpec::ascending(SortColumn::TypeName));
        assert_eq!(top_labels(&tree), vec!["Alpha", "beta", "gamma"]);

        tree.sort(SortSpec::descending(SortColumn::TypeName));
        assert_eq!(top_labels(&tree), vec!["gamma", "beta", "Alpha"]);
    }

    #[test]
    fn size_uses_group_aggregates() {
        let mut tree = mixed_tree();
        tree.sort(SortSpec::descending(SortColumn::Size));
        assert_eq!(top_labels(&tree), vec!["beta", "gamma", "Alpha"]);

        let beta_sizes: Vec<u64> = tree
            .root()
            .children()
            .next()
            .expect("first")
            .children()
            .map(|n| n.size())
            .collect();
        assert_eq!(beta_sizes, vec![20, 10]);
    }

    #[test]
    fn count_treats_leaves_as_zero() {
        let mut tree = mixed_tree();
        tree.sort(SortSpec::ascending(SortColumn::Count));
        assert_eq!(top_labels(&tree), vec!["Alpha", "gamma", "beta"]);
    }

    #[test]
    fn address_sorts_groups_first() {
        let mut tree = mixed_tree();
        tree.sort(SortSpec::ascending(SortColumn::Address));
        // Both groups have address 0 and keep their relative order.
        assert_eq!(top_labels(&tree), vec!["beta", "gamma", "Alpha"]);

        let beta = tree.root().children().next().expect("first");
        let addresses: Vec<u64> = beta.children().map(|n| n.address()).collect();
        assert_eq!(addresses, vec![0x100, 0x300]);
    }

    #[test]
    fn flags_put_groups_with_false() {
        let mut tree = mixed_tree();
        tree.sort(SortSpec::descending(SortColumn::Persistent));
        assert_eq!(top_labels(&tree)[0], "Alpha");

        tree.sort(SortSpec::descending(SortColumn::DontDestroyOnLoad));
        assert_eq!(top_labels(&tree)[0], "Alpha");
    }

    #[test]
    fn references_use_group_maximum() {
        let mut tree = mixed_tree();
        tree.sort(SortSpec::descending(SortColumn::References));
        assert_eq!(top_labels(&tree), vec!["beta", "Alpha", "gamma"]);

        tree.sort(SortSpec::descending(SortColumn::ReferencedBy));
        assert_eq!(top_labels(&tree), vec!["beta", "Alpha", "gamma"]);
    }

    #[test]
    fn instance_id_orders_nested_leaves() {
        let mut tree = mixed_tree();
        tree.sort(SortSpec::ascending(SortColumn::InstanceId));
        let beta = tree.get(NodeId(1)).expect("beta");
        let ids: Vec<i32> = beta.children().map(|n| n.instance_id()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn descending_reverses_when_no_ties() {
        let mut tree = mixed_tree();
        tree.sort(SortSpec::ascending(SortColumn::Size));
        let ascending = top_labels(&tree)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        tree.sort(SortSpec::descending(SortColumn::Size));
        let mut descending = top_labels(&tree)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        descending.reverse();

        assert_eq!(ascending, descending);
    }

    #[test]
    fn sort_spec_is_remembered() {
        let mut tree = mixed_tree();
        assert_eq!(tree.sort_spec(), None);

        let spec = SortSpec::descending(SortColumn::Count);
        tree.sort(spec);
        assert_eq!(tree.sort_spec(), Some(spec));
    }

    #[test]
    fn sort_subtree_leaves_other_levels_alone() {
        let mut tree = mixed_tree();
        tree.sort_subtree(NodeId(1), SortSpec::ascending(SortColumn::Size));

        assert_eq!(top_labels(&tree), vec!["beta", "Alpha", "gamma"]);
        let beta = tree.get(NodeId(1)).expect("beta");
        let sizes: Vec<u64> = beta.children().map(|n| n.size()).collect();
        assert_eq!(sizes, vec![10, 20]);
        assert_eq!(tree.sort_spec(), None);
    }

    #[test]
    fn direction_helpers() {
        assert!(SortDirection::from_ascending(true).is_ascending());
        assert_eq!(SortDirection::from_ascending(false), SortDirection::Descending);
    }
}
