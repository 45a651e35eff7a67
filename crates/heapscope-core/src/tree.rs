//! # Native Object Tree
//!
//! Arena storage for the grouped hierarchy.
//!
//! Every node lives in a slot of the arena whose index equals its `NodeId`.
//! Slot 0 is the synthetic root. Groups removed by the collapse pass leave a
//! vacant slot behind, so ids stay stable and unique for the whole tree.
//!
//! Reading is done through [`NodeRef`], a copyable handle that dispatches
//! every per-node accessor over the closed `Group | Leaf` variant set.

use crate::aggregate::AggregateCache;
use crate::primitives::{ROOT_DEPTH, ROOT_ID, ROOT_LABEL};
use crate::sort::SortSpec;
use crate::{Connectivity, NodeId, Record};

// =============================================================================
// NODES
// =============================================================================

/// Index into the type name table of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TypeSlot(u32);

/// Slot of the empty name carried by the synthetic root.
const ROOT_TYPE: TypeSlot = TypeSlot(0);

/// An aggregation bucket.
#[derive(Debug, Clone)]
pub struct Group {
    pub(crate) id: NodeId,
    pub(crate) depth: i32,
    /// Explicit label; empty means "use the type name".
    pub(crate) label: String,
    pub(crate) type_slot: TypeSlot,
    pub(crate) children: Vec<NodeId>,
    pub(crate) aggregates: AggregateCache,
}

/// Exactly one object record.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub(crate) id: NodeId,
    pub(crate) depth: i32,
    pub(crate) record: Record,
    pub(crate) type_slot: TypeSlot,
    /// Present only when the build tracked references.
    pub(crate) connectivity: Option<Connectivity>,
}

/// A node of the tree.
#[derive(Debug, Clone)]
pub enum TreeNode {
    Group(Group),
    Leaf(Leaf),
}

impl TreeNode {
    fn depth_mut(&mut self) -> &mut i32 {
        match self {
            TreeNode::Group(g) => &mut g.depth,
            TreeNode::Leaf(l) => &mut l.depth,
        }
    }

    fn child_ids(&self) -> &[NodeId] {
        match self {
            TreeNode::Group(g) => &g.children,
            TreeNode::Leaf(_) => &[],
        }
    }
}

// =============================================================================
// TREE
// =============================================================================

/// The grouped hierarchy built from one snapshot.
///
/// Built atomically by [`crate::GroupingEngine`]; afterwards the only
/// supported mutation is reordering children with [`NativeObjectTree::sort`].
#[derive(Debug, Clone)]
pub struct NativeObjectTree {
    nodes: Vec<Option<TreeNode>>,
    /// One entry per native type; every node of that type points here.
    type_names: Vec<String>,
    sort: Option<SortSpec>,
}

impl NativeObjectTree {
    /// A tree holding only the synthetic root.
    pub(crate) fn with_root() -> Self {
        let root = TreeNode::Group(Group {
            id: ROOT_ID,
            depth: ROOT_DEPTH,
            label: ROOT_LABEL.to_string(),
            type_slot: ROOT_TYPE,
            children: Vec::new(),
            aggregates: AggregateCache::default(),
        });
        Self {
            nodes: vec![Some(root)],
            type_names: vec![String::new()],
            sort: None,
        }
    }

    /// Register a type name. Returns the slot nodes of that type refer to.
    pub(crate) fn add_type_name(&mut self, name: impl Into<String>) -> TypeSlot {
        let slot = TypeSlot(self.type_names.len() as u32);
        self.type_names.push(name.into());
        slot
    }

    fn type_name_at(&self, slot: TypeSlot) -> &str {
        self.type_names
            .get(slot.0 as usize)
            .map_or("", String::as_str)
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u64)
    }

    /// Append a group under `parent`. Returns its id.
    pub(crate) fn push_group(
        &mut self,
        parent: NodeId,
        label: String,
        type_slot: TypeSlot,
    ) -> NodeId {
        let id = self.next_id();
        let depth = self.depth_of(parent) + 1;
        self.nodes.push(Some(TreeNode::Group(Group {
            id,
            depth,
            label,
            type_slot,
            children: Vec::new(),
            aggregates: AggregateCache::default(),
        })));
        self.attach(parent, id);
        id
    }

    /// Append a leaf under `parent`. Returns its id.
    pub(crate) fn push_leaf(
        &mut self,
        parent: NodeId,
        record: Record,
        type_slot: TypeSlot,
        connectivity: Option<Connectivity>,
    ) -> NodeId {
        let id = self.next_id();
        let depth = self.depth_of(parent) + 1;
        self.nodes.push(Some(TreeNode::Leaf(Leaf {
            id,
            depth,
            record,
            type_slot,
            connectivity,
        })));
        self.attach(parent, id);
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        match self.slot_mut(parent) {
            TreeNode::Group(g) => g.children.push(child),
            TreeNode::Leaf(l) => unreachable!("leaf {:?} cannot take children", l.id),
        }
    }

    fn depth_of(&self, id: NodeId) -> i32 {
        match self.slot(id) {
            TreeNode::Group(g) => g.depth,
            TreeNode::Leaf(l) => l.depth,
        }
    }

    /// Detach and return the child list of a group (empty for leaves).
    pub(crate) fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        match self.slot_mut(id) {
            TreeNode::Group(g) => std::mem::take(&mut g.children),
            TreeNode::Leaf(_) => Vec::new(),
        }
    }

    /// Replace the child list of a group.
    pub(crate) fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        if let TreeNode::Group(g) = self.slot_mut(id) {
            g.children = children;
        }
    }

    /// Add `delta` to the depth of `id` and of every node below it.
    pub(crate) fn shift_depth(&mut self, id: NodeId, delta: i32) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.slot_mut(current);
            *node.depth_mut() += delta;
            stack.extend_from_slice(node.child_ids());
        }
    }

    /// Free the slot of a node that is no longer linked from anywhere.
    pub(crate) fn vacate(&mut self, id: NodeId) {
        if let Some(slot) = self.nodes.get_mut(id.index()) {
            *slot = None;
        }
    }

    pub(crate) fn set_sort(&mut self, spec: SortSpec) {
        self.sort = Some(spec);
    }

    /// Resolve a linked node. A dangling link means the build broke an invariant.
    pub(crate) fn slot(&self, id: NodeId) -> &TreeNode {
        match self.nodes.get(id.index()).and_then(Option::as_ref) {
            Some(node) => node,
            None => unreachable!("node {:?} is linked but not present in the tree", id),
        }
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut TreeNode {
        match self.nodes.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => unreachable!("node {:?} is linked but not present in the tree", id),
        }
    }

    // -------------------------------------------------------------------------
    // Read API
    // -------------------------------------------------------------------------

    /// The synthetic root.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        self.node(ROOT_ID)
    }

    /// Look up a node by id. `None` for unknown ids and collapsed groups.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        let node = self.nodes.get(id.index())?.as_ref()?;
        Some(NodeRef { tree: self, node })
    }

    pub(crate) fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            node: self.slot(id),
        }
    }

    /// True if the root has no children (the snapshot had no records).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slot(ROOT_ID).child_ids().is_empty()
    }

    /// Number of nodes reachable below the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    /// Pre-order traversal of every node below the root, in child order.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        let mut stack: Vec<NodeId> = self.slot(ROOT_ID).child_ids().to_vec();
        stack.reverse();
        Walk { tree: self, stack }
    }

    /// The column/direction the tree was last sorted by.
    #[must_use]
    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.sort
    }
}

/// Pre-order iterator returned by [`NativeObjectTree::walk`].
pub struct Walk<'a> {
    tree: &'a NativeObjectTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        self.stack.extend(node.node.child_ids().iter().rev());
        Some(node)
    }
}

// =============================================================================
// NODE HANDLE
// =============================================================================

/// Read-only handle to one node of a tree.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    pub(crate) tree: &'a NativeObjectTree,
    pub(crate) node: &'a TreeNode,
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("depth", &self.depth())
            .field("label", &self.display_label())
            .field("group", &self.is_group())
            .finish()
    }
}

impl<'a> NodeRef<'a> {
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self.node {
            TreeNode::Group(g) => g.id,
            TreeNode::Leaf(l) => l.id,
        }
    }

    #[must_use]
    pub fn depth(&self) -> i32 {
        match self.node {
            TreeNode::Group(g) => g.depth,
            TreeNode::Leaf(l) => l.depth,
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.node, TreeNode::Group(_))
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.node, TreeNode::Leaf(_))
    }

    /// Label shown in the type column.
    ///
    /// Groups use their explicit label when set (script sub-groups),
    /// otherwise the native type name.
    #[must_use]
    pub fn display_label(&self) -> &'a str {
        match self.node {
            TreeNode::Group(g) if !g.label.is_empty() => &g.label,
            _ => self.type_name(),
        }
    }

    /// Native type name, regardless of any explicit label.
    #[must_use]
    pub fn type_name(&self) -> &'a str {
        let slot = match self.node {
            TreeNode::Group(g) => g.type_slot,
            TreeNode::Leaf(l) => l.type_slot,
        };
        self.tree.type_name_at(slot)
    }

    /// Object name. Empty for groups.
    #[must_use]
    pub fn name(&self) -> &'a str {
        match self.node {
            TreeNode::Group(_) => "",
            TreeNode::Leaf(l) => &l.record.name,
        }
    }

    /// Native size in bytes; the subtree total for groups.
    #[must_use]
    pub fn size(&self) -> u64 {
        match self.node {
            TreeNode::Group(g) => self.tree.group_size(g),
            TreeNode::Leaf(l) => l.record.size,
        }
    }

    /// Number of leaves below a group. Always 0 for leaves.
    #[must_use]
    pub fn count(&self) -> u64 {
        match self.node {
            TreeNode::Group(g) => self.tree.group_count(g),
            TreeNode::Leaf(_) => 0,
        }
    }

    /// Object address. Always 0 for groups.
    #[must_use]
    pub fn address(&self) -> u64 {
        match self.node {
            TreeNode::Group(_) => 0,
            TreeNode::Leaf(l) => l.record.address,
        }
    }

    #[must_use]
    pub fn is_dont_destroy_on_load(&self) -> bool {
        match self.node {
            TreeNode::Group(_) => false,
            TreeNode::Leaf(l) => l.record.is_dont_destroy_on_load,
        }
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        match self.node {
            TreeNode::Group(_) => false,
            TreeNode::Leaf(l) => l.record.is_persistent,
        }
    }

    #[must_use]
    pub fn instance_id(&self) -> i32 {
        match self.node {
            TreeNode::Group(_) => 0,
            TreeNode::Leaf(l) => l.record.instance_id,
        }
    }

    /// Outgoing references; the worst member for groups.
    ///
    /// 0 when the tree was built without reference tracking.
    #[must_use]
    pub fn references(&self) -> u32 {
        match self.node {
            TreeNode::Group(g) => self.tree.group_max_references(g),
            TreeNode::Leaf(l) => l.connectivity.map_or(0, |c| c.references),
        }
    }

    /// Incoming references; the worst member for groups.
    #[must_use]
    pub fn referenced_by(&self) -> u32 {
        match self.node {
            TreeNode::Group(g) => self.tree.group_max_referenced_by(g),
            TreeNode::Leaf(l) => l.connectivity.map_or(0, |c| c.referenced_by),
        }
    }

    /// The underlying record of a leaf.
    #[must_use]
    pub fn record(&self) -> Option<&'a Record> {
        match self.node {
            TreeNode::Group(_) => None,
            TreeNode::Leaf(l) => Some(&l.record),
        }
    }

    /// Memoized aggregates of a group.
    #[must_use]
    pub fn aggregates(&self) -> Option<&'a AggregateCache> {
        match self.node {
            TreeNode::Group(g) => Some(&g.aggregates),
            TreeNode::Leaf(_) => None,
        }
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.node.child_ids().len()
    }

    /// Direct children in their current order.
    pub fn children(self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.node.child_ids().iter().map(move |&id| tree.node(id))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> NativeObjectTree {
        let mut tree = NativeObjectTree::with_root();
        let texture = tree.add_type_name("Texture2D");
        let textures = tree.push_group(ROOT_ID, String::new(), texture);
        tree.push_leaf(
            textures,
            Record::new(0, 100, 0x100).with_name("atlas"),
            texture,
            None,
        );
        tree.push_leaf(
            textures,
            Record::new(0, 50, 0x200),
            texture,
            Some(Connectivity::new(3, 1)),
        );
        tree
    }

    #[test]
    fn ids_follow_build_order() {
        let tree = small_tree();
        let ids: Vec<_> = tree.walk().map(|n| n.id()).collect();
        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(tree.root().id(), ROOT_ID);
    }

    #[test]
    fn depth_is_parent_plus_one() {
        let tree = small_tree();
        assert_eq!(tree.root().depth(), -1);
        for node in tree.walk() {
            for child in node.children() {
                assert_eq!(child.depth(), node.depth() + 1);
            }
        }
    }

    #[test]
    fn group_label_falls_back_to_type_name() {
        let mut tree = small_tree();
        let behaviour = tree.add_type_name("MonoBehaviour");
        let named = tree.push_group(NodeId(1), "PlayerController".to_string(), behaviour);

        assert_eq!(tree.node(NodeId(1)).display_label(), "Texture2D");
        assert_eq!(tree.node(named).display_label(), "PlayerController");
        assert_eq!(tree.node(named).type_name(), "MonoBehaviour");
    }

    #[test]
    fn nodes_of_one_type_share_its_name() {
        let tree = small_tree();
        let group = tree.node(NodeId(1)).type_name();
        let leaf = tree.node(NodeId(2)).type_name();

        assert_eq!(leaf, "Texture2D");
        assert!(std::ptr::eq(group, leaf));
        assert_eq!(tree.type_names.len(), 2);
    }

    #[test]
    fn group_scalar_columns_are_neutral() {
        let tree = small_tree();
        let group = tree.node(NodeId(1));

        assert_eq!(group.address(), 0);
        assert_eq!(group.instance_id(), 0);
        assert!(!group.is_persistent());
        assert!(!group.is_dont_destroy_on_load());
        assert_eq!(group.name(), "");
        assert!(group.record().is_none());
    }

    #[test]
    fn leaf_exposes_record() {
        let tree = small_tree();
        let leaf = tree.node(NodeId(2));

        assert!(leaf.is_leaf());
        assert_eq!(leaf.name(), "atlas");
        assert_eq!(leaf.address(), 0x100);
        assert_eq!(leaf.count(), 0);
        assert_eq!(leaf.child_count(), 0);
        assert_eq!(leaf.references(), 0);
        assert_eq!(tree.node(NodeId(3)).references(), 3);
    }

    #[test]
    fn vacated_slot_is_not_found() {
        let mut tree = small_tree();
        let children = tree.take_children(ROOT_ID);
        assert_eq!(children, vec![NodeId(1)]);

        tree.vacate(NodeId(1));
        assert!(tree.get(NodeId(1)).is_none());
        assert!(tree.get(NodeId(2)).is_some());
        assert!(tree.is_empty());
    }

    #[test]
    fn shift_depth_moves_whole_subtree() {
        let mut tree = small_tree();
        tree.shift_depth(NodeId(1), -1);

        assert_eq!(tree.node(NodeId(1)).depth(), -1);
        assert_eq!(tree.node(NodeId(2)).depth(), 0);
        assert_eq!(tree.node(NodeId(3)).depth(), 0);
    }

    #[test]
    fn len_counts_reachable_nodes() {
        let tree = small_tree();
        assert_eq!(tree.len(), 3);
        assert!(!tree.is_empty());
        assert!(NativeObjectTree::with_root().is_empty());
    }
}
