//! # Address Index
//!
//! Locate the leaf holding a given native address.
//!
//! Lookups walk the tree depth-first in current child order, so after a sort
//! the first match follows the displayed order. Groups carry no address and
//! are never returned. Address 0 is the "no object" sentinel and never
//! matches.

use crate::tree::{NativeObjectTree, NodeRef};
use crate::NodeId;

impl NativeObjectTree {
    /// First leaf whose record has `address`.
    #[must_use]
    pub fn find_by_address(&self, address: u64) -> Option<NodeRef<'_>> {
        find_by_address(self, address)
    }
}

/// First leaf whose record has `address`, in depth-first order.
///
/// Returns `None` for address 0 and when no leaf matches.
#[must_use]
pub fn find_by_address(tree: &NativeObjectTree, address: u64) -> Option<NodeRef<'_>> {
    if address == 0 {
        return None;
    }
    tree.walk()
        .find(|node| node.is_leaf() && node.address() == address)
}

/// The matching leaf and every group above it, outermost first.
///
/// The root is not included. Used to show where an object sits in the
/// grouping.
#[must_use]
pub fn find_path(tree: &NativeObjectTree, address: u64) -> Option<Vec<NodeRef<'_>>> {
    if address == 0 {
        return None;
    }

    // Explicit stack of (node, depth in path) so the path can be rewound
    // when the walk climbs back up.
    let mut path: Vec<NodeRef<'_>> = Vec::new();
    let mut stack: Vec<(NodeId, usize)> = tree.root().children().map(|n| (n.id(), 0)).collect();
    stack.reverse();

    while let Some((id, level)) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        path.truncate(level);
        path.push(node);

        if node.is_leaf() {
            if node.address() == address {
                return Some(path);
            }
            continue;
        }

        let children: Vec<_> = node.children().map(|c| (c.id(), level + 1)).collect();
        stack.extend(children.into_iter().rev());
    }

    None
}

// =============================================================================
// TESTS
// =============================================================================
