//! Arena-backed phylogenetic tree.
//!
//! Nodes live in a flat vector and refer to their children by index, so a
//! tree is a single allocation with no reference cycles.

use std::fmt;

/// Index of a node inside its [`PhyloTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A tree node: optional label, optional branch length, ordered children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TreeNode {
    /// Taxon or internal label.
    pub name: Option<String>,
    /// Length of the branch leading to this node.
    pub branch_length: Option<f64>,
    /// Children in file order.
    pub children: Vec<NodeId>,
}

impl TreeNode {
    /// True for nodes without children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Rooted tree. The root is always node `#0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhyloTree {
    nodes: Vec<TreeNode>,
}

impl PhyloTree {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, attaching it to `parent` when given.
    pub fn push(&mut self, parent: Option<NodeId>, name: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            name,
            ..TreeNode::default()
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    /// Root node, if the tree is non-empty.
    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree has no node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_attach_in_order() {
        let mut tree = PhyloTree::new();
        let root = tree.push(None, None);
        let a = tree.push(Some(root), Some("A".into()));
        let b = tree.push(Some(root), Some("B".into()));

        assert_eq!(tree.root(), Some(root));
        assert_eq!(tree.node(root).children, vec![a, b]);
        assert!(tree.node(a).is_leaf());
        assert_eq!(tree.leaf_count(), 2);
    }
}
