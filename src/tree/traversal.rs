//! Stack-based postorder traversal.
//!
//! The stack holds one `(node, next child)` token per level, so traversal
//! depth is bounded by tree height without recursion.

use super::node::{NodeId, PhyloTree};

/// Postorder iterator: every child subtree, left to right, then the node.
#[derive(Debug)]
pub struct Postorder<'a> {
    tree: &'a PhyloTree,
    stack: Vec<(NodeId, usize)>,
}

impl<'a> Postorder<'a> {
    /// Traverse from the root.
    pub fn new(tree: &'a PhyloTree) -> Self {
        Self {
            tree,
            stack: tree.root().map(|root| vec![(root, 0)]).unwrap_or_default(),
        }
    }

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Iterator for Postorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let (id, next_child) = self.stack.last_mut()?;
            let children = &self.tree.node(*id).children;
            if let Some(&child) = children.get(*next_child) {
                *next_child += 1;
                self.stack.push((child, 0));
            } else {
                let id = *id;
                self.stack.pop();
                return Some(id);
            }
        }
    }
}

/// Names of the labelled leaves in postorder.
pub fn leaf_order(tree: &PhyloTree) -> Vec<String> {
    Postorder::new(tree)
        .map(|id| tree.node(id))
        .filter(|node| node.is_leaf())
        .filter_map(|node| node.name.clone())
        .filter(|name| !name.is_empty())
        .collect()
}
