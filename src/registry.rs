//! The set of storage servers known to the naming server.

use rand::seq::SliceRandom;

use crate::storage::StorageNode;

/// Known storage servers, in registration order. Guarded by the namespace
/// monitor; nothing ever leaves the set.
#[derive(Debug, Default)]
pub struct Registry {
    nodes: Vec<StorageNode>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, node: &StorageNode) -> bool {
        self.nodes.contains(node)
    }

    /// Adds a node; `false` when the pair is already registered.
    pub fn insert(&mut self, node: StorageNode) -> bool {
        if self.contains(&node) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Any registered node, `None` when the registry is empty.
    pub fn pick(&self) -> Option<StorageNode> {
        self.nodes.choose(&mut rand::thread_rng()).copied()
    }

    /// Any registered node not in `used`, `None` when all are taken.
    pub fn pick_excluding(&self, used: &[StorageNode]) -> Option<StorageNode> {
        let free: Vec<StorageNode> =
            self.nodes.iter().filter(|node| !used.contains(node)).copied().collect();
        free.choose(&mut rand::thread_rng()).copied()
    }

    #[cfg(test)]
    pub(crate) fn nodes(&self) -> &[StorageNode] {
        &self.nodes
    }
}
