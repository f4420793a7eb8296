use crate::nibbles::Nibbles;
use crate::node::Node;
use crate::node_hash::NodeHash;
use crate::state::TrieState;
use crate::{PathRLP, Trie, ValueRLP};

/// Depth-first traversal over a trie, yielding each node along with the
/// path at which it sits.
pub struct TrieIterator {
    state: TrieState,
    // stack of nodes left to visit, along with the path leading to them
    stack: Vec<(Nibbles, NodeHash)>,
}

impl TrieIterator {
    pub(crate) fn new(trie: Trie) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = trie.root {
            stack.push((Nibbles::default(), root));
        }
        Self {
            state: trie.state,
            stack,
        }
    }
}

impl Iterator for TrieIterator {
    type Item = (Nibbles, Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (mut path, next_node_hash) = self.stack.pop()?;
        let next_node = self.state.get_node(next_node_hash).ok().flatten()?;
        match &next_node {
            Node::Branch(branch_node) => {
                // push children in reverse so the smallest nibble pops first
                for (choice, child) in branch_node.choices.iter().enumerate().rev() {
                    if child.is_valid() {
                        self.stack.push((path.append_new(choice as u8), *child));
                    }
                }
            }
            Node::Extension(extension_node) => {
                path.extend(&extension_node.prefix);
                self.stack.push((path.clone(), extension_node.child));
            }
            Node::Leaf(leaf_node) => {
                path.extend(&leaf_node.partial);
            }
        }
        Some((path, next_node))
    }
}

impl TrieIterator {
    /// Iterates over the key/value pairs stored in the trie, with keys
    /// packed back into bytes.
    pub fn content(self) -> impl Iterator<Item = (PathRLP, ValueRLP)> {
        self.filter_map(|(path, node)| match node {
            Node::Branch(branch_node) => {
                (!branch_node.value.is_empty()).then(|| (path.to_bytes(), branch_node.value))
            }
            Node::Extension(_) => None,
            Node::Leaf(leaf_node) => Some((path.to_bytes(), leaf_node.value)),
        })
    }
}
