use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node_hash::NodeHash;
use crate::state::TrieState;
use crate::ValueRLP;
use statum_rlp::encode::RLPEncode;

use super::{BranchNode, Node};

/// Extension node, holds a shared path prefix and a single child.
/// The prefix is never empty and never carries a terminator.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionNode {
    pub prefix: Nibbles,
    pub child: NodeHash,
}

impl ExtensionNode {
    pub const fn new(prefix: Nibbles, child: NodeHash) -> Self {
        Self { prefix, child }
    }

    pub fn get(&self, state: &TrieState, mut path: Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        if path.skip_prefix(&self.prefix) {
            let child_node = state
                .get_node(self.child)?
                .ok_or_else(|| TrieError::MissingNode(self.child.finalize()))?;
            child_node.get(state, path)
        } else {
            Ok(None)
        }
    }

    pub fn insert(
        mut self,
        state: &mut TrieState,
        path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        let match_index = path.count_prefix(&self.prefix);
        if match_index == self.prefix.len() {
            // path continues in the child subtrie
            let child_node = state
                .get_node(self.child)?
                .ok_or_else(|| TrieError::MissingNode(self.child.finalize()))?;
            let new_child = child_node.insert(state, path.offset(match_index), value)?;
            self.child = new_child.insert_self(state)?;
            Ok(self.into())
        } else if match_index == 0 {
            // paths diverge on the first nibble, turn into a branch
            let child_ref = if self.prefix.len() == 1 {
                self.child
            } else {
                ExtensionNode::new(self.prefix.offset(1), self.child)
                    .insert_self(state)?
            };
            let mut choices = BranchNode::EMPTY_CHOICES;
            choices[self.prefix.at(0)] = child_ref;
            BranchNode::new(Box::new(choices)).insert(state, path, value)
        } else {
            // split the prefix at the divergence point
            let shortened = ExtensionNode::new(self.prefix.offset(match_index), self.child);
            let new_child = shortened.insert(state, path.offset(match_index), value)?;
            self.prefix = self.prefix.slice(0, match_index);
            self.child = new_child.insert_self(state)?;
            Ok(self.into())
        }
    }

    pub fn remove(
        mut self,
        state: &mut TrieState,
        mut path: Nibbles,
    ) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        if !path.skip_prefix(&self.prefix) {
            return Ok((Some(self.into()), None));
        }
        let child_node = state
            .get_node(self.child)?
            .ok_or_else(|| TrieError::MissingNode(self.child.finalize()))?;
        let (child_node, old_value) = child_node.remove(state, path)?;

        // An extension can't hang off a leaf or another extension, merge
        // the prefixes instead.
        let node = match child_node {
            Some(node @ Node::Branch(_)) => {
                self.child = node.insert_self(state)?;
                Some(self.into())
            }
            Some(Node::Extension(extension_node)) => {
                self.prefix.extend(&extension_node.prefix);
                self.child = extension_node.child;
                Some(self.into())
            }
            Some(Node::Leaf(mut leaf_node)) => {
                leaf_node.partial = self.prefix.concat(&leaf_node.partial);
                Some(leaf_node.into())
            }
            None => None,
        };
        Ok((node, old_value))
    }

    pub fn insert_self(self, state: &mut TrieState) -> Result<NodeHash, TrieError> {
        Node::from(self).insert_self(state)
    }

    pub fn get_path(
        &self,
        state: &TrieState,
        mut path: Nibbles,
        node_path: &mut Vec<Vec<u8>>,
    ) -> Result<(), TrieError> {
        let encoded = self.encode_to_vec();
        if encoded.len() >= 32 {
            node_path.push(encoded);
        }
        if path.skip_prefix(&self.prefix) {
            let child_node = state
                .get_node(self.child)?
                .ok_or_else(|| TrieError::MissingNode(self.child.finalize()))?;
            child_node.get_path(state, path, node_path)?;
        }
        Ok(())
    }
}
