use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node_hash::NodeHash;
use crate::state::TrieState;
use crate::ValueRLP;
use statum_rlp::encode::RLPEncode;

use super::{BranchNode, ExtensionNode, Node};

/// Leaf node, holds a value and the remainder of the path it lives at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafNode {
    pub partial: Nibbles,
    pub value: ValueRLP,
}

impl LeafNode {
    pub const fn new(partial: Nibbles, value: ValueRLP) -> Self {
        Self { partial, value }
    }

    pub fn get(&self, path: Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        if self.partial == path {
            Ok(Some(self.value.clone()))
        } else {
            Ok(None)
        }
    }

    /// Stores the value at the given path, restructuring into a branch
    /// (possibly behind an extension) when the paths diverge.
    pub fn insert(
        mut self,
        state: &mut TrieState,
        path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        if self.partial == path {
            self.value = value;
            return Ok(self.into());
        }
        // Both paths carry a terminator, so they diverge before either
        // runs out and indexing at match_index is in range for both.
        let match_index = path.count_prefix(&self.partial);
        let self_choice = self.partial.at(match_index);
        let new_choice = path.at(match_index);

        let branch = if self_choice == 16 {
            // current value settles on the branch itself
            let mut choices = BranchNode::EMPTY_CHOICES;
            choices[new_choice] =
                LeafNode::new(path.offset(match_index + 1), value).insert_self(state)?;
            BranchNode::new_with_value(Box::new(choices), self.value)
        } else if new_choice == 16 {
            // new value settles on the branch itself
            let mut choices = BranchNode::EMPTY_CHOICES;
            choices[self_choice] =
                LeafNode::new(self.partial.offset(match_index + 1), self.value)
                    .insert_self(state)?;
            BranchNode::new_with_value(Box::new(choices), value)
        } else {
            let mut choices = BranchNode::EMPTY_CHOICES;
            choices[self_choice] =
                LeafNode::new(self.partial.offset(match_index + 1), self.value)
                    .insert_self(state)?;
            choices[new_choice] =
                LeafNode::new(path.offset(match_index + 1), value).insert_self(state)?;
            BranchNode::new(Box::new(choices))
        };

        if match_index == 0 {
            Ok(branch.into())
        } else {
            let child = Node::from(branch).insert_self(state)?;
            Ok(ExtensionNode::new(path.slice(0, match_index), child).into())
        }
    }

    pub fn remove(self, path: Nibbles) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        Ok(if self.partial == path {
            (None, Some(self.value))
        } else {
            (Some(self.into()), None)
        })
    }

    pub fn get_path(&self, node_path: &mut Vec<Vec<u8>>) -> Result<(), TrieError> {
        let encoded = self.encode_to_vec();
        if encoded.len() >= 32 {
            node_path.push(encoded);
        }
        Ok(())
    }

    pub fn insert_self(self, state: &mut TrieState) -> Result<NodeHash, TrieError> {
        Node::from(self).insert_self(state)
    }
}
