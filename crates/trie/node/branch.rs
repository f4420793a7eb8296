use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node_hash::NodeHash;
use crate::state::TrieState;
use crate::ValueRLP;
use statum_rlp::encode::RLPEncode;

use super::{ExtensionNode, LeafNode, Node};

/// Branch node, sixteen children (one per nibble) plus an optional value
/// for the path ending at this node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchNode {
    pub choices: Box<[NodeHash; 16]>,
    pub value: ValueRLP,
}

impl BranchNode {
    pub const EMPTY_CHOICES: [NodeHash; 16] = [NodeHash::EMPTY; 16];

    pub fn new(choices: Box<[NodeHash; 16]>) -> Self {
        Self {
            choices,
            value: Default::default(),
        }
    }

    pub const fn new_with_value(choices: Box<[NodeHash; 16]>, value: ValueRLP) -> Self {
        Self { choices, value }
    }

    pub fn get(&self, state: &TrieState, mut path: Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        match path.next_choice() {
            Some(choice) if self.choices[choice].is_valid() => {
                let child_node = state
                    .get_node(self.choices[choice])?
                    .ok_or_else(|| TrieError::MissingNode(self.choices[choice].finalize()))?;
                child_node.get(state, path)
            }
            Some(_) => Ok(None),
            None => Ok((!self.value.is_empty()).then(|| self.value.clone())),
        }
    }

    pub fn insert(
        mut self,
        state: &mut TrieState,
        mut path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        match path.next_choice() {
            Some(choice) => {
                if self.choices[choice].is_valid() {
                    let child_node = state
                        .get_node(self.choices[choice])?
                        .ok_or_else(|| TrieError::MissingNode(self.choices[choice].finalize()))?;
                    let new_child = child_node.insert(state, path, value)?;
                    self.choices[choice] = new_child.insert_self(state)?;
                } else {
                    self.choices[choice] = LeafNode::new(path, value).insert_self(state)?;
                }
            }
            None => {
                // path ends here
                self.value = value;
            }
        }
        Ok(self.into())
    }

    pub fn remove(
        mut self,
        state: &mut TrieState,
        mut path: Nibbles,
    ) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        let value = match path.next_choice() {
            Some(choice) if self.choices[choice].is_valid() => {
                let child_node = state
                    .get_node(self.choices[choice])?
                    .ok_or_else(|| TrieError::MissingNode(self.choices[choice].finalize()))?;
                let (child_node, old_value) = child_node.remove(state, path)?;
                self.choices[choice] = match child_node {
                    Some(node) => node.insert_self(state)?,
                    None => NodeHash::EMPTY,
                };
                old_value
            }
            Some(_) => None,
            None => (!self.value.is_empty()).then(|| std::mem::take(&mut self.value)),
        };

        let children: Vec<(usize, NodeHash)> = self
            .choices
            .iter()
            .enumerate()
            .filter(|(_, child)| child.is_valid())
            .map(|(choice, child)| (choice, *child))
            .collect();

        // A branch must keep at least two references (children or value),
        // restructure otherwise.
        let new_node = match (children.len(), self.value.is_empty()) {
            (0, true) => None,
            (0, false) => Some(
                LeafNode::new(Nibbles::from_hex(vec![16]), std::mem::take(&mut self.value)).into(),
            ),
            (1, true) => {
                let (choice, child_hash) = children[0];
                let child = state
                    .get_node(child_hash)?
                    .ok_or_else(|| TrieError::MissingNode(child_hash.finalize()))?;
                let node = match child {
                    // an extension absorbs the branch nibble, a branch gets
                    // a new extension above it
                    Node::Branch(_) => {
                        ExtensionNode::new(Nibbles::from_hex(vec![choice as u8]), child_hash).into()
                    }
                    Node::Extension(mut extension_node) => {
                        extension_node.prefix.prepend(choice as u8);
                        extension_node.into()
                    }
                    Node::Leaf(mut leaf_node) => {
                        leaf_node.partial.prepend(choice as u8);
                        leaf_node.into()
                    }
                };
                Some(node)
            }
            _ => Some(self.into()),
        };
        Ok((new_node, value))
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
        if let Some(choice) = path.next_choice() {
            if self.choices[choice].is_valid() {
                let child_node = state
                    .get_node(self.choices[choice])?
                    .ok_or_else(|| TrieError::MissingNode(self.choices[choice].finalize()))?;
                child_node.get_path(state, path, node_path)?;
            }
        }
        Ok(())
    }
}
