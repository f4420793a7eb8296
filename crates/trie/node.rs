mod branch;
mod extension;
mod leaf;

pub use branch::BranchNode;
pub use extension::ExtensionNode;
pub use leaf::LeafNode;

use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node_hash::NodeHash;
use crate::state::TrieState;
use crate::ValueRLP;
use statum_rlp::encode::RLPEncode;
use statum_rlp::error::RLPDecodeError;
use statum_rlp::structs::Decoder;

/// A trie node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Branch(Box<BranchNode>),
    Extension(ExtensionNode),
    Leaf(LeafNode),
}

impl From<BranchNode> for Node {
    fn from(val: BranchNode) -> Self {
        Node::Branch(Box::new(val))
    }
}

impl From<ExtensionNode> for Node {
    fn from(val: ExtensionNode) -> Self {
        Node::Extension(val)
    }
}

impl From<LeafNode> for Node {
    fn from(val: LeafNode) -> Self {
        Node::Leaf(val)
    }
}

impl Node {
    /// Retrieves a value from the subtrie originating from this node given its path
    pub fn get(&self, state: &TrieState, path: Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        match self {
            Node::Branch(n) => n.get(state, path),
            Node::Extension(n) => n.get(state, path),
            Node::Leaf(n) => n.get(path),
        }
    }

    /// Inserts a value into the subtrie originating from this node and
    /// returns the new root of the subtrie.
    pub fn insert(
        self,
        state: &mut TrieState,
        path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        match self {
            Node::Branch(n) => n.insert(state, path, value),
            Node::Extension(n) => n.insert(state, path, value),
            Node::Leaf(n) => n.insert(state, path, value),
        }
    }

    /// Removes a value from the subtrie originating from this node given its path.
    /// Returns the new root of the subtrie (if any) and the removed value (if any).
    pub fn remove(
        self,
        state: &mut TrieState,
        path: Nibbles,
    ) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        match self {
            Node::Branch(n) => n.remove(state, path),
            Node::Extension(n) => n.remove(state, path),
            Node::Leaf(n) => n.remove(path),
        }
    }

    /// Collects the encodings of all nodes in the path, as long as they are
    /// at least 32 bytes long. Shorter nodes travel inlined in their parent.
    pub fn get_path(
        &self,
        state: &TrieState,
        path: Nibbles,
        node_path: &mut Vec<Vec<u8>>,
    ) -> Result<(), TrieError> {
        match self {
            Node::Branch(n) => n.get_path(state, path, node_path),
            Node::Extension(n) => n.get_path(state, path, node_path),
            Node::Leaf(n) => n.get_path(node_path),
        }
    }

    pub fn encode_raw(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Decodes a node from its RLP encoding. Two-item lists are leaves or
    /// extensions depending on the flag carried by the compact-encoded path,
    /// seventeen-item lists are branches.
    pub fn decode_raw(rlp: &[u8]) -> Result<Self, RLPDecodeError> {
        let mut decoder = Decoder::new(rlp)?;
        let mut items = vec![];
        while !decoder.is_done() {
            let (item, rest) = decoder.get_encoded_item()?;
            items.push(item);
            decoder = rest;
        }
        match items.len() {
            2 => {
                let (path, _) = statum_rlp::decode::decode_bytes(&items[0])?;
                let path = Nibbles::decode_compact(path);
                if path.is_leaf() {
                    let (value, _) = statum_rlp::decode::decode_bytes(&items[1])?;
                    Ok(LeafNode::new(path, value.to_vec()).into())
                } else {
                    let child = decode_child(&items[1]);
                    Ok(ExtensionNode::new(path, child).into())
                }
            }
            17 => {
                let choices = items
                    .iter()
                    .take(16)
                    .map(|item| decode_child(item))
                    .collect::<Vec<_>>()
                    .try_into()
                    .map_err(|_| RLPDecodeError::InvalidArity(16))?;
                let (value, _) = statum_rlp::decode::decode_bytes(&items[16])?;
                Ok(BranchNode::new_with_value(Box::new(choices), value.to_vec()).into())
            }
            n => Err(RLPDecodeError::InvalidArity(n)),
        }
    }

    pub fn compute_hash(&self) -> NodeHash {
        NodeHash::from_encoded_raw(&self.encode_to_vec())
    }

    /// Encodes the node, writes it to the state and returns its hash.
    pub fn insert_self(self, state: &mut TrieState) -> Result<NodeHash, TrieError> {
        let encoded = self.encode_to_vec();
        let hash = NodeHash::from_encoded_raw(&encoded);
        state.write_node(hash, encoded)?;
        Ok(hash)
    }
}

/// Decodes a child reference: a 32 byte string is a hash, an empty string is
/// a missing child, anything else is an inlined node.
fn decode_child(rlp: &[u8]) -> NodeHash {
    match statum_rlp::decode::decode_bytes(rlp) {
        Ok((hash, &[])) if hash.len() == 32 => NodeHash::from_slice(hash),
        Ok((&[], &[])) => NodeHash::default(),
        _ => NodeHash::from_slice(rlp),
    }
}
