use std::sync::Arc;

use crate::checkpoint::CheckpointDB;
use crate::db::TrieDB;
use crate::error::TrieError;
use crate::node::Node;
use crate::node_hash::NodeHash;

/// Read/write access to a trie's nodes through its checkpointed store.
/// Nodes are written through as soon as they are created, so the current
/// root is always resolvable from the store.
pub struct TrieState {
    store: Arc<CheckpointDB>,
}

impl TrieState {
    pub fn new(db: Arc<dyn TrieDB>) -> TrieState {
        TrieState {
            store: Arc::new(CheckpointDB::new(db)),
        }
    }

    /// Builds a state over an existing store, sharing its diff layers.
    pub fn from_store(store: Arc<CheckpointDB>) -> TrieState {
        TrieState { store }
    }

    pub fn store(&self) -> &Arc<CheckpointDB> {
        &self.store
    }

    /// Retrieves and decodes the node with the given hash.
    pub fn get_node(&self, hash: NodeHash) -> Result<Option<Node>, TrieError> {
        // Inline nodes are embedded in their parent's encoding and
        // don't have their own store entry.
        if let NodeHash::Inline(_) = hash {
            return Ok(Some(Node::decode_raw(hash.as_ref())?));
        }
        self.store
            .get(hash)?
            .map(|rlp| Node::decode_raw(&rlp).map_err(TrieError::RLPDecode))
            .transpose()
    }

    /// Stores an already-encoded node under its hash.
    pub fn write_node(&mut self, hash: NodeHash, encoded: Vec<u8>) -> Result<(), TrieError> {
        if matches!(hash, NodeHash::Hashed(_)) {
            self.store.put(hash, encoded)?;
        }
        Ok(())
    }
}
