use crate::db::TrieDB;
use crate::error::TrieError;
use crate::node_hash::NodeHash;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Layered write overlay over a node store.
///
/// Each open checkpoint keeps its writes in a diff layer above the inner
/// store. Reads scan the layers newest-first before falling through to the
/// inner store. Committing a checkpoint merges its layer into the one below
/// it, or flushes it to the inner store when it is the only one left;
/// reverting discards the layer. With no checkpoints open, writes go
/// straight to the inner store.
///
/// Trie nodes are content-addressed and never deleted, so layers only ever
/// add entries and no delete markers are needed.
pub struct CheckpointDB {
    inner: Arc<dyn TrieDB>,
    layers: Mutex<Vec<HashMap<NodeHash, Vec<u8>>>>,
}

impl CheckpointDB {
    pub fn new(inner: Arc<dyn TrieDB>) -> Self {
        Self {
            inner,
            layers: Mutex::new(Vec::new()),
        }
    }

    /// Opens a new diff layer. Writes after this point can be undone
    /// with [`revert`](Self::revert).
    pub fn checkpoint(&self) -> Result<(), TrieError> {
        let mut layers = self.layers.lock().map_err(|_| TrieError::LockError)?;
        layers.push(HashMap::new());
        trace!(depth = layers.len(), "node store checkpoint");
        Ok(())
    }

    /// Merges the newest diff layer into the one below it, or flushes it
    /// to the inner store when it is the last one.
    pub fn commit(&self) -> Result<(), TrieError> {
        let mut layers = self.layers.lock().map_err(|_| TrieError::LockError)?;
        let top = layers.pop().ok_or(TrieError::NoCheckpoint)?;
        trace!(depth = layers.len() + 1, nodes = top.len(), "node store commit");
        match layers.last_mut() {
            Some(below) => {
                below.extend(top);
                Ok(())
            }
            None => {
                drop(layers);
                self.inner.put_batch(top.into_iter().collect())
            }
        }
    }

    /// Discards the newest diff layer and every write made since the
    /// matching checkpoint.
    pub fn revert(&self) -> Result<(), TrieError> {
        let mut layers = self.layers.lock().map_err(|_| TrieError::LockError)?;
        let top = layers.pop().ok_or(TrieError::NoCheckpoint)?;
        trace!(depth = layers.len() + 1, nodes = top.len(), "node store revert");
        Ok(())
    }

    /// Number of open checkpoints.
    pub fn depth(&self) -> Result<usize, TrieError> {
        Ok(self.layers.lock().map_err(|_| TrieError::LockError)?.len())
    }
}

impl TrieDB for CheckpointDB {
    fn get(&self, key: NodeHash) -> Result<Option<Vec<u8>>, TrieError> {
        let layers = self.layers.lock().map_err(|_| TrieError::LockError)?;
        for layer in layers.iter().rev() {
            if let Some(value) = layer.get(&key) {
                return Ok(Some(value.clone()));
            }
        }
        drop(layers);
        self.inner.get(key)
    }

    fn put_batch(&self, key_values: Vec<(NodeHash, Vec<u8>)>) -> Result<(), TrieError> {
        let mut layers = self.layers.lock().map_err(|_| TrieError::LockError)?;
        match layers.last_mut() {
            Some(top) => {
                top.extend(key_values);
                Ok(())
            }
            None => {
                drop(layers);
                self.inner.put_batch(key_values)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::InMemoryTrieDB;
    use ethereum_types::H256;

    fn key(byte: u8) -> NodeHash {
        NodeHash::Hashed(H256([byte; 32]))
    }

    fn new_db() -> (Arc<InMemoryTrieDB>, CheckpointDB) {
        let inner = Arc::new(InMemoryTrieDB::new_empty());
        let db = CheckpointDB::new(inner.clone());
        (inner, db)
    }

    #[test]
    fn writes_without_checkpoint_hit_inner_store() {
        let (inner, db) = new_db();
        db.put(key(1), vec![1]).unwrap();
        assert_eq!(inner.get(key(1)).unwrap(), Some(vec![1]));
        assert_eq!(db.get(key(1)).unwrap(), Some(vec![1]));
    }

    #[test]
    fn checkpointed_writes_stay_out_of_inner_store_until_commit() {
        let (inner, db) = new_db();
        db.checkpoint().unwrap();
        db.put(key(1), vec![1]).unwrap();
        assert_eq!(inner.get(key(1)).unwrap(), None);
        assert_eq!(db.get(key(1)).unwrap(), Some(vec![1]));

        db.commit().unwrap();
        assert_eq!(inner.get(key(1)).unwrap(), Some(vec![1]));
        assert_eq!(db.depth().unwrap(), 0);
    }

    #[test]
    fn revert_discards_layer() {
        let (inner, db) = new_db();
        db.put(key(1), vec![1]).unwrap();
        db.checkpoint().unwrap();
        db.put(key(2), vec![2]).unwrap();
        db.revert().unwrap();

        assert_eq!(db.get(key(1)).unwrap(), Some(vec![1]));
        assert_eq!(db.get(key(2)).unwrap(), None);
        assert_eq!(inner.get(key(2)).unwrap(), None);
    }

    #[test]
    fn nested_commit_merges_into_layer_below() {
        let (inner, db) = new_db();
        db.checkpoint().unwrap();
        db.put(key(1), vec![1]).unwrap();
        db.checkpoint().unwrap();
        db.put(key(2), vec![2]).unwrap();

        db.commit().unwrap();
        // still one layer open, nothing flushed yet
        assert_eq!(db.depth().unwrap(), 1);
        assert_eq!(inner.get(key(1)).unwrap(), None);
        assert_eq!(db.get(key(2)).unwrap(), Some(vec![2]));

        db.revert().unwrap();
        assert_eq!(db.get(key(1)).unwrap(), None);
        assert_eq!(db.get(key(2)).unwrap(), None);
    }

    #[test]
    fn newest_layer_shadows_older_entries() {
        let (_, db) = new_db();
        db.put(key(1), vec![1]).unwrap();
        db.checkpoint().unwrap();
        db.put(key(1), vec![2]).unwrap();
        assert_eq!(db.get(key(1)).unwrap(), Some(vec![2]));
        db.revert().unwrap();
        assert_eq!(db.get(key(1)).unwrap(), Some(vec![1]));
    }

    #[test]
    fn commit_and_revert_without_checkpoint_fail() {
        let (_, db) = new_db();
        assert!(matches!(db.commit(), Err(TrieError::NoCheckpoint)));
        assert!(matches!(db.revert(), Err(TrieError::NoCheckpoint)));
    }
}
