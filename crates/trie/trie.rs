mod checkpoint;
pub mod db;
pub mod error;
mod nibbles;
mod node;
mod node_hash;
mod rlp;
mod state;
mod trie_iter;
mod verify;

use std::sync::Arc;

use ethereum_types::H256;
use lazy_static::lazy_static;
use sha3::{Digest, Keccak256};
use statum_rlp::constants::RLP_NULL;

pub use self::checkpoint::CheckpointDB;
pub use self::db::{InMemoryTrieDB, TrieDB};
pub use self::error::TrieError;
pub use self::nibbles::Nibbles;
pub use self::node::{BranchNode, ExtensionNode, LeafNode, Node};
pub use self::node_hash::NodeHash;
pub use self::state::TrieState;
pub use self::trie_iter::TrieIterator;
pub use self::verify::verify_proof;

lazy_static! {
    // Hash of an empty trie, aka keccak(RLP_NULL)
    pub static ref EMPTY_TRIE_HASH: H256 = H256::from_slice(
        Keccak256::new()
            .chain_update([RLP_NULL])
            .finalize()
            .as_slice(),
    );
}

/// RLP-encoded trie path
pub type PathRLP = Vec<u8>;
/// RLP-encoded trie value
pub type ValueRLP = Vec<u8>;
/// RLP-encoded trie node
pub type NodeRLP = Vec<u8>;

/// Merkle-Patricia trie over a checkpointed node store.
///
/// Every mutation writes the affected nodes through to the store, so the
/// current root is resolvable at any time without an explicit commit step.
pub struct Trie {
    /// Reference to the current root node, None for an empty trie
    root: Option<NodeHash>,
    state: TrieState,
    /// Root saved at each open checkpoint, oldest first. Kept in lockstep
    /// with the store's diff layers.
    checkpoints: Vec<Option<NodeHash>>,
}

impl Trie {
    /// Creates a new empty trie over the given store.
    pub fn new(db: Arc<dyn TrieDB>) -> Self {
        Self {
            root: None,
            state: TrieState::new(db),
            checkpoints: Vec::new(),
        }
    }

    /// Opens a trie at the given root. The root's node is not checked to be
    /// present until it is first accessed.
    pub fn open(db: Arc<dyn TrieDB>, root: H256) -> Self {
        let root = (root != *EMPTY_TRIE_HASH).then(|| root.into());
        Self {
            root,
            state: TrieState::new(db),
            checkpoints: Vec::new(),
        }
    }

    /// Opens a trie at the given root, sharing an existing checkpointed
    /// store (and its open diff layers) with other tries.
    pub fn from_store(store: Arc<CheckpointDB>, root: H256) -> Self {
        let root = (root != *EMPTY_TRIE_HASH).then(|| root.into());
        Self {
            root,
            state: TrieState::from_store(store),
            checkpoints: Vec::new(),
        }
    }

    pub fn store(&self) -> Arc<CheckpointDB> {
        self.state.store().clone()
    }

    /// Retrieve a value from the trie given its path.
    pub fn get(&self, path: &PathRLP) -> Result<Option<ValueRLP>, TrieError> {
        match &self.root {
            Some(root) => {
                let root_node = self
                    .state
                    .get_node(*root)?
                    .ok_or_else(|| TrieError::MissingNode(root.finalize()))?;
                root_node.get(&self.state, Nibbles::from_bytes(path))
            }
            None => Ok(None),
        }
    }

    /// Insert a value into the trie. Storing an empty value removes the
    /// path from the trie.
    pub fn insert(&mut self, path: PathRLP, value: ValueRLP) -> Result<(), TrieError> {
        if value.is_empty() {
            self.remove(path)?;
            return Ok(());
        }
        match self.root.take() {
            Some(root) => {
                let root_node = self
                    .state
                    .get_node(root)?
                    .ok_or_else(|| TrieError::MissingNode(root.finalize()))?;
                let root_node =
                    root_node.insert(&mut self.state, Nibbles::from_bytes(&path), value)?;
                self.root = Some(root_node.insert_self(&mut self.state)?);
            }
            None => {
                let new_leaf = Node::from(LeafNode::new(Nibbles::from_bytes(&path), value));
                self.root = Some(new_leaf.insert_self(&mut self.state)?);
            }
        }
        Ok(())
    }

    /// Remove a value from the trie given its path.
    /// Returns the removed value if it existed.
    pub fn remove(&mut self, path: PathRLP) -> Result<Option<ValueRLP>, TrieError> {
        let Some(root) = self.root.take() else {
            return Ok(None);
        };
        let root_node = self
            .state
            .get_node(root)?
            .ok_or_else(|| TrieError::MissingNode(root.finalize()))?;
        let (root_node, old_value) =
            root_node.remove(&mut self.state, Nibbles::from_bytes(&path))?;
        self.root = root_node
            .map(|root| root.insert_self(&mut self.state))
            .transpose()?;
        Ok(old_value)
    }

    /// Root digest of the trie.
    pub fn hash(&self) -> H256 {
        self.root
            .as_ref()
            .map(|root| root.finalize())
            .unwrap_or(*EMPTY_TRIE_HASH)
    }

    /// Moves the trie to a different root. Fails with `MissingNode` if the
    /// root is not present in the store.
    pub fn set_root(&mut self, root: H256) -> Result<(), TrieError> {
        if root == *EMPTY_TRIE_HASH {
            self.root = None;
            return Ok(());
        }
        let hash = NodeHash::from(root);
        if self.state.store().get(hash)?.is_none() {
            return Err(TrieError::MissingNode(root));
        }
        self.root = Some(hash);
        Ok(())
    }

    /// Opens a checkpoint scope: the current root is saved and node writes
    /// start going to a fresh diff layer.
    pub fn checkpoint(&mut self) -> Result<(), TrieError> {
        self.state.store().checkpoint()?;
        self.checkpoints.push(self.root);
        Ok(())
    }

    /// Closes the newest checkpoint scope, keeping all writes made since.
    pub fn commit(&mut self) -> Result<(), TrieError> {
        if self.checkpoints.pop().is_none() {
            return Err(TrieError::NoCheckpoint);
        }
        self.state.store().commit()
    }

    /// Closes the newest checkpoint scope, undoing all writes made since
    /// and restoring the saved root.
    pub fn revert(&mut self) -> Result<(), TrieError> {
        let Some(saved_root) = self.checkpoints.pop() else {
            return Err(TrieError::NoCheckpoint);
        };
        self.state.store().revert()?;
        self.root = saved_root;
        Ok(())
    }

    /// Number of open checkpoint scopes.
    pub fn checkpoint_depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// Root as of the oldest open checkpoint, whose nodes are guaranteed to
    /// have reached the inner store. With no open checkpoints this is the
    /// current root.
    pub fn committed_root(&self) -> H256 {
        match self.checkpoints.first() {
            Some(saved_root) => saved_root
                .as_ref()
                .map(|root| root.finalize())
                .unwrap_or(*EMPTY_TRIE_HASH),
            None => self.hash(),
        }
    }

    /// Obtain a merkle proof for the given path.
    /// The proof will contain the encoded nodes traversed until reaching
    /// the node where the path is stored (or until a divergence, if the
    /// path is not stored in the trie).
    pub fn get_proof(&self, path: &PathRLP) -> Result<Vec<NodeRLP>, TrieError> {
        let Some(root) = &self.root else {
            return Ok(Vec::new());
        };
        let root_node = self
            .state
            .get_node(*root)?
            .ok_or_else(|| TrieError::MissingNode(root.finalize()))?;
        let mut node_path = Vec::new();
        // the ≥32-byte filter below never catches an inlined root
        if let NodeHash::Inline(_) = root {
            node_path.push(root_node.encode_raw());
        }
        root_node.get_path(&self.state, Nibbles::from_bytes(path), &mut node_path)?;
        Ok(node_path)
    }

    /// Builds a trie from a set of encoded nodes, for walking proofs.
    /// Every node is stored under its digest, regardless of its size.
    pub fn from_nodes(root: H256, nodes: &[NodeRLP]) -> Result<Self, TrieError> {
        let mut trie = Trie::new(Arc::new(InMemoryTrieDB::new_empty()));
        for node_rlp in nodes {
            Node::decode_raw(node_rlp)?;
            let hash = H256::from_slice(Keccak256::digest(node_rlp).as_slice());
            trie.state.write_node(hash.into(), node_rlp.clone())?;
        }
        if root != *EMPTY_TRIE_HASH {
            trie.root = Some(root.into());
        }
        Ok(trie)
    }

    /// Creates a new trie over a fresh in-memory store. Used for testing.
    #[cfg(test)]
    pub fn new_temp() -> Self {
        Trie::new(Arc::new(InMemoryTrieDB::new_empty()))
    }
}

impl IntoIterator for Trie {
    type Item = (Nibbles, Node);
    type IntoIter = TrieIterator;

    fn into_iter(self) -> Self::IntoIter {
        TrieIterator::new(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::collections::BTreeMap;

    use hex_literal::hex;
    use proptest::collection::{btree_set, vec};
    use proptest::prelude::*;

    #[test]
    fn compute_hash() {
        let mut trie = Trie::new_temp();
        trie.insert(b"first".to_vec(), b"value".to_vec()).unwrap();
        trie.insert(b"second".to_vec(), b"value".to_vec()).unwrap();

        assert_eq!(
            trie.hash().as_ref(),
            hex!("f7537e7f4b313c426440b7fface6bff76f51b3eb0d127356efbe6f2b3c891501")
        );
    }

    #[test]
    fn compute_hash_long() {
        let mut trie = Trie::new_temp();
        trie.insert(b"first".to_vec(), b"value".to_vec()).unwrap();
        trie.insert(b"second".to_vec(), b"value".to_vec()).unwrap();
        trie.insert(b"third".to_vec(), b"value".to_vec()).unwrap();
        trie.insert(b"fourth".to_vec(), b"value".to_vec()).unwrap();

        assert_eq!(
            trie.hash().0.to_vec(),
            hex!("e2ff76eca34a96b68e6871c74f2a5d9db58e59f82073276866fdd25e560cedea")
        );
    }

    #[test]
    fn compute_hash_of_empty_trie() {
        let trie = Trie::new_temp();
        assert_eq!(
            trie.hash().0.as_slice(),
            hex!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421").as_slice(),
        );
    }

    #[test]
    fn compute_hash_mixed_prefixes() {
        let mut trie = Trie::new_temp();
        trie.insert(b"do".to_vec(), b"verb".to_vec()).unwrap();
        trie.insert(b"horse".to_vec(), b"stallion".to_vec())
            .unwrap();
        trie.insert(b"doge".to_vec(), b"coin".to_vec()).unwrap();
        trie.insert(b"dog".to_vec(), b"puppy".to_vec()).unwrap();

        assert_eq!(
            trie.hash().0.as_slice(),
            hex!("5991bb8c6514148a29db676a14ac506cd2cd5775ace63c30a4fe457715e9ac84").as_slice()
        );
    }

    #[test]
    fn compute_hash_32_byte_keys() {
        let mut trie = Trie::new_temp();
        let data = [
            (
                hex!("0000000000000000000000000000000000000000000000000000000000000045").to_vec(),
                hex!("22b224a1420a802ab51d326e29fa98e34c4f24ea").to_vec(),
            ),
            (
                hex!("0000000000000000000000000000000000000000000000000000000000000046").to_vec(),
                hex!("67706c2076330000000000000000000000000000000000000000000000000000").to_vec(),
            ),
            (
                hex!("000000000000000000000000697c7b8c961b56f675d570498424ac8de1a918f6").to_vec(),
                hex!("1234567890").to_vec(),
            ),
            (
                hex!("0000000000000000000000007ef9e639e2733cb34e4dfc576d4b23f72db776b2").to_vec(),
                hex!("4655474156000000000000000000000000000000000000000000000000000000").to_vec(),
            ),
            (
                hex!("000000000000000000000000ec4f34c97e43fbb2816cfd95e388353c7181dab1").to_vec(),
                hex!("4e616d6552656700000000000000000000000000000000000000000000000000").to_vec(),
            ),
            (
                hex!("4655474156000000000000000000000000000000000000000000000000000000").to_vec(),
                hex!("7ef9e639e2733cb34e4dfc576d4b23f72db776b2").to_vec(),
            ),
            (
                hex!("4e616d6552656700000000000000000000000000000000000000000000000000").to_vec(),
                hex!("ec4f34c97e43fbb2816cfd95e388353c7181dab1").to_vec(),
            ),
            (
                hex!("000000000000000000000000697c7b8c961b56f675d570498424ac8de1a918f6").to_vec(),
                hex!("6f6f6f6820736f2067726561742c207265616c6c6c793f000000000000000000").to_vec(),
            ),
            (
                hex!("6f6f6f6820736f2067726561742c207265616c6c6c793f000000000000000000").to_vec(),
                hex!("697c7b8c961b56f675d570498424ac8de1a918f6").to_vec(),
            ),
        ];

        for (path, value) in data {
            trie.insert(path, value).unwrap();
        }

        assert_eq!(
            trie.hash().0.as_slice(),
            hex!("9f6221ebb8efe7cff60a716ecb886e67dd042014be444669f0159d8e68b42100").as_slice(),
        );
    }

    #[test]
    fn compute_hash_long_values() {
        let mut trie = Trie::new_temp();

        let data = [
            (
                b"key1aa".to_vec(),
                b"0123456789012345678901234567890123456789xxx".to_vec(),
            ),
            (
                b"key1".to_vec(),
                b"0123456789012345678901234567890123456789Very_Long".to_vec(),
            ),
            (b"key2bb".to_vec(), b"aval3".to_vec()),
            (b"key2".to_vec(), b"short".to_vec()),
            (b"key3cc".to_vec(), b"aval3".to_vec()),
            (b"key3".to_vec(), b"1234567890123456789012345678901".to_vec()),
        ];

        for (path, value) in data {
            trie.insert(path, value).unwrap();
        }

        assert_eq!(
            trie.hash().0.as_slice(),
            hex!("cb65032e2f76c48b82b5c24b3db8f670ce73982869d38cd39a624f23d62a9e89").as_slice(),
        );
    }

    #[test]
    fn compute_hash_overwrite() {
        let mut trie = Trie::new_temp();
        trie.insert(b"abc".to_vec(), b"123".to_vec()).unwrap();
        trie.insert(b"abcd".to_vec(), b"abcd".to_vec()).unwrap();
        trie.insert(b"abc".to_vec(), b"abc".to_vec()).unwrap();

        assert_eq!(
            trie.hash().0.as_slice(),
            hex!("7a320748f780ad9ad5b0837302075ce0eeba6c26e3d8562c67ccc0f1b273298a").as_slice(),
        );
    }

    #[test]
    fn get_insert_words() {
        let mut trie = Trie::new_temp();
        let first_path = b"first".to_vec();
        let first_value = b"value_a".to_vec();
        let second_path = b"second".to_vec();
        let second_value = b"value_b".to_vec();
        // Check that the values dont exist before inserting
        assert!(trie.get(&first_path).unwrap().is_none());
        assert!(trie.get(&second_path).unwrap().is_none());
        // Insert values
        trie.insert(first_path.clone(), first_value.clone())
            .unwrap();
        trie.insert(second_path.clone(), second_value.clone())
            .unwrap();
        // Check values
        assert_eq!(trie.get(&first_path).unwrap(), Some(first_value));
        assert_eq!(trie.get(&second_path).unwrap(), Some(second_value));
    }

    #[test]
    fn get_insert_zero() {
        let mut trie = Trie::new_temp();
        trie.insert(vec![0x0], b"value".to_vec()).unwrap();
        let first = trie.get(&vec![0x0]).unwrap();
        assert_eq!(first, Some(b"value".to_vec()));
    }

    #[test]
    fn get_insert_nested_prefixes() {
        let mut trie = Trie::new_temp();
        trie.insert(vec![16], vec![0]).unwrap();
        trie.insert(vec![16, 32], vec![1]).unwrap();
        trie.insert(vec![16, 32, 48], vec![2]).unwrap();

        assert_eq!(trie.get(&vec![16]).unwrap(), Some(vec![0]));
        assert_eq!(trie.get(&vec![16, 32]).unwrap(), Some(vec![1]));
        assert_eq!(trie.get(&vec![16, 32, 48]).unwrap(), Some(vec![2]));
        assert_eq!(trie.get(&vec![16, 32, 49]).unwrap(), None);
    }

    #[test]
    fn get_insert_sparse_keys() {
        let mut trie = Trie::new_temp();
        trie.insert(vec![0x00], vec![0x00]).unwrap();
        trie.insert(vec![0xff], vec![0xff]).unwrap();
        trie.insert(vec![0x0f, 0xf0], vec![0x0f]).unwrap();

        assert_eq!(trie.get(&vec![0x00]).unwrap(), Some(vec![0x00]));
        assert_eq!(trie.get(&vec![0xff]).unwrap(), Some(vec![0xff]));
        assert_eq!(trie.get(&vec![0x0f, 0xf0]).unwrap(), Some(vec![0x0f]));
        assert_eq!(trie.get(&vec![0xf0]).unwrap(), None);
    }

    #[test]
    fn insert_empty_value_removes_key() {
        let mut trie = Trie::new_temp();
        trie.insert(b"abc".to_vec(), b"123".to_vec()).unwrap();
        trie.insert(b"abcd".to_vec(), b"abcd".to_vec()).unwrap();
        trie.insert(b"abc".to_vec(), vec![]).unwrap();

        assert_eq!(trie.get(&b"abc".to_vec()).unwrap(), None);
        assert_eq!(trie.get(&b"abcd".to_vec()).unwrap(), Some(b"abcd".to_vec()));

        // equivalent to a trie that never stored "abc"
        let mut other = Trie::new_temp();
        other.insert(b"abcd".to_vec(), b"abcd".to_vec()).unwrap();
        assert_eq!(trie.hash(), other.hash());
    }

    #[test]
    fn get_insert_remove() {
        let mut trie = Trie::new_temp();
        trie.insert(b"horse".to_vec(), b"stallion".to_vec())
            .unwrap();
        trie.insert(b"doge".to_vec(), b"coin".to_vec()).unwrap();
        trie.insert(b"do".to_vec(), b"verb".to_vec()).unwrap();

        assert_eq!(trie.remove(b"horse".to_vec()).unwrap(), Some(b"stallion".to_vec()));
        assert_eq!(trie.get(&b"horse".to_vec()).unwrap(), None);
        assert_eq!(trie.get(&b"doge".to_vec()).unwrap(), Some(b"coin".to_vec()));
        assert_eq!(trie.get(&b"do".to_vec()).unwrap(), Some(b"verb".to_vec()));

        // removing a missing path is a no-op
        assert_eq!(trie.remove(b"horse".to_vec()).unwrap(), None);
    }

    #[test]
    fn remove_restores_previous_hash() {
        let mut trie = Trie::new_temp();
        trie.insert(b"do".to_vec(), b"verb".to_vec()).unwrap();
        trie.insert(b"horse".to_vec(), b"stallion".to_vec())
            .unwrap();
        let hash_before = trie.hash();

        trie.insert(b"doge".to_vec(), b"coin".to_vec()).unwrap();
        trie.remove(b"doge".to_vec()).unwrap();

        assert_eq!(trie.hash(), hash_before);
    }

    #[test]
    fn remove_last_value_empties_trie() {
        let mut trie = Trie::new_temp();
        trie.insert(b"abc".to_vec(), b"123".to_vec()).unwrap();
        trie.remove(b"abc".to_vec()).unwrap();
        assert_eq!(trie.hash(), *EMPTY_TRIE_HASH);
    }

    #[test]
    fn open_at_previous_root() {
        let db = Arc::new(InMemoryTrieDB::new_empty());
        let mut trie = Trie::new(db.clone());
        trie.insert(b"do".to_vec(), b"verb".to_vec()).unwrap();
        let root_one = trie.hash();
        trie.insert(b"dog".to_vec(), b"puppy".to_vec()).unwrap();
        let root_two = trie.hash();

        // all nodes are write-through, both versions remain readable
        let old = Trie::open(db.clone(), root_one);
        assert_eq!(old.get(&b"do".to_vec()).unwrap(), Some(b"verb".to_vec()));
        assert_eq!(old.get(&b"dog".to_vec()).unwrap(), None);

        let new = Trie::open(db, root_two);
        assert_eq!(new.get(&b"dog".to_vec()).unwrap(), Some(b"puppy".to_vec()));
    }

    #[test]
    fn set_root_missing_node_fails() {
        let mut trie = Trie::new_temp();
        trie.insert(b"do".to_vec(), b"verb".to_vec()).unwrap();
        let err = trie.set_root(H256([0xfe; 32]));
        assert!(matches!(err, Err(TrieError::MissingNode(_))));
        // the old root is untouched
        assert_eq!(trie.get(&b"do".to_vec()).unwrap(), Some(b"verb".to_vec()));
    }

    #[test]
    fn set_root_to_empty_trie() {
        let mut trie = Trie::new_temp();
        trie.insert(b"do".to_vec(), b"verb".to_vec()).unwrap();
        trie.set_root(*EMPTY_TRIE_HASH).unwrap();
        assert_eq!(trie.hash(), *EMPTY_TRIE_HASH);
        assert_eq!(trie.get(&b"do".to_vec()).unwrap(), None);
    }

    #[test]
    fn checkpoint_revert_restores_root() {
        let mut trie = Trie::new_temp();
        trie.insert(b"do".to_vec(), b"verb".to_vec()).unwrap();
        let saved_hash = trie.hash();

        trie.checkpoint().unwrap();
        trie.insert(b"doge".to_vec(), b"coin".to_vec()).unwrap();
        trie.remove(b"do".to_vec()).unwrap();
        assert_ne!(trie.hash(), saved_hash);

        trie.revert().unwrap();
        assert_eq!(trie.hash(), saved_hash);
        assert_eq!(trie.get(&b"do".to_vec()).unwrap(), Some(b"verb".to_vec()));
        assert_eq!(trie.get(&b"doge".to_vec()).unwrap(), None);
    }

    #[test]
    fn checkpoint_commit_keeps_writes() {
        let mut trie = Trie::new_temp();
        trie.checkpoint().unwrap();
        trie.insert(b"do".to_vec(), b"verb".to_vec()).unwrap();
        trie.commit().unwrap();

        assert_eq!(trie.checkpoint_depth(), 0);
        assert_eq!(trie.get(&b"do".to_vec()).unwrap(), Some(b"verb".to_vec()));
    }

    #[test]
    fn nested_checkpoints() {
        let mut trie = Trie::new_temp();
        trie.insert(b"a".to_vec(), vec![1]).unwrap();

        trie.checkpoint().unwrap();
        trie.insert(b"b".to_vec(), vec![2]).unwrap();

        trie.checkpoint().unwrap();
        trie.insert(b"c".to_vec(), vec![3]).unwrap();

        // inner commit folds into the outer scope
        trie.commit().unwrap();
        assert_eq!(trie.checkpoint_depth(), 1);
        assert_eq!(trie.get(&b"c".to_vec()).unwrap(), Some(vec![3]));

        // outer revert then drops both layers
        trie.revert().unwrap();
        assert_eq!(trie.get(&b"a".to_vec()).unwrap(), Some(vec![1]));
        assert_eq!(trie.get(&b"b".to_vec()).unwrap(), None);
        assert_eq!(trie.get(&b"c".to_vec()).unwrap(), None);
    }

    #[test]
    fn commit_without_checkpoint_fails() {
        let mut trie = Trie::new_temp();
        assert!(matches!(trie.commit(), Err(TrieError::NoCheckpoint)));
        assert!(matches!(trie.revert(), Err(TrieError::NoCheckpoint)));
    }

    #[test]
    fn committed_root_tracks_oldest_checkpoint() {
        let mut trie = Trie::new_temp();
        trie.insert(b"a".to_vec(), vec![1]).unwrap();
        let committed = trie.hash();

        trie.checkpoint().unwrap();
        trie.insert(b"b".to_vec(), vec![2]).unwrap();
        trie.checkpoint().unwrap();
        trie.insert(b"c".to_vec(), vec![3]).unwrap();

        assert_eq!(trie.committed_root(), committed);
        trie.commit().unwrap();
        assert_eq!(trie.committed_root(), committed);
        trie.commit().unwrap();
        assert_eq!(trie.committed_root(), trie.hash());
    }

    proptest! {
        #[test]
        fn proptest_get_insert(data in btree_set(vec(any::<u8>(), 1..100), 1..100)) {
            let mut trie = Trie::new_temp();

            for val in data.iter() {
                trie.insert(val.clone(), val.clone()).unwrap();
            }

            for val in data.iter() {
                let item = trie.get(val).unwrap();
                prop_assert!(item.is_some());
                prop_assert_eq!(&item.unwrap(), val);
            }
        }

        #[test]
        fn proptest_get_insert_with_removals(mut data in vec((vec(any::<u8>(), 5..100), any::<bool>()), 1..100)) {
            let mut trie = Trie::new_temp();
            // remove duplicate values with different expected status
            data.sort_by_key(|(val, _)| val.clone());
            data.dedup_by_key(|(val, _)| val.clone());
            // insert all values
            for (val, _) in data.iter() {
                trie.insert(val.clone(), val.clone()).unwrap();
            }
            // remove the values that were marked for removal
            for (val, should_remove) in data.iter() {
                if *should_remove {
                    let removed = trie.remove(val.clone()).unwrap();
                    prop_assert_eq!(removed, Some(val.clone()));
                }
            }
            // check trie only contains the values that were not removed
            for (val, removed) in data.iter() {
                let item = trie.get(val).unwrap();
                if !removed {
                    prop_assert_eq!(item, Some(val.clone()));
                } else {
                    prop_assert_eq!(item, None);
                }
            }
        }

        #[test]
        fn proptest_hash_independent_of_insertion_order(data in btree_set(vec(any::<u8>(), 1..64), 1..100)) {
            let mut forward = Trie::new_temp();
            for val in data.iter() {
                forward.insert(val.clone(), val.clone()).unwrap();
            }
            let mut backward = Trie::new_temp();
            for val in data.iter().rev() {
                backward.insert(val.clone(), val.clone()).unwrap();
            }
            prop_assert_eq!(forward.hash(), backward.hash());
        }

        #[test]
        fn proptest_removal_returns_to_previous_hash(data in btree_set(vec(any::<u8>(), 1..64), 2..50)) {
            let mut data: Vec<_> = data.into_iter().collect();
            let extra = data.pop().unwrap();

            let mut trie = Trie::new_temp();
            for val in data.iter() {
                trie.insert(val.clone(), val.clone()).unwrap();
            }
            let hash_before = trie.hash();
            trie.insert(extra.clone(), extra.clone()).unwrap();
            trie.remove(extra).unwrap();
            prop_assert_eq!(trie.hash(), hash_before);
        }

        #[test]
        fn proptest_compare_with_model(data in btree_set(vec(any::<u8>(), 1..32), 1..100)) {
            // tries built from the same entries must agree with a plain map
            let mut trie = Trie::new_temp();
            let mut model = BTreeMap::new();
            for val in data.iter() {
                trie.insert(val.clone(), val.clone()).unwrap();
                model.insert(val.clone(), val.clone());
            }
            let content: BTreeMap<_, _> = trie.into_iter().content().collect();
            prop_assert_eq!(content, model);
        }

        #[test]
        fn proptest_proof_verifies(data in btree_set(vec(any::<u8>(), 1..32), 1..100)) {
            let mut trie = Trie::new_temp();
            for val in data.iter() {
                trie.insert(val.clone(), val.clone()).unwrap();
            }
            let root = trie.hash();
            for val in data.iter() {
                let proof = trie.get_proof(val).unwrap();
                let verified = verify_proof(root, val, &proof).unwrap();
                prop_assert_eq!(verified, Some(val.clone()));
            }
        }
    }
}
