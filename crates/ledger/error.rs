use ethereum_types::H256;
use statum_rlp::error::RLPDecodeError;
use statum_trie::TrieError;
use thiserror::Error;

use crate::genesis::GenesisError;

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Trie(#[from] TrieError),
    #[error(transparent)]
    RLPDecode(#[from] RLPDecodeError),
    #[error("Operation requires a fully committed state but there are open checkpoints")]
    UncommittedCheckpoints,
    #[error("State root {0:#x} is not present in the backing store")]
    InvalidStateRoot(H256),
    #[error(transparent)]
    Genesis(#[from] GenesisError),
}
