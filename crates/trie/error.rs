use ethereum_types::H256;
use statum_rlp::error::RLPDecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrieError {
    #[error(transparent)]
    RLPDecode(#[from] RLPDecodeError),
    #[error("Missing trie node {0:#x}")]
    MissingNode(H256),
    #[error("Invalid proof")]
    InvalidProof,
    #[error("No checkpoint to commit or revert")]
    NoCheckpoint,
    #[error("Lock Error: Panicked when trying to acquire a lock")]
    LockError,
    #[error("Database error: {0}")]
    DbError(anyhow::Error),
}
