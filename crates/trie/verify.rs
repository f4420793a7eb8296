use crate::error::TrieError;
use crate::{NodeRLP, PathRLP, Trie, ValueRLP, EMPTY_TRIE_HASH};
use ethereum_types::H256;

/// Verifies a merkle proof against the given root digest.
///
/// Returns the proven value, or `None` when the proof shows the path is
/// absent from the trie. Proofs that don't connect to the root, reference
/// missing nodes or contain malformed encodings are rejected.
pub fn verify_proof(
    root: H256,
    path: &PathRLP,
    proof: &[NodeRLP],
) -> Result<Option<ValueRLP>, TrieError> {
    if proof.is_empty() {
        if root == *EMPTY_TRIE_HASH {
            return Ok(None);
        }
        return Err(TrieError::InvalidProof);
    }
    let trie = Trie::from_nodes(root, proof).map_err(|_| TrieError::InvalidProof)?;
    match trie.get(path) {
        Ok(value) => Ok(value),
        Err(TrieError::MissingNode(_)) => Err(TrieError::InvalidProof),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Trie;

    fn sample_trie() -> Trie {
        let mut trie = Trie::new_temp();
        trie.insert(b"do".to_vec(), b"verb".to_vec()).unwrap();
        trie.insert(b"horse".to_vec(), b"stallion".to_vec())
            .unwrap();
        trie.insert(b"doge".to_vec(), b"coin".to_vec()).unwrap();
        trie.insert(b"dog".to_vec(), b"puppy".to_vec()).unwrap();
        trie
    }

    #[test]
    fn inclusion_proof_verifies() {
        let trie = sample_trie();
        let root = trie.hash();
        let proof = trie.get_proof(&b"doge".to_vec()).unwrap();
        let value = verify_proof(root, &b"doge".to_vec(), &proof).unwrap();
        assert_eq!(value, Some(b"coin".to_vec()));
    }

    #[test]
    fn absence_proof_returns_none() {
        let trie = sample_trie();
        let root = trie.hash();
        let proof = trie.get_proof(&b"dogecoin".to_vec()).unwrap();
        let value = verify_proof(root, &b"dogecoin".to_vec(), &proof).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn proof_against_wrong_root_fails() {
        let trie = sample_trie();
        let proof = trie.get_proof(&b"doge".to_vec()).unwrap();
        let bogus_root = H256([0xab; 32]);
        assert!(matches!(
            verify_proof(bogus_root, &b"doge".to_vec(), &proof),
            Err(TrieError::InvalidProof)
        ));
    }

    #[test]
    fn tampered_proof_fails() {
        let trie = sample_trie();
        let root = trie.hash();
        let mut proof = trie.get_proof(&b"doge".to_vec()).unwrap();
        // flip a byte somewhere in the deepest node
        if let Some(node) = proof.last_mut() {
            if let Some(byte) = node.last_mut() {
                *byte ^= 0xff;
            }
        }
        assert!(matches!(
            verify_proof(root, &b"doge".to_vec(), &proof),
            Err(TrieError::InvalidProof)
        ));
    }

    #[test]
    fn truncated_proof_fails() {
        let mut trie = Trie::new_temp();
        // force several hashed levels
        for i in 0u8..100 {
            trie.insert(vec![i; 10], vec![i; 40]).unwrap();
        }
        let root = trie.hash();
        let path = vec![42u8; 10];
        let mut proof = trie.get_proof(&path).unwrap();
        assert!(proof.len() > 1);
        proof.pop();
        assert!(matches!(
            verify_proof(root, &path, &proof),
            Err(TrieError::InvalidProof)
        ));
    }

    #[test]
    fn empty_proof_for_empty_trie() {
        let trie = Trie::new_temp();
        let value = verify_proof(trie.hash(), &b"missing".to_vec(), &[]).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn empty_proof_for_non_empty_root_fails() {
        let trie = sample_trie();
        assert!(matches!(
            verify_proof(trie.hash(), &b"do".to_vec(), &[]),
            Err(TrieError::InvalidProof)
        ));
    }
}
