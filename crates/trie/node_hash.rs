use ethereum_types::H256;
use sha3::{Digest, Keccak256};
use statum_rlp::{constants::RLP_NULL, encode::RLPEncode};

/// Reference to a trie node, as seen from its parent.
///
/// Nodes whose RLP encoding is at least 32 bytes long are referenced by their
/// keccak digest; shorter nodes are embedded verbatim in their parent and
/// never get their own entry in the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeHash {
    Hashed(H256),
    // The `len` field is kept out-of-band to make the variant hashable.
    Inline(([u8; 31], u8)),
}

impl NodeHash {
    pub const EMPTY: NodeHash = NodeHash::Inline(([0; 31], 0));

    /// Returns the hash of an encoded node, inlining it when it is short enough.
    pub fn from_encoded_raw(encoded: &[u8]) -> NodeHash {
        if encoded.len() >= 32 {
            let hash = Keccak256::new_with_prefix(encoded).finalize();
            NodeHash::Hashed(H256::from_slice(hash.as_slice()))
        } else {
            let mut buf = [0; 31];
            buf[..encoded.len()].copy_from_slice(encoded);
            NodeHash::Inline((buf, encoded.len() as u8))
        }
    }

    /// Builds a reference from raw bytes: a 32 byte slice is taken as a
    /// digest, anything shorter as an inlined node encoding.
    pub fn from_slice(slice: &[u8]) -> NodeHash {
        match slice.len() {
            32 => NodeHash::Hashed(H256::from_slice(slice)),
            len => {
                let mut buf = [0; 31];
                buf[..len].copy_from_slice(slice);
                NodeHash::Inline((buf, len as u8))
            }
        }
    }

    /// Digest of the referenced node. For inlined nodes this hashes the
    /// embedded encoding, so it is only meaningful for a root.
    pub fn finalize(&self) -> H256 {
        match self {
            NodeHash::Hashed(hash) => *hash,
            NodeHash::Inline(_) => H256::from_slice(
                Keccak256::new_with_prefix(self.as_ref())
                    .finalize()
                    .as_slice(),
            ),
        }
    }

    /// Whether the reference points to an actual node.
    pub const fn is_valid(&self) -> bool {
        !matches!(self, NodeHash::Inline((_, 0)))
    }
}

impl AsRef<[u8]> for NodeHash {
    fn as_ref(&self) -> &[u8] {
        match self {
            NodeHash::Hashed(hash) => hash.as_bytes(),
            NodeHash::Inline((encoded, len)) => &encoded[..*len as usize],
        }
    }
}

impl Default for NodeHash {
    fn default() -> Self {
        NodeHash::EMPTY
    }
}

impl From<H256> for NodeHash {
    fn from(hash: H256) -> Self {
        NodeHash::Hashed(hash)
    }
}

impl From<NodeHash> for Vec<u8> {
    fn from(hash: NodeHash) -> Self {
        hash.as_ref().to_vec()
    }
}

// Encoding used when the node is referenced from a parent node:
// hashed references become a 32 byte string, inlined nodes are spliced
// in as-is (they are already valid RLP).
impl RLPEncode for NodeHash {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        match self {
            NodeHash::Hashed(hash) => hash.0.encode(buf),
            NodeHash::Inline((_, 0)) => buf.put_u8(RLP_NULL),
            NodeHash::Inline((encoded, len)) => buf.put_slice(&encoded[..*len as usize]),
        }
    }

    fn length(&self) -> usize {
        match self {
            NodeHash::Hashed(_) => 33,
            NodeHash::Inline((_, 0)) => 1,
            NodeHash::Inline((_, len)) => *len as usize,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn short_encodings_are_inlined() {
        let encoded = [0xc2, 0x01, 0x02];
        let hash = NodeHash::from_encoded_raw(&encoded);
        assert!(matches!(hash, NodeHash::Inline(_)));
        assert_eq!(hash.as_ref(), &encoded);
    }

    #[test]
    fn long_encodings_are_hashed() {
        let encoded = [0xff; 32];
        let hash = NodeHash::from_encoded_raw(&encoded);
        assert_eq!(
            hash,
            NodeHash::Hashed(H256(hex!(
                "a9c584056064687e149968cbab758a3376d22aedc6a55823d1b3ecbee81b8fb9"
            )))
        );
    }

    #[test]
    fn empty_reference_is_invalid() {
        assert!(!NodeHash::EMPTY.is_valid());
        assert!(NodeHash::from_encoded_raw(&[0x80]).is_valid());
    }

    #[test]
    fn rlp_encoding_of_references() {
        let hashed = NodeHash::Hashed(H256([0xab; 32]));
        let mut buf = vec![];
        hashed.encode(&mut buf);
        assert_eq!(buf.len(), 33);
        assert_eq!(buf[0], 0xa0);
        assert_eq!(hashed.length(), 33);

        let inline = NodeHash::from_encoded_raw(&[0xc2, 0x01, 0x02]);
        let mut buf = vec![];
        inline.encode(&mut buf);
        assert_eq!(buf, vec![0xc2, 0x01, 0x02]);
        assert_eq!(inline.length(), 3);

        let mut buf = vec![];
        NodeHash::EMPTY.encode(&mut buf);
        assert_eq!(buf, vec![RLP_NULL]);
    }
}
