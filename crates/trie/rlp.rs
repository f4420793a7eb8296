//! RLP encoding for trie nodes. The encoding produced here is both the wire
//! format for proofs and the preimage of each node's hash, so it must match
//! the canonical hex-prefix layout exactly.

use crate::node::{BranchNode, ExtensionNode, LeafNode, Node};
use statum_rlp::encode::RLPEncode;
use statum_rlp::structs::Encoder;

impl RLPEncode for BranchNode {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        let mut encoder = Encoder::new(buf);
        for child in self.choices.iter() {
            encoder = encoder.encode_field(child);
        }
        encoder.encode_bytes(&self.value).finish();
    }
}

impl RLPEncode for ExtensionNode {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_bytes(&self.prefix.encode_compact())
            .encode_field(&self.child)
            .finish();
    }
}

impl RLPEncode for LeafNode {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_bytes(&self.partial.encode_compact())
            .encode_bytes(&self.value)
            .finish();
    }
}

impl RLPEncode for Node {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        match self {
            Node::Branch(n) => n.encode(buf),
            Node::Extension(n) => n.encode(buf),
            Node::Leaf(n) => n.encode(buf),
        }
    }
}
