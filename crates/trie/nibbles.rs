/// Path of a node in the trie, stored as a sequence of half-bytes.
/// Paths derived from full keys carry a terminator nibble (16) at the end,
/// marking the path as belonging to a leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nibbles {
    data: Vec<u8>,
}

impl Nibbles {
    /// Creates a path from already-expanded nibbles.
    pub const fn from_hex(hex: Vec<u8>) -> Self {
        Self { data: hex }
    }

    /// Splits the given bytes into nibbles and appends the leaf terminator.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_raw(bytes, true)
    }

    /// Splits the given bytes into nibbles, appending the leaf terminator
    /// only if `is_leaf` is set.
    pub fn from_raw(bytes: &[u8], is_leaf: bool) -> Self {
        let mut data: Vec<u8> = bytes
            .iter()
            .flat_map(|byte| [byte >> 4, byte & 0x0f])
            .collect();
        if is_leaf {
            data.push(16);
        }
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the nibble at the given offset. Panics if out of range.
    pub fn at(&self, i: usize) -> usize {
        self.data[i] as usize
    }

    /// Removes and returns the first nibble.
    pub fn next(&mut self) -> Option<u8> {
        if self.data.is_empty() {
            None
        } else {
            Some(self.data.remove(0))
        }
    }

    /// Removes and returns the first nibble if it is a valid choice
    /// for a branch (aka not a terminator).
    pub fn next_choice(&mut self) -> Option<usize> {
        self.next().filter(|choice| *choice < 16).map(usize::from)
    }

    /// If `prefix` is a prefix of self, removes it and returns true.
    /// Otherwise leaves self untouched and returns false.
    pub fn skip_prefix(&mut self, prefix: &Nibbles) -> bool {
        if self.len() >= prefix.len() && self.data[..prefix.len()] == prefix.data {
            self.data = self.data[prefix.len()..].to_vec();
            true
        } else {
            false
        }
    }

    /// Number of leading nibbles shared with `other`.
    pub fn count_prefix(&self, other: &Nibbles) -> usize {
        self.data
            .iter()
            .zip(other.data.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Returns the nibbles after the given offset.
    pub fn offset(&self, offset: usize) -> Nibbles {
        self.slice(offset, self.len())
    }

    /// Returns the nibbles between the given offsets.
    pub fn slice(&self, start: usize, end: usize) -> Nibbles {
        Nibbles::from_hex(self.data[start..end].to_vec())
    }

    pub fn extend(&mut self, other: &Nibbles) {
        self.data.extend_from_slice(&other.data);
    }

    /// Inserts a nibble at the start.
    pub fn prepend(&mut self, nibble: u8) {
        self.data.insert(0, nibble);
    }

    /// Inserts a nibble at the end.
    pub fn append(&mut self, nibble: u8) {
        self.data.push(nibble);
    }

    /// Returns the concatenation of self and other.
    pub fn concat(&self, other: &Nibbles) -> Nibbles {
        Nibbles {
            data: [self.data.as_slice(), other.data.as_slice()].concat(),
        }
    }

    /// Returns a copy of self with the nibble appended.
    pub fn append_new(&self, nibble: u8) -> Nibbles {
        Nibbles {
            data: [self.data.as_slice(), &[nibble]].concat(),
        }
    }

    /// Whether the path carries the leaf terminator.
    pub fn is_leaf(&self) -> bool {
        if self.is_empty() {
            false
        } else {
            self.data[self.data.len() - 1] == 16
        }
    }

    /// Packs the nibbles back into bytes, dropping the terminator.
    /// Odd-length paths lose their last nibble.
    pub fn to_bytes(&self) -> Vec<u8> {
        let data = if self.is_leaf() {
            &self.data[..self.data.len() - 1]
        } else {
            &self.data[..]
        };
        data.chunks_exact(2)
            .map(|chunk| (chunk[0] << 4) | chunk[1])
            .collect()
    }

    /// Encodes the path with the compact hex-prefix encoding:
    /// the first nibble encodes the leaf flag and the parity of the path.
    pub fn encode_compact(&self) -> Vec<u8> {
        let mut hex = self.data.clone();
        let is_leaf = self.is_leaf();
        if is_leaf {
            hex.pop();
        }
        // first nibble: 0b10 if leaf, plus the first path nibble if odd
        let mut first = (is_leaf as u8) << 5;
        if hex.len() % 2 == 1 {
            first |= 0x10 | hex[0];
            hex.remove(0);
        }
        let mut compact = Vec::with_capacity(hex.len() / 2 + 1);
        compact.push(first);
        compact.extend(hex.chunks_exact(2).map(|chunk| (chunk[0] << 4) | chunk[1]));
        compact
    }

    /// Decodes a compact hex-prefix encoded path (inverse of [`encode_compact`]).
    ///
    /// [`encode_compact`]: Self::encode_compact
    pub fn decode_compact(compact: &[u8]) -> Self {
        let Some(first) = compact.first() else {
            return Self::default();
        };
        let is_leaf = first & 0x20 != 0;
        let odd = first & 0x10 != 0;
        let mut data = Vec::with_capacity(compact.len() * 2);
        if odd {
            data.push(first & 0x0f);
        }
        for byte in &compact[1..] {
            data.push(byte >> 4);
            data.push(byte & 0x0f);
        }
        if is_leaf {
            data.push(16);
        }
        Self { data }
    }
}

impl AsRef<[u8]> for Nibbles {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
