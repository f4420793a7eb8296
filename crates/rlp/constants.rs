/// Prefix of the RLP encoding of an empty string (also used to encode zero-valued integers).
pub const RLP_NULL: u8 = 0x80;
/// Prefix of the RLP encoding of an empty list.
pub const RLP_EMPTY_LIST: u8 = 0xc0;
