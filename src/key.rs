//! Store-key scheme for persisted nodes.
//!
//! Every record lives at `n/` ++ big-endian level ++ key. Encoding the level
//! big-endian right after the prefix makes each level one contiguous stretch
//! of the keyspace, ordered leaves first, so fixed-level scans follow key
//! order and a single reverse scan over the prefix yields the highest-level
//! node (the root) first.

use crate::error::DecodeError;

/// Keyspace prefix of every persisted node record.
pub(crate) const NODE_PREFIX: &[u8] = b"n/";

/// Width of the big-endian level field in a node key.
pub(crate) const LEVEL_BYTES: usize = 2;

/// Store key of the node at `(level, key)`.
pub(crate) fn node_key(level: u16, key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(NODE_PREFIX.len() + LEVEL_BYTES + key.len());
    out.extend_from_slice(NODE_PREFIX);
    out.extend_from_slice(&level.to_be_bytes());
    out.extend_from_slice(key);
    out
}

/// Store key of the leaf record for `key`.
pub(crate) fn leaf_key(key: &[u8]) -> Vec<u8> {
    node_key(0, key)
}

/// Smallest possible key of `level`; the lower bound of a level-wide scan.
pub(crate) fn level_prefix(level: u16) -> Vec<u8> {
    node_key(level, &[])
}

/// Splits a store key back into `(level, key)`.
pub(crate) fn parse_node_key(raw: &[u8]) -> Result<(u16, &[u8]), DecodeError> {
    let header = NODE_PREFIX.len() + LEVEL_BYTES;
    if raw.len() < header || !raw.starts_with(NODE_PREFIX) {
        return Err(DecodeError::BadNodeKey(raw.len()));
    }
    let level = u16::from_be_bytes([raw[NODE_PREFIX.len()], raw[NODE_PREFIX.len() + 1]]);
    Ok((level, &raw[header..]))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_node_key_round_trip() {
        let raw = node_key(3, b"abc");
        assert_eq!(parse_node_key(&raw).unwrap(), (3, b"abc".as_slice()));
    }

    #[test]
    fn test_leaf_key_is_level_zero() {
        assert_eq!(leaf_key(b"k"), node_key(0, b"k"));
        assert_eq!(parse_node_key(&leaf_key(b"k")).unwrap(), (0, b"k".as_slice()));
    }

    #[test]
    fn test_levels_are_contiguous_and_ordered() {
        // every level-0 key sorts before every level-1 key
        assert!(node_key(0, &[0xff; 8]) < node_key(1, &[]));
        assert!(node_key(1, &[0xff; 8]) < node_key(2, &[]));
        // within a level, node keys follow raw key order
        assert!(node_key(1, b"a") < node_key(1, b"b"));
        assert!(node_key(1, b"a") < node_key(1, b"aa"));
    }

    #[test]
    fn test_level_prefix_is_smallest_of_level() {
        assert_eq!(level_prefix(2), node_key(2, &[]));
        assert!(level_prefix(2) <= node_key(2, b"\x00"));
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        assert_eq!(parse_node_key(b"n/"), Err(DecodeError::BadNodeKey(2)));
        assert_eq!(parse_node_key(b"x/\x00\x00k"), Err(DecodeError::BadNodeKey(5)));
        assert_eq!(parse_node_key(b""), Err(DecodeError::BadNodeKey(0)));
    }
}
