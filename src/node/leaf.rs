use std::fmt::Display;

use super::{get_accumulation, get_bytes, put_accumulation, put_bytes, Accumulation, Child};
use crate::error::DecodeError;

/// A leaf holds the accumulation recorded for one key. Leaves are the last
/// row of the tree and the only records callers write data into; every
/// branch above them is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    key: Vec<u8>,
    accumulation: Accumulation,
}

impl Leaf {
    pub fn new(key: Vec<u8>, accumulation: Accumulation) -> Self {
        Self { key, accumulation }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn accumulation(&self) -> Accumulation {
        self.accumulation
    }

    pub fn into_parts(self) -> (Vec<u8>, Accumulation) {
        (self.key, self.accumulation)
    }

    /// The summary this leaf contributes to its parent branch.
    pub fn to_child(&self) -> Child {
        Child::new(self.key.clone(), self.accumulation)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + self.key.len() + super::ACCUMULATION_BYTES);
        put_bytes(&mut buf, &self.key);
        put_accumulation(&mut buf, self.accumulation);
        buf
    }

    pub fn decode(mut bytes: &[u8]) -> Result<Self, DecodeError> {
        let key = get_bytes(&mut bytes, "leaf key")?;
        let accumulation = get_accumulation(&mut bytes, "leaf accumulation")?;
        super::ensure_consumed(bytes)?;
        Ok(Self { key, accumulation })
    }
}

impl Display for Leaf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Leaf {{ key: {}, accumulation: {} }}",
            hex::encode(&self.key),
            self.accumulation
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_leaf_round_trip() {
        let leaf = Leaf::new(b"weight/a".to_vec(), Accumulation::new(10));
        let decoded = Leaf::decode(&leaf.encode()).unwrap();
        assert_eq!(decoded, leaf);
        assert_eq!(decoded.key(), b"weight/a");
        assert_eq!(decoded.accumulation(), Accumulation::new(10));
    }

    #[test]
    fn test_leaf_empty_key_round_trip() {
        let leaf = Leaf::new(Vec::new(), Accumulation::ZERO);
        assert_eq!(Leaf::decode(&leaf.encode()).unwrap(), leaf);
    }

    #[test]
    fn test_leaf_decode_truncated() {
        let encoded = Leaf::new(b"a".to_vec(), Accumulation::new(1)).encode();
        assert_eq!(
            Leaf::decode(&encoded[..encoded.len() - 1]),
            Err(DecodeError::Truncated {
                context: "leaf accumulation",
                needed: 1
            })
        );
    }

    #[test]
    fn test_leaf_decode_trailing() {
        let mut encoded = Leaf::new(b"a".to_vec(), Accumulation::new(1)).encode();
        encoded.push(0);
        assert_eq!(Leaf::decode(&encoded), Err(DecodeError::TrailingBytes(1)));
    }

    #[test]
    fn test_leaf_to_child() {
        let leaf = Leaf::new(b"a".to_vec(), Accumulation::new(7));
        let child = leaf.to_child();
        assert_eq!(child.index(), b"a");
        assert_eq!(child.accumulation(), Accumulation::new(7));
    }

    #[test]
    fn test_leaf_display() {
        let leaf = Leaf::new(vec![1, 2, 3], Accumulation::new(5));
        assert_eq!(
            format!("{leaf}"),
            "Leaf { key: 010203, accumulation: 5 }"
        );
    }
}
