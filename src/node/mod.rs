//! Node records persisted by the tree.
//!
//! A leaf record holds one `(key, accumulation)` pair; a branch record holds
//! an ordered list of [`Child`] summaries. Records are length-delimited
//! binary with big-endian integer fields, so encoding is deterministic and
//! identical values always produce identical bytes.

mod branch;
mod leaf;

use bytes::{Buf, BufMut};

pub use branch::{Branch, Child};
pub use leaf::Leaf;

use crate::error::DecodeError;

/// Accumulated weight carried by a leaf, or by a branch over its subtree.
pub type Accumulation = ethnum::U256;

/// Width of an encoded accumulation.
pub(crate) const ACCUMULATION_BYTES: usize = 32;

pub(crate) fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.put_u32(bytes.len() as u32);
    buf.put_slice(bytes);
}

pub(crate) fn get_bytes(buf: &mut &[u8], context: &'static str) -> Result<Vec<u8>, DecodeError> {
    if buf.remaining() < 4 {
        return Err(DecodeError::Truncated {
            context,
            needed: 4 - buf.remaining(),
        });
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(DecodeError::Truncated {
            context,
            needed: len - buf.remaining(),
        });
    }
    let mut out = vec![0u8; len];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

pub(crate) fn put_accumulation(buf: &mut Vec<u8>, accumulation: Accumulation) {
    buf.put_slice(&accumulation.to_be_bytes());
}

pub(crate) fn get_accumulation(
    buf: &mut &[u8],
    context: &'static str,
) -> Result<Accumulation, DecodeError> {
    if buf.remaining() < ACCUMULATION_BYTES {
        return Err(DecodeError::Truncated {
            context,
            needed: ACCUMULATION_BYTES - buf.remaining(),
        });
    }
    let mut be = [0u8; ACCUMULATION_BYTES];
    buf.copy_to_slice(&mut be);
    Ok(Accumulation::from_be_bytes(be))
}

pub(crate) fn ensure_consumed(buf: &[u8]) -> Result<(), DecodeError> {
    if buf.is_empty() {
        Ok(())
    } else {
        Err(DecodeError::TrailingBytes(buf.len()))
    }
}
