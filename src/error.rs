//! Errors surfaced while decoding stored records.

use thiserror::Error;

/// Failure to decode a persisted node record or node key.
///
/// The codec returns these as values so store tooling and tests can inspect
/// them; the tree itself treats every one of them as store corruption and
/// aborts the operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The record ended before a field could be read in full.
    #[error("truncated record: {context} needs {needed} more bytes")]
    Truncated {
        /// Field being read when the record ran out.
        context: &'static str,
        /// Bytes missing.
        needed: usize,
    },

    /// The record decoded cleanly but left bytes behind.
    #[error("malformed record: {0} trailing bytes")]
    TrailingBytes(usize),

    /// A branch record with no children. Emptied branches are deleted, never
    /// persisted, so this cannot appear in a healthy store.
    #[error("malformed record: branch with zero children")]
    EmptyBranch,

    /// A store key that does not parse as prefix ++ level ++ key.
    #[error("malformed node key of {0} bytes")]
    BadNodeKey(usize),
}
