//! Core identifier types for Basalt.
//!
//! These types provide type-safe wrappers around the identifiers the
//! storage layer passes around, preventing accidental misuse of one kind
//! of number where another is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Block identifier - names one fixed-size block of a database file.
///
/// A block is addressed by the name of the file that holds it and its
/// zero-based index within that file. Two `BlockId`s are equal when both
/// parts are equal. The file name is reference-counted so that cloning a
/// `BlockId` (which the buffer pool does on every mapping update) does not
/// allocate.
///
/// # Example
///
/// ```rust
/// use basalt_common::types::BlockId;
///
/// let block = BlockId::new("students.tbl", 3);
/// assert_eq!(block.file_name(), "students.tbl");
/// assert_eq!(block.number(), 3);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId {
    file_name: Arc<str>,
    number: u64,
}

impl BlockId {
    /// Creates a new `BlockId` for block `number` of `file_name`.
    #[inline]
    #[must_use]
    pub fn new(file_name: impl Into<Arc<str>>, number: u64) -> Self {
        Self {
            file_name: file_name.into(),
            number,
        }
    }

    /// Returns the name of the file holding this block.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the block index within its file.
    #[inline]
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// Returns the block that follows this one in the same file.
    #[inline]
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            file_name: Arc::clone(&self.file_name),
            number: self.number.saturating_add(1),
        }
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({}, {})", self.file_name, self.number)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.file_name, self.number)
    }
}

/// Transaction identifier - uniquely identifies a transaction.
///
/// The buffer pool only records which transaction last modified a frame,
/// so that the frame can be forced to disk when that transaction commits
/// or rolls back.
///
/// # Example
///
/// ```rust
/// use basalt_common::types::TxnId;
///
/// let txn = TxnId::new(1);
/// assert!(txn.is_valid());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TxnId(u64);

impl TxnId {
    /// Invalid transaction ID, used as a sentinel value.
    pub const INVALID: Self = Self(0);

    /// Minimum valid transaction ID.
    pub const MIN: Self = Self(1);

    /// Creates a new `TxnId` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next transaction ID.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Checks if this is a valid transaction ID.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Debug for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "TxnId(INVALID)")
        } else {
            write!(f, "TxnId({})", self.0)
        }
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TxnId {
    #[inline]
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<TxnId> for u64 {
    #[inline]
    fn from(id: TxnId) -> Self {
        id.0
    }
}

/// Log Sequence Number - identifies a record in the write-ahead log.
///
/// LSNs are handed out by the log manager in increasing order. The buffer
/// pool never interprets them; it only stores the LSN that protects a
/// frame's latest modification and compares LSNs when choosing a victim.
/// `INVALID` (zero) means "no log record" and orders below every real LSN.
/// Logs must hand out LSNs starting at [`Lsn::FIRST`]; 0 is never a real
/// record.
///
/// # Example
///
/// ```rust
/// use basalt_common::types::Lsn;
///
/// let lsn = Lsn::new(1000);
/// assert!(lsn > Lsn::INVALID);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Lsn(u64);

impl Lsn {
    /// Invalid LSN, used as a sentinel value.
    pub const INVALID: Self = Self(0);

    /// First valid LSN.
    pub const FIRST: Self = Self(1);

    /// Creates a new `Lsn` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(lsn: u64) -> Self {
        Self(lsn)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Checks if this is a valid LSN.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Debug for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Lsn(INVALID)")
        } else {
            write!(f, "Lsn({})", self.0)
        }
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "-")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u64> for Lsn {
    #[inline]
    fn from(lsn: u64) -> Self {
        Self::new(lsn)
    }
}

impl From<Lsn> for u64 {
    #[inline]
    fn from(lsn: Lsn) -> Self {
        lsn.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_block_id() {
        let block = BlockId::new("data.tbl", 7);
        assert_eq!(block.file_name(), "data.tbl");
        assert_eq!(block.number(), 7);
        assert_eq!(block.next(), BlockId::new("data.tbl", 8));
        assert_eq!(block.to_string(), "[file data.tbl, block 7]");
    }

    #[test]
    fn test_block_id_equality_uses_both_fields() {
        let a = BlockId::new("a.tbl", 1);
        assert_eq!(a, BlockId::new(String::from("a.tbl"), 1));
        assert_ne!(a, BlockId::new("a.tbl", 2));
        assert_ne!(a, BlockId::new("b.tbl", 1));

        let mut map = HashMap::new();
        map.insert(a.clone(), 10);
        assert_eq!(map.get(&BlockId::new("a.tbl", 1)), Some(&10));
        assert_eq!(map.get(&BlockId::new("b.tbl", 1)), None);
    }

    #[test]
    fn test_txn_id() {
        let txn = TxnId::new(100);
        assert_eq!(txn.as_u64(), 100);
        assert!(txn.is_valid());
        assert!(!TxnId::INVALID.is_valid());
        assert_eq!(txn.next().as_u64(), 101);
    }

    #[test]
    fn test_lsn_ordering() {
        let lsn = Lsn::new(1000);
        assert!(lsn.is_valid());
        assert!(!Lsn::INVALID.is_valid());
        assert!(Lsn::INVALID < Lsn::FIRST);
        assert!(Lsn::new(5) < Lsn::new(12));
        assert_eq!(format!("{:?}", Lsn::INVALID), "Lsn(INVALID)");
        assert_eq!(Lsn::INVALID.to_string(), "-");
    }

    #[test]
    fn test_block_id_serde() {
        let block = BlockId::new("idx.dat", 3);
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, r#"{"file_name":"idx.dat","number":3}"#);
    }
}
