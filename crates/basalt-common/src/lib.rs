//! # basalt-common
//!
//! Common types and constants for Basalt.
//!
//! This crate provides the foundational identifiers used across all Basalt
//! components:
//!
//! - **Types**: `BlockId` (file name + block number), `TxnId`, `Lsn`
//! - **Constants**: block size and buffer pool defaults
//!
//! ## Example
//!
//! ```rust
//! use basalt_common::types::{BlockId, Lsn, TxnId};
//!
//! let block = BlockId::new("accounts.tbl", 0);
//! let txn = TxnId::new(1);
//! let lsn = Lsn::new(42);
//! assert!(txn.is_valid() && lsn.is_valid());
//! assert_eq!(block.number(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::{BlockId, Lsn, TxnId};
