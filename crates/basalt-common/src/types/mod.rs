//! Type definitions for Basalt.
//!
//! This module contains the identifier types shared by the storage layer
//! and the components built on top of it.

mod ids;

pub use ids::{BlockId, Lsn, TxnId};
