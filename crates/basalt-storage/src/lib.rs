//! # basalt-storage
//!
//! Block storage and buffer management for Basalt.
//!
//! This crate provides:
//! - Block-granular file access behind the [`file::BlockStore`] trait
//! - A bounded buffer pool that caches blocks in memory frames, tracks
//!   which transaction dirtied them, and evicts the most recently
//!   modified frame when it needs room

#![warn(missing_docs)]
#![warn(clippy::all)]

/// File management and I/O
pub mod file;

/// Buffer pool management
pub mod buffer;
