//! # basalt-test
//!
//! Integration tests for Basalt.
//!
//! This crate contains:
//! - Shared fixtures for buffer pool tests
//! - Concurrent pin/unpin workloads
//! - End-to-end buffer pool scenarios (under `tests/`)

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test utilities and helpers
pub mod utils;

/// Workload generators
pub mod workload;
