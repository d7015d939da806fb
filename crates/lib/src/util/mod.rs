//! Shared utilities.
//!
//! Test fixtures used across the crate's test suites.

#[cfg(test)]
pub mod testutil;
