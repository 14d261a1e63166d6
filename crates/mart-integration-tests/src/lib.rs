//! Integration test crate for stablemart components.
//!
//! This crate exists solely to run integration tests that span the token,
//! persistence and marketplace crates. It has no public API - all
//! functionality is in the test modules.

#![forbid(unsafe_code)]
