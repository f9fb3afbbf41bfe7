//! Hardware integration test suite.
//!
//! These tests require actual serial hardware. They are compiled only with
//! the `hardware-tests` feature and are ignored by default.
//! Run with: cargo test --features hardware-tests -- --ignored

#![cfg(feature = "hardware-tests")]

#[path = "common/mod.rs"]
mod common;

#[path = "hardware/mod.rs"]
mod hardware;

// Re-export test modules to make them discoverable
pub use hardware::*;
