//! Test helpers for service tests
//!
//! In-memory connectors, stores and signers plus fixtures, so services can be
//! exercised without a database or object storage. Available to other crates
//! through the `test-helpers` feature.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
