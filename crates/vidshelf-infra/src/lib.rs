//! Vidshelf Infrastructure Library
//!
//! Shared process setup for Vidshelf binaries: tracing initialization and shutdown.

pub mod telemetry;

pub use telemetry::{init_telemetry, shutdown_telemetry};
