//! Vidshelf Core Library
//!
//! This crate provides the domain models, error types, configuration and candidate
//! validation shared by every Vidshelf component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, DatabaseConfig, LogFormat, SignerBackend, UploadConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
