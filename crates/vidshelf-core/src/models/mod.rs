//! Data models for the application
//!
//! Each sub-module represents a specific feature area: registered videos,
//! direct-upload authorizations and user credentials.

mod upload;
mod user;
mod video;

// Re-export all models for convenient imports
pub use upload::*;
pub use user::*;
pub use video::*;
