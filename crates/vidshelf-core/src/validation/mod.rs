//! Validation modules

pub mod credentials;
pub mod video;

pub use credentials::{normalize_email, validate_secret};
pub use video::{clamp_quality, missing_required_fields, normalize_candidate};
