//! Direct uploads: authorization minting and progress tracking

pub mod issuer;
pub mod progress;

pub use issuer::UploadIssuer;
pub use progress::UploadProgress;
