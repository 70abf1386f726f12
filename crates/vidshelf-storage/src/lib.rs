//! Vidshelf Storage Library
//!
//! Signing collaborators that authorize a client to upload straight to object
//! storage, so video bytes never pass through the backend.
//!
//! # Object key format
//!
//! Direct uploads land at `uploads/{owner_id}/{upload_id}.{ext}`. Keys never contain
//! `..` or a leading `/`. Key generation is centralized in the `keys` module so every
//! signer agrees on the layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "signer-s3")]
pub mod s3;
pub mod signed_token;
pub mod traits;

// Re-export commonly used types
pub use factory::create_signer;
pub use keys::upload_object_key;
#[cfg(feature = "signer-s3")]
pub use s3::S3UploadSigner;
pub use signed_token::{HmacUploadSigner, UploadClaims};
pub use traits::{SignerError, SignerResult, UploadSigner};
pub use vidshelf_core::SignerBackend;
