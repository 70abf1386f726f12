//! Upload signing abstraction
//!
//! This module defines the `UploadSigner` trait that every signing backend implements.

use crate::SignerBackend;
use async_trait::async_trait;
use thiserror::Error;
use vidshelf_core::models::{SignedUpload, UploadIntent};
use vidshelf_core::AppError;

/// Signing operation errors
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Invalid upload credential: {0}")]
    InvalidCredential(String),

    #[error("Upload credential expired")]
    Expired,

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for signing operations
pub type SignerResult<T> = Result<T, SignerError>;

impl From<SignerError> for AppError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::InvalidCredential(_) | SignerError::Expired => {
                AppError::Unauthorized(err.to_string())
            }
            SignerError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Signing(other.to_string()),
        }
    }
}

/// Signs one pending direct upload.
///
/// Implementations only shape credential material for the intent they are given;
/// authentication and expiry policy belong to the caller.
#[async_trait]
pub trait UploadSigner: Send + Sync {
    /// Produce the credential a client presents to object storage for this upload
    async fn sign(&self, intent: &UploadIntent) -> SignerResult<SignedUpload>;

    /// Get the signing backend type
    fn backend_type(&self) -> SignerBackend;
}
