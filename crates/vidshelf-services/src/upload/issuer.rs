use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use vidshelf_core::constants::MAX_UPLOAD_BYTES;
use vidshelf_core::models::{Identity, UploadAuthorization, UploadIntent, UploadRequest};
use vidshelf_core::AppError;
use vidshelf_storage::{upload_object_key, UploadSigner};

use super::UploadProgress;

/// Top-level media types a client may upload directly
const ACCEPTED_MEDIA_TYPES: &[&str] = &["video", "image"];

/// Mints short-lived authorizations for direct-to-object-storage uploads.
///
/// Nothing is persisted; the signed credential is the only record of an upload
/// until its metadata is registered.
#[derive(Clone)]
pub struct UploadIssuer {
    signer: Arc<dyn UploadSigner>,
    ttl: Duration,
    progress: UploadProgress,
}

impl UploadIssuer {
    pub fn new(
        signer: Arc<dyn UploadSigner>,
        ttl: std::time::Duration,
        progress: UploadProgress,
    ) -> Result<Self, AppError> {
        let ttl = Duration::from_std(ttl)
            .map_err(|e| AppError::Internal(format!("Upload URL TTL out of range: {}", e)))?;
        if ttl <= Duration::zero() {
            return Err(AppError::Internal(
                "Upload URL TTL must be positive".to_string(),
            ));
        }
        Ok(Self {
            signer,
            ttl,
            progress,
        })
    }

    /// Authorize `identity` to upload one object.
    ///
    /// Without an identity this fails with `Unauthenticated` and the signer is
    /// never consulted.
    #[tracing::instrument(skip(self, identity, request), fields(
        signer = %self.signer.backend_type(),
        upload_id = tracing::field::Empty
    ))]
    pub async fn issue(
        &self,
        identity: Option<&Identity>,
        request: UploadRequest,
    ) -> Result<UploadAuthorization, AppError> {
        let identity = identity.ok_or_else(|| {
            AppError::Unauthenticated("Uploading requires an authenticated identity".to_string())
        })?;

        request.validate()?;
        let content_type = request.content_type.trim().to_ascii_lowercase();
        if !is_accepted_content_type(&content_type) {
            return Err(AppError::InvalidInput(format!(
                "Content type '{}' is not allowed; expected video/* or image/*",
                request.content_type
            )));
        }
        check_file_size(request.file_size)?;

        let upload_id = Uuid::new_v4();
        tracing::Span::current().record("upload_id", tracing::field::display(upload_id));

        let issued_at = Utc::now();
        let intent = UploadIntent {
            upload_id,
            owner_id: identity.user_id,
            object_key: upload_object_key(identity.user_id, upload_id, &request.filename),
            content_type,
            issued_at,
            expires_at: issued_at + self.ttl,
        };

        let signed = self.signer.sign(&intent).await?;

        let now = Utc::now();
        if signed.expires_at <= now || signed.expires_at > intent.expires_at {
            tracing::error!(
                expires_at = %signed.expires_at,
                limit = %intent.expires_at,
                "Signer returned an expiry outside the authorization window"
            );
            return Err(AppError::Signing(format!(
                "Signed expiry {} is outside ({}, {}]",
                signed.expires_at, now, intent.expires_at
            )));
        }

        self.progress.issued(upload_id, signed.expires_at).await;

        tracing::info!(
            owner_id = %identity.user_id,
            key = %intent.object_key,
            expires_at = %signed.expires_at,
            "Issued upload authorization"
        );

        Ok(UploadAuthorization::from_signed(&intent, signed))
    }
}

/// An unknown size is allowed; a declared one must be non-empty and within the cap
fn check_file_size(file_size: Option<u64>) -> Result<(), AppError> {
    match file_size {
        Some(0) => Err(AppError::InvalidInput(
            "File size must be greater than zero".to_string(),
        )),
        Some(size) if size > MAX_UPLOAD_BYTES => Err(AppError::InvalidInput(format!(
            "File size exceeds maximum allowed size of {} MB",
            MAX_UPLOAD_BYTES / 1024 / 1024
        ))),
        _ => Ok(()),
    }
}

fn is_accepted_content_type(content_type: &str) -> bool {
    match content_type.split_once('/') {
        Some((kind, subtype)) => {
            ACCEPTED_MEDIA_TYPES.contains(&kind)
                && !subtype.is_empty()
                && !subtype.contains(char::is_whitespace)
        }
        None => false,
    }
}
