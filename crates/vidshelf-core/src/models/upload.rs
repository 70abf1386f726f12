use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;
use validator::Validate;

/// Request for a direct-to-object-storage upload authorization
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UploadRequest {
    /// Original filename, used only for its extension
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub filename: String,
    /// Content type (MIME type) the client will send
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// Expected size in bytes, if the client knows it; at most `MAX_UPLOAD_BYTES`
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// What the signing collaborator is asked to sign for one upload attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadIntent {
    pub upload_id: Uuid,
    pub owner_id: Uuid,
    pub object_key: String,
    pub content_type: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Credential material returned by a signing collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct SignedUpload {
    pub upload_url: String,
    pub token: String,
    pub signature: String,
    pub expires_at: DateTime<Utc>,
    /// Extra form fields for POST-style uploads
    pub fields: Option<serde_json::Value>,
}

/// Short-lived, single-use authorization handed to a client for one direct upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadAuthorization {
    pub upload_id: Uuid,
    pub object_key: String,
    pub upload_url: String,
    pub token: String,
    pub signature: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Value>,
}

impl UploadAuthorization {
    pub fn from_signed(intent: &UploadIntent, signed: SignedUpload) -> Self {
        UploadAuthorization {
            upload_id: intent.upload_id,
            object_key: intent.object_key.clone(),
            upload_url: signed.upload_url,
            token: signed.token,
            signature: signed.signature,
            expires_at: signed.expires_at,
            fields: signed.fields,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Lifecycle of a direct upload as seen by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum UploadStatus {
    Issued {
        expires_at: DateTime<Utc>,
    },
    Uploading {
        bytes_sent: u64,
        total_bytes: Option<u64>,
    },
    Registered {
        asset_id: Uuid,
    },
    Failed {
        reason: String,
    },
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadStatus::Registered { .. } | UploadStatus::Failed { .. }
        )
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Issued { .. } => write!(f, "issued"),
            UploadStatus::Uploading { .. } => write!(f, "uploading"),
            UploadStatus::Registered { .. } => write!(f, "registered"),
            UploadStatus::Failed { .. } => write!(f, "failed"),
        }
    }
}

/// A status change published to upload subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadEvent {
    pub upload_id: Uuid,
    pub status: UploadStatus,
    pub at: DateTime<Utc>,
}
