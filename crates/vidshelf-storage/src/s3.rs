use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use std::time::Duration;
use vidshelf_core::models::{SignedUpload, UploadIntent};

use crate::keys::validate_key;
use crate::{SignerBackend, SignerError, SignerResult, UploadSigner};

const SIGNATURE_PARAM: &str = "X-Amz-Signature";
const DATE_PARAM: &str = "X-Amz-Date";
const EXPIRES_PARAM: &str = "X-Amz-Expires";
const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Issues S3 presigned PUT URLs
#[derive(Clone)]
pub struct S3UploadSigner {
    store: AmazonS3,
    bucket: String,
}

impl S3UploadSigner {
    /// Credentials are read from the standard AWS environment variables.
    /// `endpoint` targets S3-compatible providers (MinIO, DigitalOcean Spaces, etc.).
    pub fn new(bucket: String, region: String, endpoint: Option<String>) -> SignerResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());
        if let Some(endpoint) = endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        let store = builder
            .build()
            .map_err(|e| SignerError::ConfigError(format!("Failed to build S3 signer: {}", e)))?;

        Ok(Self { store, bucket })
    }
}

#[async_trait]
impl UploadSigner for S3UploadSigner {
    #[tracing::instrument(skip(self, intent), fields(
        aws.service.name = "s3",
        aws.s3.bucket = %self.bucket,
        aws.s3.key = %intent.object_key,
        aws.s3.operation = "PresignPutObject"
    ))]
    async fn sign(&self, intent: &UploadIntent) -> SignerResult<SignedUpload> {
        validate_key(&intent.object_key)?;

        // X-Amz-Date is truncated to the second, so keep one second of slack to
        // stay inside the intent's window.
        let seconds = (intent.expires_at - Utc::now()).num_seconds() - 1;
        if seconds < 1 {
            return Err(SignerError::SigningFailed(
                "Upload intent expires too soon to presign".to_string(),
            ));
        }
        let expires_in = Duration::from_secs(seconds as u64);

        let location = Path::from(intent.object_key.clone());
        let url = self
            .store
            .signed_url(Method::PUT, &location, expires_in)
            .await
            .map_err(|e| SignerError::SigningFailed(format!("Failed to presign URL: {}", e)))?;

        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .ok_or_else(|| {
                    SignerError::SigningFailed(format!("Presigned URL carries no {}", name))
                })
        };
        let signature = param(SIGNATURE_PARAM)?;
        let expires_at = presigned_expiry(&param(DATE_PARAM)?, &param(EXPIRES_PARAM)?)?;

        tracing::info!(
            expires_in_seconds = expires_in.as_secs(),
            expires_at = %expires_at,
            "Generated presigned PUT URL"
        );

        Ok(SignedUpload {
            upload_url: url.to_string(),
            token: intent.object_key.clone(),
            signature,
            expires_at,
            fields: Some(serde_json::json!({
                "key": intent.object_key,
                "Content-Type": intent.content_type,
            })),
        })
    }

    fn backend_type(&self) -> SignerBackend {
        SignerBackend::S3
    }
}

/// When a presigned URL stops working: its signing time plus its lifetime
fn presigned_expiry(signed_at: &str, expires_in: &str) -> SignerResult<DateTime<Utc>> {
    let signed_at = NaiveDateTime::parse_from_str(signed_at, AMZ_DATE_FORMAT)
        .map_err(|e| SignerError::SigningFailed(format!("Bad {} '{}': {}", DATE_PARAM, signed_at, e)))?
        .and_utc();
    let seconds: i64 = expires_in.parse().map_err(|e| {
        SignerError::SigningFailed(format!("Bad {} '{}': {}", EXPIRES_PARAM, expires_in, e))
    })?;
    Ok(signed_at + ChronoDuration::seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn signer() -> S3UploadSigner {
        let store = AmazonS3Builder::new()
            .with_region("us-east-1")
            .with_bucket_name("videos")
            .with_access_key_id("AKIDEXAMPLE")
            .with_secret_access_key("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
            .build()
            .unwrap();
        S3UploadSigner {
            store,
            bucket: "videos".to_string(),
        }
    }

    fn intent(ttl: chrono::Duration) -> UploadIntent {
        let now = Utc::now();
        UploadIntent {
            upload_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            object_key: "uploads/owner/clip.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    #[tokio::test]
    async fn test_presigned_put_url() {
        let intent = intent(chrono::Duration::minutes(15));
        let signed = signer().sign(&intent).await.unwrap();
        assert!(signed.upload_url.contains("uploads/owner/clip.mp4"));
        assert!(signed.upload_url.contains(SIGNATURE_PARAM));
        assert!(!signed.signature.is_empty());
        assert_eq!(signed.token, intent.object_key);
    }

    #[tokio::test]
    async fn test_reported_expiry_matches_url_lifetime() {
        let intent = intent(chrono::Duration::seconds(90) + chrono::Duration::milliseconds(700));
        let signed = signer().sign(&intent).await.unwrap();

        let (_, query_string) = signed.upload_url.split_once('?').unwrap();
        let query = |name: &str| {
            query_string
                .split('&')
                .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
                .unwrap()
                .to_string()
        };
        assert_eq!(
            signed.expires_at,
            presigned_expiry(&query(DATE_PARAM), &query(EXPIRES_PARAM)).unwrap()
        );
        assert!(signed.expires_at <= intent.expires_at);
        assert!(intent.expires_at - signed.expires_at < chrono::Duration::seconds(3));
        assert!(signed.expires_at > Utc::now());
    }

    #[test]
    fn test_presigned_expiry() {
        let expiry = presigned_expiry("20250101T120000Z", "900").unwrap();
        assert_eq!(expiry.to_rfc3339(), "2025-01-01T12:15:00+00:00");
        assert!(presigned_expiry("2025-01-01", "900").is_err());
        assert!(presigned_expiry("20250101T120000Z", "soon").is_err());
    }

    #[tokio::test]
    async fn test_nearly_expired_intent_refused() {
        let intent = intent(chrono::Duration::milliseconds(1500));
        assert!(matches!(
            signer().sign(&intent).await,
            Err(SignerError::SigningFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_intent_refused() {
        let intent = intent(chrono::Duration::seconds(-5));
        assert!(matches!(
            signer().sign(&intent).await,
            Err(SignerError::SigningFailed(_))
        ));
    }
}
