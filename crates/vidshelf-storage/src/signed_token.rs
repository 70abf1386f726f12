//! HMAC-signed upload credentials for an upload gateway in front of object storage.
//!
//! Token = base64url(JSON claims). Signature = hex(HMAC-SHA256(secret, token)).
//! The gateway calls [`HmacUploadSigner::verify`] with the same secret before
//! accepting the bytes.

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;
use vidshelf_core::models::{SignedUpload, UploadIntent};

use crate::keys::validate_key;
use crate::{SignerBackend, SignerError, SignerResult, UploadSigner};

/// Claims carried inside an upload token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadClaims {
    pub upload_id: Uuid,
    pub owner_id: Uuid,
    pub key: String,
    pub content_type: String,
    /// Expiry as a unix timestamp (seconds)
    pub exp: i64,
}

/// Signs upload intents with a shared HMAC secret
#[derive(Clone)]
pub struct HmacUploadSigner {
    secret: Vec<u8>,
    endpoint: String,
}

impl HmacUploadSigner {
    pub fn new(secret: impl AsRef<[u8]>, endpoint: impl Into<String>) -> SignerResult<Self> {
        let secret = secret.as_ref().to_vec();
        if secret.is_empty() {
            return Err(SignerError::ConfigError(
                "Upload signing secret cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            secret,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    fn mac(&self) -> SignerResult<Hmac<Sha256>> {
        Hmac::<Sha256>::new_from_slice(&self.secret)
            .map_err(|e| SignerError::ConfigError(format!("Invalid signing key: {}", e)))
    }

    fn signature_for(&self, token: &str) -> SignerResult<String> {
        let mut mac = self.mac()?;
        mac.update(token.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check a presented credential and return its claims.
    ///
    /// Fails on a signature mismatch, a malformed token, or once `now` reaches the expiry.
    pub fn verify(
        &self,
        token: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> SignerResult<UploadClaims> {
        let tag = hex::decode(signature)
            .map_err(|_| SignerError::InvalidCredential("malformed signature".to_string()))?;
        let mut mac = self.mac()?;
        mac.update(token.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| SignerError::InvalidCredential("signature mismatch".to_string()))?;

        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| SignerError::InvalidCredential("malformed token".to_string()))?;
        let claims: UploadClaims = serde_json::from_slice(&payload)
            .map_err(|_| SignerError::InvalidCredential("malformed token claims".to_string()))?;

        if now.timestamp() >= claims.exp {
            return Err(SignerError::Expired);
        }
        Ok(claims)
    }
}

#[async_trait]
impl UploadSigner for HmacUploadSigner {
    #[tracing::instrument(skip(self, intent), fields(upload_id = %intent.upload_id, key = %intent.object_key))]
    async fn sign(&self, intent: &UploadIntent) -> SignerResult<SignedUpload> {
        validate_key(&intent.object_key)?;

        let claims = UploadClaims {
            upload_id: intent.upload_id,
            owner_id: intent.owner_id,
            key: intent.object_key.clone(),
            content_type: intent.content_type.clone(),
            exp: intent.expires_at.timestamp(),
        };
        let payload = serde_json::to_vec(&claims)
            .map_err(|e| SignerError::SigningFailed(format!("Failed to encode claims: {}", e)))?;
        let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(payload);
        let signature = self.signature_for(&token)?;

        // Report the expiry the token actually enforces (whole seconds).
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or_else(|| {
            SignerError::SigningFailed(format!("Expiry out of range: {}", claims.exp))
        })?;

        let upload_url = format!(
            "{}/{}?token={}&signature={}",
            self.endpoint, intent.object_key, token, signature
        );

        tracing::debug!(expires_at = %expires_at, "Signed HMAC upload credential");

        Ok(SignedUpload {
            upload_url,
            fields: Some(serde_json::json!({
                "key": intent.object_key,
                "Content-Type": intent.content_type,
                "token": token,
                "signature": signature,
            })),
            token,
            signature,
            expires_at,
        })
    }

    fn backend_type(&self) -> SignerBackend {
        SignerBackend::Hmac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn intent(ttl: Duration) -> UploadIntent {
        let now = Utc::now();
        let owner_id = Uuid::new_v4();
        let upload_id = Uuid::new_v4();
        UploadIntent {
            upload_id,
            owner_id,
            object_key: format!("uploads/{}/{}.mp4", owner_id, upload_id),
            content_type: "video/mp4".to_string(),
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    fn signer() -> HmacUploadSigner {
        HmacUploadSigner::new("test-secret", "https://uploads.example.com/").unwrap()
    }

    #[tokio::test]
    async fn test_sign_and_verify() {
        let signer = signer();
        let intent = intent(Duration::minutes(15));
        let signed = signer.sign(&intent).await.unwrap();

        assert!(signed
            .upload_url
            .starts_with(&format!("https://uploads.example.com/{}?", intent.object_key)));
        assert!(signed.expires_at <= intent.expires_at);
        assert!(signed.expires_at > intent.issued_at);

        let claims = signer
            .verify(&signed.token, &signed.signature, Utc::now())
            .unwrap();
        assert_eq!(claims.upload_id, intent.upload_id);
        assert_eq!(claims.key, intent.object_key);
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let signer = signer();
        let signed = signer.sign(&intent(Duration::minutes(15))).await.unwrap();

        let other = HmacUploadSigner::new("other-secret", "https://x").unwrap();
        assert!(matches!(
            other.verify(&signed.token, &signed.signature, Utc::now()),
            Err(SignerError::InvalidCredential(_))
        ));

        let mut forged = signed.token.clone();
        forged.push('A');
        assert!(signer
            .verify(&forged, &signed.signature, Utc::now())
            .is_err());
        assert!(signer.verify(&signed.token, "zz", Utc::now()).is_err());
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let signer = signer();
        let signed = signer.sign(&intent(Duration::minutes(1))).await.unwrap();
        let later = Utc::now() + Duration::minutes(2);
        assert!(matches!(
            signer.verify(&signed.token, &signed.signature, later),
            Err(SignerError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_traversal_key_refused() {
        let mut bad = intent(Duration::minutes(1));
        bad.object_key = "uploads/../etc/passwd".to_string();
        assert!(matches!(
            signer().sign(&bad).await,
            Err(SignerError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(HmacUploadSigner::new("", "https://x").is_err());
    }
}
