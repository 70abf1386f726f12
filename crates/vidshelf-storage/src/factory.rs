#[cfg(feature = "signer-s3")]
use crate::S3UploadSigner;
use crate::{HmacUploadSigner, SignerBackend, SignerError, SignerResult, UploadSigner};
use std::sync::Arc;
use vidshelf_core::Config;

/// Create an upload signer based on configuration
pub fn create_signer(config: &Config) -> SignerResult<Arc<dyn UploadSigner>> {
    let upload = &config.upload;

    match upload.signer {
        SignerBackend::Hmac => {
            let secret = upload.signing_secret.as_deref().ok_or_else(|| {
                SignerError::ConfigError("UPLOAD_SIGNING_SECRET not configured".to_string())
            })?;
            let signer = HmacUploadSigner::new(secret, upload.endpoint.clone())?;
            Ok(Arc::new(signer))
        }

        #[cfg(feature = "signer-s3")]
        SignerBackend::S3 => {
            let bucket = upload
                .s3_bucket
                .clone()
                .ok_or_else(|| SignerError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = upload
                .s3_region
                .clone()
                .ok_or_else(|| SignerError::ConfigError("S3_REGION not configured".to_string()))?;

            let signer = S3UploadSigner::new(bucket, region, upload.s3_endpoint.clone())?;
            Ok(Arc::new(signer))
        }

        #[cfg(not(feature = "signer-s3"))]
        SignerBackend::S3 => Err(SignerError::ConfigError(
            "S3 signer not available (signer-s3 feature not enabled)".to_string(),
        )),
    }
}
