//! Shared key generation for signing backends.
//!
//! Key format: `uploads/{owner_id}/{upload_id}.{ext}`.

use uuid::Uuid;
use vidshelf_core::constants::UPLOAD_KEY_PREFIX;

use crate::{SignerError, SignerResult};

const MAX_EXTENSION_LEN: usize = 10;
const FALLBACK_EXTENSION: &str = "bin";

/// Generate the object key for one direct upload.
///
/// Only the extension of the client's filename survives, lower-cased and restricted to
/// ASCII alphanumerics; anything else falls back to `bin`.
pub fn upload_object_key(owner_id: Uuid, upload_id: Uuid, filename: &str) -> String {
    format!(
        "{}/{}/{}.{}",
        UPLOAD_KEY_PREFIX,
        owner_id,
        upload_id,
        file_extension(filename)
    )
}

/// Reject keys that could escape the upload prefix.
pub fn validate_key(key: &str) -> SignerResult<()> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
        return Err(SignerError::InvalidKey(format!(
            "Storage key '{}' is not allowed",
            key
        )));
    }
    Ok(())
}

fn file_extension(filename: &str) -> String {
    let Some((stem, ext)) = filename.rsplit_once('.') else {
        return FALLBACK_EXTENSION.to_string();
    };
    let ext = ext.to_lowercase();
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return FALLBACK_EXTENSION.to_string();
    }
    ext
}
