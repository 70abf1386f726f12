//! Registration input checks

use crate::constants::MIN_SECRET_LENGTH;
use crate::AppError;

/// Canonical form of an email address: trimmed and lower-cased.
///
/// Rejects values that cannot be an address at all; deliverability is not checked.
pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(AppError::Validation {
            fields: vec!["email".to_string()],
        });
    }
    Ok(email)
}

pub fn validate_secret(secret: &str) -> Result<(), AppError> {
    if secret.chars().count() < MIN_SECRET_LENGTH {
        return Err(AppError::Validation {
            fields: vec!["secret".to_string()],
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.com ").unwrap(), "a@x.com");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@x.com").is_err());
        assert!(normalize_email("a@").is_err());
        assert!(normalize_email("a@b@c").is_err());
    }

    #[test]
    fn test_validate_secret() {
        assert!(validate_secret("s3cret1").is_ok());
        let err = validate_secret("short").unwrap_err();
        assert_eq!(err.invalid_fields(), ["secret"]);
    }
}
