//! Configuration module
//!
//! Process configuration for the backend core: database pool, upload signing and
//! logging settings, read from the environment.

use std::env;
use std::fmt;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const UPLOAD_URL_TTL_SECS: u64 = 15 * 60;
const MAX_UPLOAD_URL_TTL_SECS: u64 = 60 * 60;
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Which collaborator signs upload authorizations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerBackend {
    /// HMAC-signed tokens checked by an upload gateway
    Hmac,
    /// S3 presigned PUT URLs
    S3,
}

impl SignerBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "hmac" => Some(SignerBackend::Hmac),
            "s3" => Some(SignerBackend::S3),
            _ => None,
        }
    }
}

impl fmt::Display for SignerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerBackend::Hmac => write!(f, "hmac"),
            SignerBackend::S3 => write!(f, "s3"),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Database pool settings
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_seconds: u64,
    pub run_migrations: bool,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

/// Upload authorization settings
#[derive(Clone)]
pub struct UploadConfig {
    pub signer: SignerBackend,
    pub url_ttl_secs: u64,
    pub signing_secret: Option<String>,
    pub endpoint: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("signer", &self.signer)
            .field("url_ttl_secs", &self.url_ttl_secs)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "[REDACTED]"))
            .field("endpoint", &self.endpoint)
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_region", &self.s3_region)
            .field("s3_endpoint", &self.s3_endpoint)
            .finish()
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub log_format: LogFormat,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Load configuration from the process environment (and `.env` when present)
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let _ = dotenvy::dotenv();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let log_format = match env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            run_migrations: env::var("DB_RUN_MIGRATIONS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
        };

        let signer_name = env::var("UPLOAD_SIGNER").unwrap_or_else(|_| "hmac".to_string());
        let signer = SignerBackend::parse(&signer_name).ok_or_else(|| {
            anyhow::anyhow!(
                "UPLOAD_SIGNER must be 'hmac' or 's3', got '{}'",
                signer_name
            )
        })?;

        let upload = UploadConfig {
            signer,
            url_ttl_secs: env::var("UPLOAD_URL_TTL_SECS")
                .unwrap_or_else(|_| UPLOAD_URL_TTL_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("UPLOAD_URL_TTL_SECS must be a valid number"))?,
            signing_secret: env::var("UPLOAD_SIGNING_SECRET").ok(),
            endpoint: env::var("UPLOAD_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000/uploads".to_string()),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
        };

        let config = Config {
            environment,
            log_format,
            database,
            upload,
        };
        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks that a plain parse cannot express
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database.url.trim().is_empty() {
            return Err(anyhow::anyhow!("DATABASE_URL cannot be empty"));
        }

        if self.upload.url_ttl_secs == 0 || self.upload.url_ttl_secs > MAX_UPLOAD_URL_TTL_SECS {
            return Err(anyhow::anyhow!(
                "UPLOAD_URL_TTL_SECS must be between 1 and {}",
                MAX_UPLOAD_URL_TTL_SECS
            ));
        }

        match self.upload.signer {
            SignerBackend::Hmac => {
                let secret = self.upload.signing_secret.as_deref().unwrap_or("");
                if secret.is_empty() {
                    return Err(anyhow::anyhow!(
                        "UPLOAD_SIGNING_SECRET must be set when UPLOAD_SIGNER=hmac"
                    ));
                }
                if self.is_production() && secret.len() < MIN_PRODUCTION_SECRET_LEN {
                    return Err(anyhow::anyhow!(
                        "UPLOAD_SIGNING_SECRET must be at least {} bytes in production",
                        MIN_PRODUCTION_SECRET_LEN
                    ));
                }
            }
            SignerBackend::S3 => {
                if self.upload.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when UPLOAD_SIGNER=s3"
                    ));
                }
                if self.upload.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION must be set when UPLOAD_SIGNER=s3"
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.database.max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.database.timeout_seconds
    }

    pub fn upload_url_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.upload.url_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
            database: DatabaseConfig {
                url: "postgres://localhost/vidshelf".to_string(),
                max_connections: MAX_CONNECTIONS,
                timeout_seconds: CONNECTION_TIMEOUT_SECS,
                run_migrations: true,
            },
            upload: UploadConfig {
                signer: SignerBackend::Hmac,
                url_ttl_secs: UPLOAD_URL_TTL_SECS,
                signing_secret: Some("dev-secret".to_string()),
                endpoint: "http://localhost:9000/uploads".to_string(),
                s3_bucket: None,
                s3_region: None,
                s3_endpoint: None,
            },
        }
    }

    #[test]
    fn test_valid_development_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected_in_production() {
        let mut config = test_config();
        config.environment = "production".to_string();
        assert!(config.is_production());
        assert!(config.validate().is_err());

        config.upload.signing_secret = Some("x".repeat(MIN_PRODUCTION_SECRET_LEN));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ttl_bounds() {
        let mut config = test_config();
        config.upload.url_ttl_secs = 0;
        assert!(config.validate().is_err());
        config.upload.url_ttl_secs = MAX_UPLOAD_URL_TTL_SECS + 1;
        assert!(config.validate().is_err());
        config.upload.url_ttl_secs = 60;
        assert_eq!(config.upload_url_ttl(), std::time::Duration::from_secs(60));
    }

    #[test]
    fn test_s3_signer_requires_bucket_and_region() {
        let mut config = test_config();
        config.upload.signer = SignerBackend::S3;
        assert!(config.validate().is_err());
        config.upload.s3_bucket = Some("videos".to_string());
        assert!(config.validate().is_err());
        config.upload.s3_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_signer_backend_parse() {
        assert_eq!(SignerBackend::parse("HMAC"), Some(SignerBackend::Hmac));
        assert_eq!(SignerBackend::parse(" s3 "), Some(SignerBackend::S3));
        assert_eq!(SignerBackend::parse("gcs"), None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", test_config());
        assert!(!rendered.contains("dev-secret"));
        assert!(!rendered.contains("postgres://"));
    }
}
