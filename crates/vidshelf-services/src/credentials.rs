//! Credential collaborator: registers users and verifies their secrets.
//!
//! Secrets are stored as argon2 PHC strings. Lookups go through the shared
//! backend connection.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use std::sync::Arc;
use vidshelf_core::models::Identity;
use vidshelf_core::validation::{normalize_email, validate_secret};
use vidshelf_core::AppError;
use vidshelf_db::{ConnectionCache, Connector, UserStore};

const INVALID_CREDENTIALS: &str = "Invalid email or secret";

/// Hash a secret for storage
pub fn hash_secret(secret: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash secret: {}", e)))
}

/// Verify a secret against a stored hash.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Registers and verifies user credentials over the shared backend connection
pub struct CredentialService<C: Connector, U> {
    connections: Arc<ConnectionCache<C>>,
    users: U,
}

impl<C, U> CredentialService<C, U>
where
    C: Connector,
    U: UserStore<C::Connection>,
{
    pub fn new(connections: Arc<ConnectionCache<C>>, users: U) -> Self {
        Self { connections, users }
    }

    /// Create a credential for a new email address.
    ///
    /// The email is trimmed and lower-cased before storage; an address that is
    /// already registered is a `Conflict`.
    #[tracing::instrument(skip(self, email, secret))]
    pub async fn register(&self, email: &str, secret: &str) -> Result<Identity, AppError> {
        let email = normalize_email(email)?;
        validate_secret(secret)?;

        let conn = self.connections.acquire().await?;
        if self.users.find_by_email(&conn, &email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Email already registered: {}",
                email
            )));
        }

        let secret_hash = hash_secret(secret)?;
        let user = self.users.insert(&conn, &email, &secret_hash).await?;

        tracing::info!(user_id = %user.id, "Registered user");
        Ok(Identity::from(&user))
    }

    /// Resolve an email/secret pair to the identity it belongs to.
    ///
    /// Unknown emails and wrong secrets fail identically with `AuthFailure`.
    #[tracing::instrument(skip(self, email, secret))]
    pub async fn verify(&self, email: &str, secret: &str) -> Result<Identity, AppError> {
        let Ok(email) = normalize_email(email) else {
            return Err(AppError::AuthFailure(INVALID_CREDENTIALS.to_string()));
        };

        let conn = self.connections.acquire().await?;
        let Some(user) = self.users.find_by_email(&conn, &email).await? else {
            tracing::debug!("Credential check for unknown email");
            return Err(AppError::AuthFailure(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_secret(secret, &user.secret_hash)? {
            tracing::debug!(user_id = %user.id, "Credential check with wrong secret");
            return Err(AppError::AuthFailure(INVALID_CREDENTIALS.to_string()));
        }

        Ok(Identity::from(&user))
    }
}
