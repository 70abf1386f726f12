use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored login credential. `secret_hash` is an argon2 PHC string.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserCredential {
    pub id: Uuid,
    pub email: String,
    pub secret_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The authenticated principal attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

impl From<&UserCredential> for Identity {
    fn from(credential: &UserCredential) -> Self {
        Identity {
            user_id: credential.id,
            email: credential.email.clone(),
        }
    }
}
