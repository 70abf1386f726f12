use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use vidshelf_core::models::UserCredential;
use vidshelf_core::AppError;

/// Credential persistence over a connection of type `Conn`
#[async_trait]
pub trait UserStore<Conn: Send + Sync>: Send + Sync {
    /// Look up a credential by its normalized email
    async fn find_by_email(
        &self,
        conn: &Conn,
        email: &str,
    ) -> Result<Option<UserCredential>, AppError>;

    /// Insert a new credential; an existing email is a `Conflict`
    async fn insert(
        &self,
        conn: &Conn,
        email: &str,
        secret_hash: &str,
    ) -> Result<UserCredential, AppError>;
}

/// Postgres-backed user repository
#[derive(Clone, Default)]
pub struct PgUserRepository;

impl PgUserRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UserStore<PgPool> for PgUserRepository {
    #[tracing::instrument(skip(self, pool, email), fields(db.table = "users", db.operation = "select"))]
    async fn find_by_email(
        &self,
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<UserCredential>, AppError> {
        let user = sqlx::query_as::<_, UserCredential>(
            r#"
            SELECT id, email, secret_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, pool, email, secret_hash), fields(db.table = "users", db.operation = "insert"))]
    async fn insert(
        &self,
        pool: &PgPool,
        email: &str,
        secret_hash: &str,
    ) -> Result<UserCredential, AppError> {
        let result = sqlx::query_as::<_, UserCredential>(
            r#"
            INSERT INTO users (id, email, secret_hash, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, email, secret_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(secret_hash)
        .fetch_one(pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::Conflict(format!("Email already registered: {}", email)),
            ),
            Err(e) => Err(e.into()),
        }
    }
}
