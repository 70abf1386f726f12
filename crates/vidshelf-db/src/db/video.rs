use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use vidshelf_core::models::{NewVideoAsset, VideoAsset};
use vidshelf_core::AppError;

/// Persistence for registered videos over a connection of type `Conn`
#[async_trait]
pub trait VideoAssetStore<Conn: Send + Sync>: Send + Sync {
    /// Write one record, returning it with its generated id and timestamps
    async fn insert(&self, conn: &Conn, asset: NewVideoAsset) -> Result<VideoAsset, AppError>;

    /// Most recent first; an empty store yields an empty vec
    async fn list_recent(
        &self,
        conn: &Conn,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VideoAsset>, AppError>;

    /// Most recent first, strictly older than the `(created_at, id)` cursor when one
    /// is given. Rows inserted after the cursor was taken never shift later pages.
    async fn list_before(
        &self,
        conn: &Conn,
        before: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<VideoAsset>, AppError>;
}

/// Postgres-backed video repository
#[derive(Clone, Default)]
pub struct PgVideoAssetRepository;

impl PgVideoAssetRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VideoAssetStore<PgPool> for PgVideoAssetRepository {
    #[tracing::instrument(skip(self, pool, asset), fields(db.table = "videos", db.operation = "insert"))]
    async fn insert(&self, pool: &PgPool, asset: NewVideoAsset) -> Result<VideoAsset, AppError> {
        let id = Uuid::new_v4();

        let video = sqlx::query_as::<_, VideoAsset>(
            r#"
            INSERT INTO videos (
                id, owner_id, title, description, video_location, thumbnail_location,
                show_controls, display_height, display_width, quality, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            RETURNING id, owner_id, title, description, video_location, thumbnail_location,
                      show_controls, display_height, display_width, quality, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(asset.owner_id)
        .bind(asset.title)
        .bind(asset.description)
        .bind(asset.video_location)
        .bind(asset.thumbnail_location)
        .bind(asset.show_controls)
        .bind(asset.display_height)
        .bind(asset.display_width)
        .bind(asset.quality)
        .fetch_one(pool)
        .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self, pool), fields(db.table = "videos", db.operation = "select"))]
    async fn list_recent(
        &self,
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VideoAsset>, AppError> {
        let videos = sqlx::query_as::<_, VideoAsset>(
            r#"
            SELECT id, owner_id, title, description, video_location, thumbnail_location,
                   show_controls, display_height, display_width, quality, created_at, updated_at
            FROM videos
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(videos)
    }

    #[tracing::instrument(skip(self, pool), fields(db.table = "videos", db.operation = "select"))]
    async fn list_before(
        &self,
        pool: &PgPool,
        before: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<VideoAsset>, AppError> {
        let (created_at, id) = before.unzip();

        let videos = sqlx::query_as::<_, VideoAsset>(
            r#"
            SELECT id, owner_id, title, description, video_location, thumbnail_location,
                   show_controls, display_height, display_width, quality, created_at, updated_at
            FROM videos
            WHERE $1::timestamptz IS NULL OR (created_at, id) < ($1::timestamptz, $2::uuid)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(created_at)
        .bind(id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(videos)
    }
}
